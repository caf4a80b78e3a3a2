//! Entity stores of one renderer
//!
//! [`Scene`] owns one [`Store`] per entity kind plus the sun and the active
//! camera. Cross-kind invalidation lives here: derived state that depends on
//! another kind is cleared by a broadcast over the dependent store instead
//! of per-entity dependency tracking.

use crate::render::pipeline::stats::EntityCounts;
use crate::render::primitives::{
    Camera, ConeLight, FlatMesh, Mesh, Object, PointLight, Sun, Text, Texture, UiElement,
};
use crate::render::registry::{Entity, Handle, Store};
use crate::render::RenderResult;

/// Entity stores
#[derive(Debug)]
pub struct Scene {
    pub(crate) meshes: Store<Mesh>,
    pub(crate) textures: Store<Texture>,
    pub(crate) objects: Store<Object>,
    pub(crate) cameras: Store<Camera>,
    pub(crate) cone_lights: Store<ConeLight>,
    pub(crate) point_lights: Store<PointLight>,
    pub(crate) texts: Store<Text>,
    pub(crate) flat_meshes: Store<FlatMesh>,
    pub(crate) ui_elements: Store<UiElement>,
    pub(crate) sun: Sun,
    pub(crate) active_camera: Handle<Camera>,
}

impl Scene {
    /// Handle of the camera every scene starts with
    pub const STARTING_CAMERA: Handle<Camera> = Handle::from_id(0);

    pub(crate) fn new() -> Self {
        let mut cameras = Store::new();
        let starting = cameras.add(Camera::default());
        debug_assert_eq!(starting, Self::STARTING_CAMERA);

        Self {
            meshes: Store::new(),
            textures: Store::new(),
            objects: Store::new(),
            cameras,
            cone_lights: Store::new(),
            point_lights: Store::new(),
            texts: Store::new(),
            flat_meshes: Store::new(),
            ui_elements: Store::new(),
            sun: Sun::default(),
            active_camera: starting,
        }
    }

    /// Store of one entity kind
    pub fn store<T: Stored>(&self) -> &Store<T> {
        T::store(self)
    }

    pub(crate) fn store_mut<T: Stored>(&mut self) -> &mut Store<T> {
        T::store_mut(self)
    }

    /// The sun
    pub const fn sun(&self) -> &Sun {
        &self.sun
    }

    /// Handle of the camera frames are rendered from
    pub const fn active_camera(&self) -> Handle<Camera> {
        self.active_camera
    }

    /// The camera frames are rendered from
    pub fn camera(&self) -> RenderResult<&Camera> {
        self.cameras.get(self.active_camera)
    }

    /// The active camera's view changed: every normal matrix and the sun's
    /// shadow box are stale
    pub(crate) fn invalidate_view_dependents(&mut self) {
        for object in self.objects.records_mut() {
            object.invalidate_inverse_model_view();
        }
        self.sun.matrix_valid = false;
    }

    /// Projection inputs changed for every camera
    pub(crate) fn invalidate_cameras(&mut self) {
        for camera in self.cameras.records_mut() {
            camera.matrix_valid = false;
        }
        self.invalidate_view_dependents();
    }

    /// The window size changed
    pub(crate) fn invalidate_window_dependents(&mut self) {
        self.invalidate_cameras();
        for element in self.ui_elements.records_mut() {
            element.matrix_valid = false;
        }
        for text in self.texts.records_mut() {
            text.layout_valid = false;
        }
    }

    /// Live entity counts; the rendered counts are left at zero
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            meshes: self.meshes.len(),
            textures: self.textures.len(),
            objects: self.objects.len(),
            cameras: self.cameras.len(),
            cone_lights: self.cone_lights.len(),
            point_lights: self.point_lights.len(),
            texts: self.texts.len(),
            flat_meshes: self.flat_meshes.len(),
            ui_elements: self.ui_elements.len(),
            ..EntityCounts::default()
        }
    }
}

/// Entity kinds that have a store in [`Scene`]
pub trait Stored: Entity + Sized {
    /// The kind's store
    fn store(scene: &Scene) -> &Store<Self>;

    /// The kind's store, mutably
    fn store_mut(scene: &mut Scene) -> &mut Store<Self>;
}

macro_rules! stored {
    ($($kind:ty => $field:ident),* $(,)?) => {
        $(
            impl Stored for $kind {
                fn store(scene: &Scene) -> &Store<Self> {
                    &scene.$field
                }

                fn store_mut(scene: &mut Scene) -> &mut Store<Self> {
                    &mut scene.$field
                }
            }
        )*
    };
}

stored!(
    Mesh => meshes,
    Texture => textures,
    Object => objects,
    Camera => cameras,
    ConeLight => cone_lights,
    PointLight => point_lights,
    Text => texts,
    FlatMesh => flat_meshes,
    UiElement => ui_elements,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_camera_exists() {
        let scene = Scene::new();
        assert!(scene.cameras.is_valid(Scene::STARTING_CAMERA));
        assert_eq!(scene.active_camera(), Scene::STARTING_CAMERA);
        assert_eq!(scene.counts().cameras, 1);
    }

    #[test]
    fn test_view_broadcast_reaches_every_object() {
        let mut scene = Scene::new();
        let mesh = scene.meshes.add(Mesh::cube());
        for _ in 0..3 {
            let mut object = Object::new(mesh, None);
            object.inverse_model_view_valid = true;
            object.matrix_valid = true;
            scene.objects.add(object);
        }
        scene.sun.matrix_valid = true;

        scene.invalidate_view_dependents();
        assert!(scene.objects.iter().all(|(_, o)| !o.inverse_model_view_valid() && o.matrix_valid()));
        assert!(!scene.sun.matrix_valid());
    }

    #[test]
    fn test_generic_store_access() {
        let mut scene = Scene::new();
        let handle = scene.store_mut::<Mesh>().add(Mesh::cube());
        assert!(scene.store::<Mesh>().is_valid(handle));
        assert_eq!(scene.store::<Mesh>().len(), 1);
    }
}
