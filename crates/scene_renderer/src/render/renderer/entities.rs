//! Entity add/delete and setters
//!
//! Every setter validates its input, writes the raw field and clears the
//! flags of whatever was derived from it. Nothing is recomputed here; the
//! next frame's update phase does that.

use std::f32::consts::PI;

use crate::assets::ImageData;
use crate::foundation::math::{Vec2, Vec3};
use crate::render::api::GraphicsDevice;
use crate::render::pipeline::{MAX_CONE_LIGHTS, MAX_POINT_LIGHTS};
use crate::render::primitives::{
    Camera, ConeLight, FlatMesh, FlatVertex, Mesh, Object, PointLight, Text, Texture, UiElement, Vertex,
};
use crate::render::registry::{Entity, Handle};
use crate::render::resources::gpu;
use crate::render::scene::{Scene, Stored};
use crate::render::systems::text::FontDesc;
use crate::render::systems::ui::Position;
use crate::render::{RenderError, RenderResult};

use super::{require, Renderer};

fn finite3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn color4(color: [f32; 4]) -> RenderResult<[f32; 4]> {
    require(color.iter().all(|c| c.is_finite()), || format!("colour {color:?} is not finite"))?;
    Ok(color)
}

fn check_fov(fov: f32) -> RenderResult<()> {
    require(fov > 0.0 && fov < PI, || format!("field of view {fov} must lie in (0, pi)"))
}

fn check_location(what: &str, v: &Vec3) -> RenderResult<()> {
    require(finite3(v), || format!("{what} {v:?} is not finite"))
}

fn check_camera_angles(yaw: f32, pitch: f32) -> RenderResult<()> {
    require(yaw.is_finite() && pitch.is_finite(), || format!("angles ({yaw}, {pitch}) are not finite"))
}

fn check_camera_distance(distance: f32) -> RenderResult<()> {
    require(distance.is_finite() && distance >= 0.0, || {
        format!("camera distance {distance} must be finite and not negative")
    })
}

fn check_light_color(color: &Vec3, brightness: f32) -> RenderResult<()> {
    require(finite3(color) && brightness.is_finite(), || "light colour is not finite".to_string())
}

fn check_radius(radius: f32) -> RenderResult<()> {
    require(radius.is_finite() && radius > 0.0, || format!("radius {radius} must be positive"))
}

fn check_direction(direction: &Vec3) -> RenderResult<()> {
    require(finite3(direction) && direction.norm() > 0.0, || {
        format!("direction {direction:?} must be finite and non-zero")
    })
}

fn check_font(font: &FontDesc) -> RenderResult<()> {
    require(font.pixel_size.is_finite() && font.pixel_size > 0.0, || {
        format!("font size {} must be positive", font.pixel_size)
    })
}

fn check_camera(camera: &Camera) -> RenderResult<()> {
    check_location("focal point", &camera.focal_point)?;
    check_camera_angles(camera.yaw, camera.pitch)?;
    check_camera_distance(camera.distance)?;
    check_fov(camera.fov)
}

fn check_point_light(light: &PointLight) -> RenderResult<()> {
    check_location("location", &light.location)?;
    check_light_color(&light.color, light.brightness)?;
    check_radius(light.radius)
}

fn check_cone_light(light: &ConeLight) -> RenderResult<()> {
    check_location("location", &light.location)?;
    check_direction(&light.direction)?;
    check_light_color(&light.color, light.brightness)?;
    check_fov(light.fov)
}

fn check_text(text: &Text) -> RenderResult<()> {
    check_font(&text.font)?;
    color4(text.color).map(drop)
}

impl<D: GraphicsDevice> Renderer<D> {
    fn entity_mut<T: Stored>(&mut self, handle: Handle<T>) -> RenderResult<&mut T> {
        self.scene.store_mut::<T>().get_mut(handle)
    }

    fn check<T: Stored>(&self, handle: Handle<T>) -> RenderResult<()> {
        self.scene.store::<T>().resolve(handle).map(|_| ())
    }

    fn check_texture(&self, texture: Option<Handle<Texture>>) -> RenderResult<()> {
        texture.map_or(Ok(()), |t| self.check(t))
    }

    // Meshes

    /// Register a mesh; normals are derived on the next update
    pub fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        self.scene.meshes.add(mesh)
    }

    /// Replace a mesh's geometry
    pub fn update_mesh(&mut self, handle: Handle<Mesh>, vertices: Vec<Vertex>, indices: Vec<u32>) -> RenderResult<()> {
        self.entity_mut(handle)?.set_geometry(vertices, indices)
    }

    /// Delete a mesh and its device buffers
    ///
    /// Objects still pointing at it are skipped when drawing.
    pub fn delete_mesh(&mut self, handle: Handle<Mesh>) -> RenderResult<()> {
        let mesh = self.scene.meshes.remove(handle)?;
        gpu::release_mesh(&mut self.device, &mesh);
        Ok(())
    }

    /// Let garbage collection delete the mesh once no object uses it
    pub fn set_mesh_collectable(&mut self, handle: Handle<Mesh>, collectable: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.collectable = collectable;
        Ok(())
    }

    // Textures

    /// Register RGBA8 texture data
    pub fn add_texture(&mut self, texture: Texture) -> Handle<Texture> {
        self.scene.textures.add(texture)
    }

    /// Register a decoded image as a texture
    pub fn add_texture_from_image(&mut self, image: ImageData) -> RenderResult<Handle<Texture>> {
        Ok(self.add_texture(Texture::from_image(image)?))
    }

    /// Replace a texture's pixels
    pub fn update_texture(&mut self, handle: Handle<Texture>, width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<()> {
        self.entity_mut(handle)?.set_pixels(width, height, pixels)
    }

    /// Delete a texture and its device copy
    pub fn delete_texture(&mut self, handle: Handle<Texture>) -> RenderResult<()> {
        let texture = self.scene.textures.remove(handle)?;
        gpu::release_texture(&mut self.device, &texture);
        Ok(())
    }

    /// Let garbage collection delete the texture once nothing uses it
    pub fn set_texture_collectable(&mut self, handle: Handle<Texture>, collectable: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.collectable = collectable;
        Ok(())
    }

    // Objects

    /// Place a mesh in the scene
    pub fn add_object(&mut self, object: Object) -> RenderResult<Handle<Object>> {
        self.check(object.mesh)?;
        self.check_texture(object.texture)?;
        Ok(self.scene.objects.add(object))
    }

    /// Remove an object; its mesh and texture stay registered
    pub fn delete_object(&mut self, handle: Handle<Object>) -> RenderResult<()> {
        self.scene.objects.remove(handle).map(drop)
    }

    /// World position
    pub fn set_object_location(&mut self, handle: Handle<Object>, location: Vec3) -> RenderResult<()> {
        check_location("location", &location)?;
        let object = self.entity_mut(handle)?;
        object.location = location;
        object.invalidate_matrices();
        Ok(())
    }

    /// Euler angles in radians, applied X then Y then Z
    pub fn set_object_rotation(&mut self, handle: Handle<Object>, rotation: Vec3) -> RenderResult<()> {
        require(finite3(&rotation), || format!("rotation {rotation:?} is not finite"))?;
        let object = self.entity_mut(handle)?;
        object.rotation = rotation;
        object.invalidate_matrices();
        Ok(())
    }

    /// Per-axis scale; zero would make the normal matrix singular
    pub fn set_object_scale(&mut self, handle: Handle<Object>, scale: Vec3) -> RenderResult<()> {
        require(finite3(&scale) && scale.iter().all(|&c| c != 0.0), || {
            format!("scale {scale:?} must be finite and non-zero")
        })?;
        let object = self.entity_mut(handle)?;
        object.scale = scale;
        object.invalidate_matrices();
        Ok(())
    }

    /// Show or hide an object
    pub fn set_object_visible(&mut self, handle: Handle<Object>, visible: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.visible = visible;
        Ok(())
    }

    /// Whether lights affect the object
    pub fn set_object_shaded(&mut self, handle: Handle<Object>, shaded: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.shaded = shaded;
        Ok(())
    }

    /// Swap the drawn mesh
    pub fn set_object_mesh(&mut self, handle: Handle<Object>, mesh: Handle<Mesh>) -> RenderResult<()> {
        self.check(mesh)?;
        self.entity_mut(handle)?.mesh = mesh;
        Ok(())
    }

    /// Swap the texture; `None` draws with plain white
    pub fn set_object_texture(&mut self, handle: Handle<Object>, texture: Option<Handle<Texture>>) -> RenderResult<()> {
        self.check_texture(texture)?;
        self.entity_mut(handle)?.texture = texture;
        Ok(())
    }

    // Cameras

    /// Add an inactive camera
    pub fn add_camera(&mut self, camera: Camera) -> RenderResult<Handle<Camera>> {
        check_camera(&camera)?;
        Ok(self.scene.cameras.add(camera))
    }

    /// Delete a camera; the starting camera takes over if it was active
    pub fn delete_camera(&mut self, handle: Handle<Camera>) -> RenderResult<()> {
        if handle == Scene::STARTING_CAMERA {
            return Err(RenderError::StartingCamera);
        }
        self.scene.cameras.remove(handle)?;
        if self.scene.active_camera == handle {
            log::debug!("Active camera deleted, falling back to the starting camera");
            self.scene.active_camera = Scene::STARTING_CAMERA;
            self.scene.invalidate_view_dependents();
        }
        Ok(())
    }

    /// Render through another camera
    pub fn set_active_camera(&mut self, handle: Handle<Camera>) -> RenderResult<()> {
        self.check(handle)?;
        if self.scene.active_camera != handle {
            self.scene.active_camera = handle;
            self.scene.invalidate_view_dependents();
        }
        Ok(())
    }

    fn edit_camera(&mut self, handle: Handle<Camera>, edit: impl FnOnce(&mut Camera)) -> RenderResult<()> {
        let camera = self.entity_mut(handle)?;
        edit(camera);
        camera.matrix_valid = false;
        self.scene.invalidate_view_dependents();
        Ok(())
    }

    /// Point the camera looks at and orbits
    pub fn set_camera_focal_point(&mut self, handle: Handle<Camera>, focal_point: Vec3) -> RenderResult<()> {
        check_location("focal point", &focal_point)?;
        self.edit_camera(handle, |c| c.focal_point = focal_point)
    }

    /// Orbit angles in radians
    pub fn set_camera_rotation(&mut self, handle: Handle<Camera>, yaw: f32, pitch: f32) -> RenderResult<()> {
        check_camera_angles(yaw, pitch)?;
        self.edit_camera(handle, |c| {
            c.yaw = yaw;
            c.pitch = pitch;
        })
    }

    /// Eye distance from the focal point
    pub fn set_camera_distance(&mut self, handle: Handle<Camera>, distance: f32) -> RenderResult<()> {
        check_camera_distance(distance)?;
        self.edit_camera(handle, |c| c.distance = distance)
    }

    /// Vertical field of view in radians
    pub fn set_camera_fov(&mut self, handle: Handle<Camera>, fov: f32) -> RenderResult<()> {
        check_fov(fov)?;
        self.edit_camera(handle, |c| c.fov = fov)
    }

    // Lights

    /// Add a point light
    pub fn add_point_light(&mut self, light: PointLight) -> RenderResult<Handle<PointLight>> {
        check_point_light(&light)?;
        if self.scene.point_lights.len() >= MAX_POINT_LIGHTS {
            log::warn!("More than {MAX_POINT_LIGHTS} point lights; the extra ones are not lit");
        }
        Ok(self.scene.point_lights.add(light))
    }

    /// Remove a point light
    pub fn delete_point_light(&mut self, handle: Handle<PointLight>) -> RenderResult<()> {
        self.scene.point_lights.remove(handle).map(drop)
    }

    /// Move a point light
    pub fn set_point_light_location(&mut self, handle: Handle<PointLight>, location: Vec3) -> RenderResult<()> {
        check_location("location", &location)?;
        self.entity_mut(handle)?.location = location;
        Ok(())
    }

    /// Colour and brightness of a point light
    pub fn set_point_light_color(&mut self, handle: Handle<PointLight>, color: Vec3, brightness: f32) -> RenderResult<()> {
        check_light_color(&color, brightness)?;
        let light = self.entity_mut(handle)?;
        light.color = color;
        light.brightness = brightness;
        Ok(())
    }

    /// Falloff radius of a point light
    pub fn set_point_light_radius(&mut self, handle: Handle<PointLight>, radius: f32) -> RenderResult<()> {
        check_radius(radius)?;
        self.entity_mut(handle)?.radius = radius;
        Ok(())
    }

    /// Add a cone light
    pub fn add_cone_light(&mut self, light: ConeLight) -> RenderResult<Handle<ConeLight>> {
        check_cone_light(&light)?;
        if self.scene.cone_lights.len() >= MAX_CONE_LIGHTS {
            log::warn!("More than {MAX_CONE_LIGHTS} cone lights; the extra ones are not lit");
        }
        Ok(self.scene.cone_lights.add(light))
    }

    /// Remove a cone light
    pub fn delete_cone_light(&mut self, handle: Handle<ConeLight>) -> RenderResult<()> {
        self.scene.cone_lights.remove(handle).map(drop)
    }

    fn edit_cone_light(&mut self, handle: Handle<ConeLight>, edit: impl FnOnce(&mut ConeLight)) -> RenderResult<()> {
        let light = self.entity_mut(handle)?;
        edit(light);
        light.matrix_valid = false;
        Ok(())
    }

    /// Move a cone light
    pub fn set_cone_light_location(&mut self, handle: Handle<ConeLight>, location: Vec3) -> RenderResult<()> {
        check_location("location", &location)?;
        self.edit_cone_light(handle, |l| l.location = location)
    }

    /// Aim a cone light
    pub fn set_cone_light_direction(&mut self, handle: Handle<ConeLight>, direction: Vec3) -> RenderResult<()> {
        check_direction(&direction)?;
        self.edit_cone_light(handle, |l| l.direction = direction)
    }

    /// Colour and brightness of a cone light
    pub fn set_cone_light_color(&mut self, handle: Handle<ConeLight>, color: Vec3, brightness: f32) -> RenderResult<()> {
        check_light_color(&color, brightness)?;
        let light = self.entity_mut(handle)?;
        light.color = color;
        light.brightness = brightness;
        Ok(())
    }

    /// Opening angle of a cone light
    pub fn set_cone_light_fov(&mut self, handle: Handle<ConeLight>, fov: f32) -> RenderResult<()> {
        check_fov(fov)?;
        self.edit_cone_light(handle, |l| l.fov = fov)
    }

    /// Whether a cone light has a shadow transform
    pub fn set_cone_light_shadow(&mut self, handle: Handle<ConeLight>, shadow: bool) -> RenderResult<()> {
        self.edit_cone_light(handle, |l| l.shadow = shadow)
    }

    /// Sun position as azimuth about +Y and elevation above the horizon, radians
    pub fn set_sun_angles(&mut self, azimuth: f32, elevation: f32) -> RenderResult<()> {
        require(azimuth.is_finite() && elevation.is_finite(), || {
            format!("sun angles ({azimuth}, {elevation}) are not finite")
        })?;
        let sun = &mut self.scene.sun;
        sun.azimuth = azimuth;
        sun.elevation = elevation;
        sun.matrix_valid = false;
        Ok(())
    }

    /// Sun colour and brightness
    pub fn set_sun_color(&mut self, color: Vec3, brightness: f32) -> RenderResult<()> {
        require(finite3(&color) && brightness.is_finite(), || "sun colour is not finite".to_string())?;
        self.scene.sun.color = color;
        self.scene.sun.brightness = brightness;
        Ok(())
    }

    /// Whether the sun casts shadows
    pub fn set_sun_shadow(&mut self, shadow: bool) {
        self.scene.sun.shadow = shadow;
        self.scene.sun.matrix_valid = false;
    }

    // Texts

    /// Add a text entry
    pub fn add_text(&mut self, text: Text) -> RenderResult<Handle<Text>> {
        check_text(&text)?;
        Ok(self.scene.texts.add(text))
    }

    /// Remove a text entry and its texture
    pub fn delete_text(&mut self, handle: Handle<Text>) -> RenderResult<()> {
        let text = self.scene.texts.remove(handle)?;
        gpu::release_text(&mut self.device, &text);
        Ok(())
    }

    /// Displayed string
    pub fn set_text_string(&mut self, handle: Handle<Text>, string: impl Into<String>) -> RenderResult<()> {
        let string = string.into();
        let text = self.entity_mut(handle)?;
        if text.string != string {
            text.string = string;
            text.invalidate_texture();
        }
        Ok(())
    }

    /// Font face and size
    pub fn set_text_font(&mut self, handle: Handle<Text>, font: FontDesc) -> RenderResult<()> {
        check_font(&font)?;
        let text = self.entity_mut(handle)?;
        text.font = font;
        text.invalidate_texture();
        Ok(())
    }

    /// Text colour; applied at draw time
    pub fn set_text_color(&mut self, handle: Handle<Text>, color: [f32; 4]) -> RenderResult<()> {
        let color = color4(color)?;
        self.entity_mut(handle)?.color = color;
        Ok(())
    }

    /// Wrap width in pixels, 0 for a single line
    pub fn set_text_max_width(&mut self, handle: Handle<Text>, max_width: u32) -> RenderResult<()> {
        let text = self.entity_mut(handle)?;
        text.max_width = max_width;
        text.invalidate_texture();
        Ok(())
    }

    /// Screen position
    pub fn set_text_position(&mut self, handle: Handle<Text>, position: Position) -> RenderResult<()> {
        let text = self.entity_mut(handle)?;
        text.position = position;
        text.layout_valid = false;
        Ok(())
    }

    /// Overlay depth; lower values are drawn first
    pub fn set_text_depth(&mut self, handle: Handle<Text>, depth: i32) -> RenderResult<()> {
        self.entity_mut(handle)?.depth = depth;
        Ok(())
    }

    /// Show or hide a text entry
    pub fn set_text_visible(&mut self, handle: Handle<Text>, visible: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.visible = visible;
        Ok(())
    }

    // Flat meshes

    /// Register a 2D mesh for UI elements
    pub fn add_flat_mesh(&mut self, mesh: FlatMesh) -> Handle<FlatMesh> {
        self.scene.flat_meshes.add(mesh)
    }

    /// Replace a flat mesh's geometry
    ///
    /// Its extent feeds the anchor math of every element drawing it.
    pub fn update_flat_mesh(&mut self, handle: Handle<FlatMesh>, vertices: Vec<FlatVertex>, indices: Vec<u32>) -> RenderResult<()> {
        self.entity_mut(handle)?.set_geometry(vertices, indices)?;
        for element in self.scene.ui_elements.records_mut() {
            if element.flat_mesh == handle {
                element.matrix_valid = false;
            }
        }
        Ok(())
    }

    /// Delete a flat mesh and its device buffers
    ///
    /// Refused while any UI element still draws it.
    pub fn delete_flat_mesh(&mut self, handle: Handle<FlatMesh>) -> RenderResult<()> {
        self.check(handle)?;
        let users = self.scene.ui_elements.iter().filter(|(_, e)| e.flat_mesh == handle).count();
        if users > 0 {
            return Err(RenderError::InUse { kind: <FlatMesh as Entity>::KIND, users });
        }
        let mesh = self.scene.flat_meshes.remove(handle)?;
        gpu::release_flat_mesh(&mut self.device, &mesh);
        Ok(())
    }

    /// Let garbage collection delete the flat mesh once no element uses it
    pub fn set_flat_mesh_collectable(&mut self, handle: Handle<FlatMesh>, collectable: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.collectable = collectable;
        Ok(())
    }

    // UI elements

    /// Place a flat mesh on screen
    pub fn add_ui_element(&mut self, element: UiElement) -> RenderResult<Handle<UiElement>> {
        self.check(element.flat_mesh)?;
        self.check_texture(element.texture)?;
        color4(element.color)?;
        Ok(self.scene.ui_elements.add(element))
    }

    /// Remove a UI element
    pub fn delete_ui_element(&mut self, handle: Handle<UiElement>) -> RenderResult<()> {
        self.scene.ui_elements.remove(handle).map(drop)
    }

    fn edit_ui_element(&mut self, handle: Handle<UiElement>, edit: impl FnOnce(&mut UiElement)) -> RenderResult<()> {
        let element = self.entity_mut(handle)?;
        edit(element);
        element.matrix_valid = false;
        Ok(())
    }

    /// Screen position
    pub fn set_ui_element_position(&mut self, handle: Handle<UiElement>, position: Position) -> RenderResult<()> {
        self.edit_ui_element(handle, |e| e.position = position)
    }

    /// Per-axis scale of the flat mesh
    pub fn set_ui_element_scale(&mut self, handle: Handle<UiElement>, scale: Vec2) -> RenderResult<()> {
        require(scale.iter().all(|c| c.is_finite()), || format!("scale {scale:?} is not finite"))?;
        self.edit_ui_element(handle, |e| e.scale = scale)
    }

    /// Clockwise rotation about the top-left corner, radians
    pub fn set_ui_element_rotation(&mut self, handle: Handle<UiElement>, rotation: f32) -> RenderResult<()> {
        require(rotation.is_finite(), || format!("rotation {rotation} is not finite"))?;
        self.edit_ui_element(handle, |e| e.rotation = rotation)
    }

    /// Tint, multiplied with the texture
    pub fn set_ui_element_color(&mut self, handle: Handle<UiElement>, color: [f32; 4]) -> RenderResult<()> {
        let color = color4(color)?;
        self.entity_mut(handle)?.color = color;
        Ok(())
    }

    /// Overlay depth; lower values are drawn first
    pub fn set_ui_element_depth(&mut self, handle: Handle<UiElement>, depth: i32) -> RenderResult<()> {
        self.entity_mut(handle)?.depth = depth;
        Ok(())
    }

    /// Show or hide a UI element
    pub fn set_ui_element_visible(&mut self, handle: Handle<UiElement>, visible: bool) -> RenderResult<()> {
        self.entity_mut(handle)?.visible = visible;
        Ok(())
    }

    /// Swap the texture; `None` draws the tint only
    pub fn set_ui_element_texture(&mut self, handle: Handle<UiElement>, texture: Option<Handle<Texture>>) -> RenderResult<()> {
        self.check_texture(texture)?;
        self.entity_mut(handle)?.texture = texture;
        Ok(())
    }

    /// Swap the flat mesh
    pub fn set_ui_element_flat_mesh(&mut self, handle: Handle<UiElement>, flat_mesh: Handle<FlatMesh>) -> RenderResult<()> {
        self.check(flat_mesh)?;
        self.edit_ui_element(handle, |e| e.flat_mesh = flat_mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::render::backends::{RecordingDevice, ResourceKind};
    use crate::render::systems::text::{FontId, MonospaceRasterizer};

    fn renderer() -> Renderer<RecordingDevice> {
        Renderer::new(RecordingDevice::new(), Box::new(MonospaceRasterizer::new()), Settings::default()).unwrap()
    }

    #[test]
    fn test_starting_camera_cannot_be_deleted() {
        let mut renderer = renderer();
        assert!(matches!(renderer.delete_camera(Scene::STARTING_CAMERA), Err(RenderError::StartingCamera)));
        assert!(renderer.is_valid(Scene::STARTING_CAMERA));
    }

    #[test]
    fn test_deleting_active_camera_restores_starting_camera() {
        let mut renderer = renderer();
        let camera = renderer.add_camera(Camera::new(Vec3::zeros(), 0.0, 0.0, 5.0, 1.0)).unwrap();
        renderer.set_active_camera(camera).unwrap();
        renderer.delete_camera(camera).unwrap();

        assert_eq!(renderer.scene().active_camera(), Scene::STARTING_CAMERA);
        assert!(matches!(renderer.set_active_camera(camera), Err(RenderError::InvalidHandle { .. })));
    }

    #[test]
    fn test_camera_edit_invalidates_objects() {
        let mut renderer = renderer();
        let mesh = renderer.add_mesh(Mesh::cube());
        let object = renderer.add_object(Object::new(mesh, None)).unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();
        assert!(renderer.get(object).unwrap().inverse_model_view_valid());

        renderer.set_camera_rotation(Scene::STARTING_CAMERA, 0.3, 0.1).unwrap();
        assert!(!renderer.get::<Camera>(Scene::STARTING_CAMERA).unwrap().matrix_valid());
        assert!(!renderer.get(object).unwrap().inverse_model_view_valid());
        assert!(renderer.get(object).unwrap().matrix_valid());
    }

    #[test]
    fn test_setters_reject_bad_arguments() {
        let mut renderer = renderer();
        let mesh = renderer.add_mesh(Mesh::cube());
        let object = renderer.add_object(Object::new(mesh, None)).unwrap();

        assert!(renderer.set_object_scale(object, Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(renderer.set_object_location(object, Vec3::new(f32::NAN, 0.0, 0.0)).is_err());
        assert!(renderer.set_camera_fov(Scene::STARTING_CAMERA, PI).is_err());
        assert!(renderer.add_camera(Camera::new(Vec3::zeros(), 0.0, 0.0, -1.0, 1.0)).is_err());
        assert_eq!(renderer.get(object).unwrap().scale(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_add_applies_setter_checks() {
        let mut renderer = renderer();
        let white = Vec3::new(1.0, 1.0, 1.0);

        assert!(renderer.add_camera(Camera::new(Vec3::zeros(), f32::NAN, 0.0, 5.0, 1.0)).is_err());
        assert!(renderer.add_camera(Camera::new(Vec3::new(f32::INFINITY, 0.0, 0.0), 0.0, 0.0, 5.0, 1.0)).is_err());
        assert!(renderer.add_point_light(PointLight::new(Vec3::zeros(), white, 1.0, 0.0)).is_err());
        assert!(renderer.add_point_light(PointLight::new(Vec3::new(f32::NAN, 0.0, 0.0), white, 1.0, 4.0)).is_err());
        assert!(renderer
            .add_cone_light(ConeLight::new(Vec3::zeros(), Vec3::z(), Vec3::new(f32::NAN, 1.0, 1.0), 1.0, 0.5, false))
            .is_err());
        let tiny = FontDesc::new(FontId(0), -3.0);
        assert!(renderer.add_text(Text::new("x", tiny, [1.0; 4], Position::top_left(0.0, 0.0), 0, 0)).is_err());

        assert_eq!(renderer.scene().store::<Camera>().len(), 1);
        assert!(renderer.scene().store::<PointLight>().is_empty());
        assert!(renderer.scene().store::<ConeLight>().is_empty());
        assert!(renderer.scene().store::<Text>().is_empty());
        assert!(renderer.add_point_light(PointLight::new(Vec3::zeros(), white, 1.0, 4.0)).is_ok());
    }

    #[test]
    fn test_flat_mesh_in_use_is_not_deleted() {
        let mut renderer = renderer();
        let quad = renderer.add_flat_mesh(FlatMesh::rectangle(10.0, 10.0));
        let element = renderer
            .add_ui_element(UiElement::new(quad, None, Position::top_left(0.0, 0.0), 0))
            .unwrap();

        assert!(matches!(renderer.delete_flat_mesh(quad), Err(RenderError::InUse { users: 1, .. })));
        assert!(renderer.is_valid(quad));

        renderer.delete_ui_element(element).unwrap();
        renderer.delete_flat_mesh(quad).unwrap();
        assert!(!renderer.is_valid(quad));
    }

    #[test]
    fn test_object_requires_live_mesh() {
        let mut renderer = renderer();
        let mesh = renderer.add_mesh(Mesh::cube());
        renderer.delete_mesh(mesh).unwrap();
        assert!(matches!(renderer.add_object(Object::new(mesh, None)), Err(RenderError::InvalidHandle { .. })));
    }

    #[test]
    fn test_text_edits_invalidate_raster() {
        let mut renderer = renderer();
        let font = FontDesc::new(FontId(0), 16.0);
        let text = renderer
            .add_text(Text::new("score", font, [1.0; 4], Position::top_left(0.0, 0.0), 0, 0))
            .unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();
        assert!(renderer.get(text).unwrap().uploaded());

        renderer.set_text_string(text, "score").unwrap();
        assert!(renderer.get(text).unwrap().uploaded());

        renderer.set_text_string(text, "score: 10").unwrap();
        assert!(!renderer.get(text).unwrap().texture_ready());

        renderer.set_text_position(text, Position::top_left(4.0, 4.0)).unwrap();
        assert!(!renderer.get(text).unwrap().layout_valid());
    }

    #[test]
    fn test_delete_releases_device_copy() {
        let mut renderer = renderer();
        let texture = renderer.add_texture_from_image(ImageData::solid_color(2, 2, [9, 9, 9, 255])).unwrap();
        let mesh = renderer.add_mesh(Mesh::cube());
        renderer.add_object(Object::new(mesh, Some(texture))).unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();

        let textures = renderer.device().live(ResourceKind::Texture);
        renderer.delete_texture(texture).unwrap();
        assert_eq!(renderer.device().live(ResourceKind::Texture), textures - 1);
        assert!(!renderer.is_valid(texture));
    }

    #[test]
    fn test_flat_mesh_update_invalidates_elements() {
        let mut renderer = renderer();
        let quad = renderer.add_flat_mesh(FlatMesh::rectangle(10.0, 10.0));
        let element = renderer
            .add_ui_element(UiElement::new(quad, None, Position::top_left(0.0, 0.0), 0))
            .unwrap();
        renderer.initialize(64, 64).unwrap();
        renderer.prepare_for_render().unwrap();

        let wider = FlatMesh::rectangle(20.0, 10.0);
        renderer
            .update_flat_mesh(quad, wider.vertices().to_vec(), wider.indices().to_vec())
            .unwrap();
        assert!(!renderer.scene().store::<UiElement>().get(element).unwrap().matrix_valid);
    }
}
