//! Shader programs
//!
//! GLSL sources are embedded at build time. `lights.glsl` is an include
//! spliced into the shaded programs wherever the `// lights.glsl` marker
//! line appears.

use crate::render::api::{GraphicsDevice, ProgramId};
use crate::render::RenderResult;

const LIGHTS_MARKER: &str = "// lights.glsl";
const LIGHTS: &str = include_str!("../../../shaders/lights.glsl");

const MESH_VERT: &str = include_str!("../../../shaders/mesh.vert");
const SCREEN_VERT: &str = include_str!("../../../shaders/screen.vert");

/// Every program the frame pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Depth-only sun shadow pass
    Shadow,
    /// Deferred geometry buffer fill
    Geometry,
    /// Deferred screen-space lighting
    Lighting,
    /// Forward pass, lit permutation
    ForwardShaded,
    /// Forward pass, unlit permutation
    ForwardUnshaded,
    /// HDR resolve with fixed exposure
    Tonemap,
    /// Text quads
    Text,
    /// UI element quads
    Ui,
}

impl ProgramKind {
    /// Every program, in compile order
    pub const ALL: [Self; 8] = [
        Self::Shadow,
        Self::Geometry,
        Self::Lighting,
        Self::ForwardShaded,
        Self::ForwardUnshaded,
        Self::Tonemap,
        Self::Text,
        Self::Ui,
    ];

    /// Program label, as reported to the device
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shadow => "shadow",
            Self::Geometry => "geometry",
            Self::Lighting => "lighting",
            Self::ForwardShaded => "forward_shaded",
            Self::ForwardUnshaded => "forward_unshaded",
            Self::Tonemap => "tonemap",
            Self::Text => "text",
            Self::Ui => "ui",
        }
    }

    const fn sources(self) -> (&'static str, &'static str) {
        match self {
            Self::Shadow => (
                include_str!("../../../shaders/shadow.vert"),
                include_str!("../../../shaders/shadow.frag"),
            ),
            Self::Geometry => (MESH_VERT, include_str!("../../../shaders/geometry.frag")),
            Self::Lighting => (SCREEN_VERT, include_str!("../../../shaders/lighting.frag")),
            Self::ForwardShaded => (MESH_VERT, include_str!("../../../shaders/shaded.frag")),
            Self::ForwardUnshaded => (MESH_VERT, include_str!("../../../shaders/unshaded.frag")),
            Self::Tonemap => (SCREEN_VERT, include_str!("../../../shaders/tonemap.frag")),
            Self::Text => (
                include_str!("../../../shaders/text.vert"),
                include_str!("../../../shaders/text.frag"),
            ),
            Self::Ui => (
                include_str!("../../../shaders/ui.vert"),
                include_str!("../../../shaders/ui.frag"),
            ),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

fn expand(source: &str) -> String {
    source.replace(LIGHTS_MARKER, LIGHTS)
}

/// Compiled program set
#[derive(Debug)]
pub struct ProgramSet {
    ids: [ProgramId; ProgramKind::ALL.len()],
}

impl ProgramSet {
    /// Compile and link every program; the first failure is fatal
    pub fn compile<D: GraphicsDevice + ?Sized>(device: &mut D) -> RenderResult<Self> {
        let mut ids = Vec::with_capacity(ProgramKind::ALL.len());
        for kind in ProgramKind::ALL {
            let (vertex, fragment) = kind.sources();
            match device.compile_program(kind.label(), &expand(vertex), &expand(fragment)) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    log::error!("Failed to build program '{}': {e}", kind.label());
                    for id in ids {
                        device.delete_program(id);
                    }
                    return Err(e.into());
                }
            }
        }
        log::debug!("Compiled {} shader programs", ids.len());

        let mut table = [ProgramId(0); ProgramKind::ALL.len()];
        table.copy_from_slice(&ids);
        Ok(Self { ids: table })
    }

    /// Device id of a program
    pub const fn get(&self, kind: ProgramKind) -> ProgramId {
        self.ids[kind.index()]
    }

    /// Free every program
    pub fn delete<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        for id in self.ids {
            device.delete_program(id);
        }
    }
}
