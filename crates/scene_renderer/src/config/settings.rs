//! Renderer settings
//!
//! The option set the renderer recognizes. Values are validated as a whole
//! before the renderer applies any of them.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Geometry pipeline flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RendererType {
    /// Every object drawn directly with lighting evaluated per object
    Forward,
    /// Opaque shaded objects go through a geometry buffer and a screen-space lighting pass
    Deferred,
}

/// Anti-aliasing mode
///
/// `Msaa*` variants are hardware sample counts; `Ssaa*` variants render at
/// that many times the display resolution along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntiAliasing {
    /// No anti-aliasing
    None,
    /// 2x multisampling
    Msaa2,
    /// 4x multisampling
    Msaa4,
    /// 8x multisampling
    Msaa8,
    /// 2x supersampling
    Ssaa2,
    /// 4x supersampling
    Ssaa4,
}

impl AntiAliasing {
    /// Multisample count of the render target
    pub const fn samples(self) -> u32 {
        match self {
            Self::Msaa2 => 2,
            Self::Msaa4 => 4,
            Self::Msaa8 => 8,
            Self::None | Self::Ssaa2 | Self::Ssaa4 => 1,
        }
    }

    /// Per-axis resolution multiplier of the render target
    pub const fn scale(self) -> u32 {
        match self {
            Self::Ssaa2 => 2,
            Self::Ssaa4 => 4,
            Self::None | Self::Msaa2 | Self::Msaa4 | Self::Msaa8 => 1,
        }
    }

    /// Whether this is a multisampling mode
    pub const fn is_msaa(self) -> bool {
        self.samples() > 1
    }

    /// Whether this is a supersampling mode
    pub const fn is_ssaa(self) -> bool {
        self.scale() > 1
    }
}

/// Texture sampling filter applied on upload and on setting change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFiltering {
    /// Nearest texel, nearest mip
    Nearest,
    /// Linear texel, nearest mip
    Bilinear,
    /// Linear texel, linear mip
    Trilinear,
    /// Trilinear plus 4x anisotropy
    Anisotropic4,
    /// Trilinear plus 16x anisotropy
    Anisotropic16,
}

/// Text rasterization quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextQuality {
    /// Hard-edged glyphs
    Low,
    /// Antialiased glyphs
    Medium,
    /// Antialiased at 2x, downsampled
    High,
    /// Antialiased at 4x, downsampled
    Ultra,
}

impl TextQuality {
    /// Whether glyph coverage is kept instead of thresholded
    pub const fn antialiased(self) -> bool {
        !matches!(self, Self::Low)
    }

    /// Rasterization oversampling factor
    pub const fn oversample(self) -> u32 {
        match self {
            Self::Low | Self::Medium => 1,
            Self::High => 2,
            Self::Ultra => 4,
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Far clip plane distance, must be greater than 1
    pub view_distance: f32,
    /// Forward or deferred geometry pipeline
    pub renderer_type: RendererType,
    /// Anti-aliasing for the forward pipeline
    pub forward_aa: AntiAliasing,
    /// Anti-aliasing for the deferred pipeline, supersampling only
    pub deferred_aa: AntiAliasing,
    /// Anti-aliasing for the UI and text overlay, multisampling only
    pub ui_aa: AntiAliasing,
    /// Texture sampling filter
    pub texture_filtering: TextureFiltering,
    /// Text rasterization quality
    pub text_rendering_quality: TextQuality,
    /// Draw polygons as outlines
    pub wireframe: bool,
    /// Background colour (RGB, 0.0-1.0)
    pub clear_color: [f32; 3],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_distance: 1000.0,
            renderer_type: RendererType::Deferred,
            forward_aa: AntiAliasing::Msaa4,
            deferred_aa: AntiAliasing::None,
            ui_aa: AntiAliasing::None,
            texture_filtering: TextureFiltering::Trilinear,
            text_rendering_quality: TextQuality::High,
            wireframe: false,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

impl Settings {
    /// Check every option, reporting the first one that is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_view_distance(self.view_distance)?;

        if self.deferred_aa.is_msaa() {
            return Err(ConfigError::InvalidValue {
                name: "deferred_aa",
                reason: format!("{:?} is not supported by the deferred pipeline", self.deferred_aa),
            });
        }
        if self.ui_aa.is_ssaa() {
            return Err(ConfigError::InvalidValue {
                name: "ui_aa",
                reason: format!("{:?} is not supported for the overlay", self.ui_aa),
            });
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                name: "clear_color",
                reason: "components must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Anti-aliasing mode of the active pipeline
    pub const fn scene_aa(&self) -> AntiAliasing {
        match self.renderer_type {
            RendererType::Forward => self.forward_aa,
            RendererType::Deferred => self.deferred_aa,
        }
    }
}

/// Reject view distances the projection cannot use
pub fn validate_view_distance(view_distance: f32) -> Result<(), ConfigError> {
    if view_distance.is_finite() && view_distance > 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: "view_distance",
            reason: format!("{view_distance} must be a finite value greater than 1"),
        })
    }
}

impl Config for Settings {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::Format;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_view_distance_must_exceed_one() {
        let settings = Settings { view_distance: 1.0, ..Settings::default() };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { name: "view_distance", .. })
        ));
        assert!(validate_view_distance(f32::NAN).is_err());
        assert!(validate_view_distance(1.5).is_ok());
    }

    #[test]
    fn test_deferred_rejects_multisampling() {
        let settings = Settings { deferred_aa: AntiAliasing::Msaa4, ..Settings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ui_rejects_supersampling() {
        let settings = Settings { ui_aa: AntiAliasing::Ssaa2, ..Settings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_scene_aa_follows_renderer_type() {
        let mut settings = Settings {
            forward_aa: AntiAliasing::Msaa8,
            deferred_aa: AntiAliasing::Ssaa2,
            ..Settings::default()
        };
        settings.renderer_type = RendererType::Forward;
        assert_eq!(settings.scene_aa(), AntiAliasing::Msaa8);
        settings.renderer_type = RendererType::Deferred;
        assert_eq!(settings.scene_aa(), AntiAliasing::Ssaa2);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            renderer_type: RendererType::Forward,
            wireframe: true,
            ..Settings::default()
        };
        let text = settings.encode(Format::Toml).expect("serialize");
        let parsed = Settings::parse(&text, Format::Toml).expect("parse");
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed = Settings::parse("(view_distance: 600.0)", Format::Ron).expect("parse");
        assert_eq!(parsed.view_distance, 600.0);
        assert_eq!(parsed.renderer_type, RendererType::Deferred);
    }

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(Format::of(Path::new("renderer.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::of(Path::new("dir.v2/renderer.ron")).unwrap(), Format::Ron);
        assert!(matches!(Format::of(Path::new("renderer.ini")), Err(ConfigError::UnsupportedFormat(_))));
        assert!(matches!(Settings::load_from_file("missing.json"), Err(ConfigError::UnsupportedFormat(_))));
    }
}
