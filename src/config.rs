//! Viewer configuration
//!
//! Loaded from a RON file. Every field is optional; missing fields take
//! the defaults below.
//!
//! ```ron
//! (
//!     model: "assets/robot.glb",
//!     auto_rotate: true,
//!     background_color: "#202020",
//!     selected_mesh_color: 0xff8800,
//! )
//! ```

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::Vec3;
use crate::scene::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Path of the GLB/glTF asset
    pub model: String,
    /// Model euler rotation at load and reset (radians)
    pub initial_rotation: Vec3,
    pub auto_rotate: bool,
    /// Radians per frame around Y
    pub auto_rotate_speed: f32,
    /// CSS-style hex color, `#rgb` or `#rrggbb`
    pub background_color: String,
    pub light_color: u32,
    pub light_intensity: f32,
    /// Camera position; its z is the reference distance for zoom 1.0
    pub camera_position: Vec3,
    pub initial_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub enable_gestures: bool,
    /// Highlight color for the selected mesh (0xRRGGBB)
    pub selected_mesh_color: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: "assets/model.glb".to_string(),
            initial_rotation: Vec3::ZERO,
            auto_rotate: false,
            auto_rotate_speed: 0.01,
            background_color: "#000".to_string(),
            light_color: 0xffffff,
            light_intensity: 1.0,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            initial_zoom: 1.0,
            min_zoom: 0.5,
            max_zoom: 5.0,
            enable_gestures: true,
            selected_mesh_color: 0x00ff00,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate RON text
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return invalid(format!("min_zoom must be positive, got {}", self.min_zoom));
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            return invalid(format!(
                "max_zoom ({}) must be >= min_zoom ({})",
                self.max_zoom, self.min_zoom
            ));
        }
        if !(self.camera_position.z.is_finite() && self.camera_position.z > 0.0) {
            return invalid(format!(
                "camera_position.z must be positive, got {}",
                self.camera_position.z
            ));
        }
        if !self.initial_zoom.is_finite() || self.initial_zoom <= 0.0 {
            return invalid(format!("initial_zoom must be positive, got {}", self.initial_zoom));
        }
        if Color::parse_css_hex(&self.background_color).is_none() {
            return invalid(format!("background_color '{}' is not a hex color", self.background_color));
        }
        Ok(())
    }

    /// Clamp a zoom factor into the configured range
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Distance at which the camera shows zoom 1.0
    pub fn reference_distance(&self) -> f32 {
        self.camera_position.z
    }

    /// Camera position at load and after reset
    pub fn initial_camera_position(&self) -> Vec3 {
        let z = self.reference_distance() / self.clamp_zoom(self.initial_zoom);
        Vec3::new(self.camera_position.x, self.camera_position.y, z)
    }

    pub fn background(&self) -> Color {
        Color::parse_css_hex(&self.background_color).unwrap_or(Color::BLACK)
    }

    pub fn highlight_color(&self) -> Color {
        Color::from_hex(self.selected_mesh_color)
    }

    pub fn light(&self) -> Color {
        Color::from_hex(self.light_color)
    }

    /// Per-frame auto-rotate increment, if enabled
    pub fn auto_rotate_step(&self) -> Option<f32> {
        self.auto_rotate.then_some(self.auto_rotate_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ViewerConfig::from_ron_str("()").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.reference_distance(), 3.0);
        assert_eq!(config.auto_rotate_step(), None);
    }

    #[test]
    fn test_partial_config() {
        let config = ViewerConfig::from_ron_str(
            "(model: \"robot.glb\", auto_rotate: true, max_zoom: 8.0, background_color: \"#fff\")",
        )
        .unwrap();
        assert_eq!(config.model, "robot.glb");
        assert_eq!(config.auto_rotate_step(), Some(0.01));
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.background().to_hex(), 0xffffff);
        assert_eq!(config.min_zoom, 0.5);
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        let err = ViewerConfig::from_ron_str("(min_zoom: 2.0, max_zoom: 1.0)").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_bad_background_rejected() {
        let err = ViewerConfig::from_ron_str("(background_color: \"black\")").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = ViewerConfig::from_ron_str("(min_zoom: )").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_initial_zoom_sets_camera_distance() {
        let config = ViewerConfig { initial_zoom: 2.0, ..ViewerConfig::default() };
        assert_eq!(config.initial_camera_position(), Vec3::new(0.0, 0.0, 1.5));

        let clamped = ViewerConfig { initial_zoom: 100.0, ..ViewerConfig::default() };
        assert_eq!(clamped.initial_camera_position().z, 3.0 / 5.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(camera_position: (x: 0.0, y: 1.0, z: 6.0), enable_gestures: false)").unwrap();

        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.camera_position, Vec3::new(0.0, 1.0, 6.0));
        assert!(!config.enable_gestures);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::load(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
