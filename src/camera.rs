//! Perspective camera for the model view
//!
//! The camera never rotates: it sits at `position` and looks down -Z,
//! with +X right and +Y up. Zoom moves it along Z.

use crate::math::Vec3;

/// Default vertical field of view (degrees)
pub const DEFAULT_FOV_Y: f32 = 75.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Camera state for 3D rendering and picking
#[derive(Clone, Debug, PartialEq)]
pub struct ViewCamera {
    pub position: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    /// Width / height of the view
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // Fixed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

impl ViewCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            fov_y: DEFAULT_FOV_Y,
            aspect: 1.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            basis_x: Vec3::new(1.0, 0.0, 0.0),
            basis_y: Vec3::new(0.0, 1.0, 0.0),
            // Forward (into the scene)
            basis_z: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Update the aspect ratio from viewport dimensions
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Distance along Z, the quantity zoom operates on
    pub fn distance(&self) -> f32 {
        self.position.z
    }

    pub fn set_distance(&mut self, z: f32) {
        self.position.z = z;
    }

    /// Point the camera looks at, one unit ahead
    pub fn target(&self) -> Vec3 {
        self.position + self.basis_z
    }
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}
