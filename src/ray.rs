//! Ray casting utilities for picking
//!
//! Inverts the perspective projection of `ViewCamera` so a clip-space
//! point becomes a world-space ray from the eye.

use crate::camera::ViewCamera;
use crate::geometry::Point2;
use crate::math::Vec3;

/// A 3D ray with origin and direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,  // Normalized
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize()
        }
    }

    /// Get point at distance t along ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Generate a ray from a clip-space point through the camera.
///
/// At unit depth in front of the eye the visible half-height is
/// `tan(fov_y / 2)` and the half-width is that times the aspect ratio:
/// ```text
/// cam_dir = (clip_x * tan * aspect, clip_y * tan, 1)   // camera space
/// ```
/// The camera-space direction is mapped to world space through the basis.
pub fn camera_ray(clip: Point2, camera: &ViewCamera) -> Ray {
    let tan_half = (camera.fov_y.to_radians() / 2.0).tan();

    let cam_space_dir = Vec3::new(
        clip.x * tan_half * camera.aspect,
        clip.y * tan_half,
        1.0,
    );

    let world_dir = camera.basis_x * cam_space_dir.x
        + camera.basis_y * cam_space_dir.y
        + camera.basis_z * cam_space_dir.z;

    Ray::new(camera.position, world_dir)
}
