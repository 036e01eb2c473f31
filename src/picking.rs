//! Screen-coordinate picking
//!
//! A pick casts a ray from the camera through the touched pixel, finds the
//! nearest triangle among all drawables, then resolves the hit to the
//! nearest named node above it. When that node is a group, the first
//! drawable inside it carries the highlight.

use crate::geometry::normalize_to_clip_space;
use crate::math::{
    mat4_determinant3, mat4_transform_point, ray_aabb_intersect, ray_triangle_intersect, Vec3,
};
use crate::ray::{camera_ray, Ray};
use crate::scene::{NodeId, SceneState, SceneTree};

/// Result of a successful pick
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    /// Name of the resolved node
    pub name: String,
    /// Node the ray actually hit
    pub hit_node: NodeId,
    /// Drawable to highlight
    pub mesh: NodeId,
    /// Distance from the camera along the ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Nearest drawable hit by `ray` and its distance
pub fn raycast(scene: &SceneState, ray: &Ray) -> Option<(NodeId, f32)> {
    let tree = scene.tree.as_ref()?;
    let model = scene.model.matrix();
    let mut best: Option<(NodeId, f32)> = None;

    for &id in &scene.meshes {
        let Some(drawable) = tree.node(id).and_then(|n| n.drawable()) else { continue };
        let geometry = &drawable.geometry;
        let world = tree.world_matrix(id, &model);
        let double_sided = drawable.material.double_sided();
        // Mirroring transforms reverse the winding of every triangle
        let mirrored = mat4_determinant3(&world) < 0.0;

        if let Some(bounds) = geometry.bounds {
            if !ray_aabb_intersect(ray.origin, ray.direction, &bounds.transformed(&world)) {
                continue;
            }
        }

        for [a, b, c] in geometry.triangles() {
            let (a, b, c) = (
                mat4_transform_point(&world, a),
                mat4_transform_point(&world, b),
                mat4_transform_point(&world, c),
            );
            let (b, c) = if mirrored { (c, b) } else { (b, c) };
            if let Some(t) = ray_triangle_intersect(ray.origin, ray.direction, a, b, c, double_sided) {
                if t >= scene.camera.near && t <= scene.camera.far && best.map_or(true, |(_, bt)| t < bt) {
                    best = Some((id, t));
                }
            }
        }
    }

    best
}

/// Resolve a raw hit to the node a user means by it
pub fn resolve_target(tree: &SceneTree, hit: NodeId) -> Option<(String, NodeId)> {
    let named = tree.named_ancestor(hit)?;
    let node = tree.node(named)?;
    let mesh = if node.is_drawable() {
        named
    } else {
        tree.first_drawable_under(named)?
    };
    Some((node.name().unwrap_or_default().to_string(), mesh))
}

/// Pick the mesh under a screen coordinate
pub fn pick(scene: &SceneState, screen_x: f32, screen_y: f32) -> Option<PickHit> {
    let tree = scene.tree.as_ref()?;
    let (width, height) = scene.viewport;
    let clip = normalize_to_clip_space(screen_x, screen_y, width, height);
    let ray = camera_ray(clip, &scene.camera);

    let (hit_node, distance) = raycast(scene, &ray)?;
    let (name, mesh) = resolve_target(tree, hit_node)?;
    Some(PickHit { name, hit_node, mesh, distance, point: ray.at(distance) })
}
