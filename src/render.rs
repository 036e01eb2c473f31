//! GPU renderer
//!
//! Draws the scene through macroquad's 3D pipeline with flat per-face
//! shading. Lighting mirrors a simple three-light rig: a constant ambient
//! term, a directional light from (1, 1, 1) and a point light just in front
//! of the model. Emissive color is added on top, so highlights glow.

use macroquad::prelude as mq;

use crate::camera::ViewCamera;
use crate::math::{mat4_transform_point, Vec3};
use crate::render_loop::SceneRenderer;
use crate::scene::{Color, Material, SceneState};

/// Ambient contribution, independent of the configured intensity
pub const AMBIENT_STRENGTH: f32 = 0.5;

/// Point light position (world space) and strength
pub const POINT_LIGHT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 2.0);
pub const POINT_LIGHT_STRENGTH: f32 = 1.0;

/// Triangles per GPU mesh; keeps vertex indices within u16
const TRIANGLES_PER_BATCH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub color: Color,
    /// Directional light strength
    pub intensity: f32,
    /// Unit vector pointing toward the directional light
    pub direction: Vec3,
}

impl Lighting {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            direction: Vec3::new(1.0, 1.0, 1.0).normalize(),
        }
    }

    /// Lit color of a flat face
    pub fn shade(&self, material: &Material, normal: Vec3, center: Vec3, eye: Vec3) -> Color {
        let base = material.base_color.unwrap_or(Color::WHITE);

        // Light whichever side the viewer sees
        let normal = if normal.dot(eye - center) < 0.0 { -normal } else { normal };

        let directional = normal.dot(self.direction).max(0.0) * self.intensity;
        let to_point = (POINT_LIGHT_POSITION - center).normalize();
        let point = normal.dot(to_point).max(0.0) * POINT_LIGHT_STRENGTH;

        let lit = base
            .modulate(self.color)
            .scale(AMBIENT_STRENGTH + directional + point);
        match material.emissive {
            Some(emissive) => lit.add(emissive),
            None => lit,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0)
    }
}

/// One world-space triangle with its final color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedTriangle {
    pub vertices: [Vec3; 3],
    pub color: Color,
    pub opacity: f32,
}

/// Transform and shade every triangle of the scene
pub fn shade_scene(scene: &SceneState, lighting: &Lighting) -> Vec<ShadedTriangle> {
    let Some(tree) = &scene.tree else { return Vec::new() };
    let model = scene.model.matrix();
    let eye = scene.camera.position;
    let mut out = Vec::new();

    for &id in &scene.meshes {
        let Some(drawable) = tree.node(id).and_then(|n| n.drawable()) else { continue };
        let Some(material) = drawable.material.primary() else { continue };
        let world = tree.world_matrix(id, &model);

        for [a, b, c] in drawable.geometry.triangles() {
            let vertices = [
                mat4_transform_point(&world, a),
                mat4_transform_point(&world, b),
                mat4_transform_point(&world, c),
            ];
            let normal = (vertices[1] - vertices[0])
                .cross(vertices[2] - vertices[0])
                .normalize();
            let center = (vertices[0] + vertices[1] + vertices[2]).scale(1.0 / 3.0);
            out.push(ShadedTriangle {
                vertices,
                color: lighting.shade(material, normal, center, eye),
                opacity: material.opacity,
            });
        }
    }
    out
}

/// `SceneRenderer` drawing to the macroquad window
pub struct MacroquadRenderer {
    pub background: Color,
    pub lighting: Lighting,
}

impl MacroquadRenderer {
    pub fn new(background: Color, lighting: Lighting) -> Self {
        Self { background, lighting }
    }
}

fn to_mq(color: Color, alpha: f32) -> mq::Color {
    mq::Color::new(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        alpha,
    )
}

fn to_camera3d(camera: &ViewCamera) -> mq::Camera3D {
    let p = camera.position;
    let t = camera.target();
    mq::Camera3D {
        position: mq::vec3(p.x, p.y, p.z),
        target: mq::vec3(t.x, t.y, t.z),
        up: mq::vec3(camera.basis_y.x, camera.basis_y.y, camera.basis_y.z),
        fovy: camera.fov_y.to_radians(),
        aspect: Some(camera.aspect),
        ..Default::default()
    }
}

impl SceneRenderer for MacroquadRenderer {
    fn render(&mut self, scene: &SceneState) {
        mq::clear_background(to_mq(self.background, 1.0));
        if !scene.is_loaded() {
            return;
        }

        mq::set_camera(&to_camera3d(&scene.camera));

        let triangles = shade_scene(scene, &self.lighting);
        for batch in triangles.chunks(TRIANGLES_PER_BATCH) {
            let mut vertices = Vec::with_capacity(batch.len() * 3);
            for tri in batch {
                let color = to_mq(tri.color, tri.opacity);
                for v in tri.vertices {
                    vertices.push(mq::Vertex::new(v.x, v.y, v.z, 0.0, 0.0, color));
                }
            }
            let indices: Vec<u16> = (0..vertices.len() as u16).collect();
            mq::draw_mesh(&mq::Mesh { vertices, indices, texture: None });
        }

        mq::set_default_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mat4_identity;
    use crate::scene::{Geometry, SceneTree};

    #[test]
    fn test_face_toward_light_is_brighter() {
        let lighting = Lighting::default();
        let material = Material::standard(Color::new(0.5, 0.5, 0.5));
        let eye = Vec3::new(0.0, 0.0, 3.0);

        let facing = lighting.shade(&material, Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, eye);
        let grazing = lighting.shade(&material, Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO, eye);
        assert!(facing.r > grazing.r);
        // Ambient alone still lights the grazing face
        assert!((grazing.r - 0.5 * AMBIENT_STRENGTH).abs() < 1e-5, "{:?}", grazing);
    }

    #[test]
    fn test_back_face_is_lit_like_front() {
        let lighting = Lighting::default();
        let material = Material::standard(Color::WHITE);
        let eye = Vec3::new(0.0, 0.0, 3.0);

        let front = lighting.shade(&material, Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, eye);
        let back = lighting.shade(&material, Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, eye);
        assert_eq!(front, back);
    }

    #[test]
    fn test_emissive_is_added() {
        let lighting = Lighting::new(Color::BLACK, 0.0);
        let mut material = Material::standard(Color::WHITE);
        material.emissive = Some(Color::new(0.2, 0.0, 0.0));

        let c = lighting.shade(&material, Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(c, Color::new(0.2, 0.0, 0.0));
    }

    #[test]
    fn test_shade_scene_follows_model_transform() {
        let mut tree = SceneTree::new(None);
        let root = tree.root();
        tree.add_drawable(
            root,
            Some("Tri".into()),
            mat4_identity(),
            Geometry::new(
                vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
                vec![0, 1, 2],
            ),
            Material::standard(Color::WHITE).into(),
        );
        let mut scene = SceneState::new(Vec3::new(0.0, 0.0, 3.0));
        scene.install(tree);
        scene.model.position = Vec3::new(0.0, 2.0, 0.0);

        let tris = shade_scene(&scene, &Lighting::default());
        assert_eq!(tris.len(), 1);
        assert_eq!(tris[0].vertices[0], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(tris[0].opacity, 1.0);
    }

    #[test]
    fn test_unloaded_scene_has_no_triangles() {
        let scene = SceneState::new(Vec3::new(0.0, 0.0, 3.0));
        assert!(shade_scene(&scene, &Lighting::default()).is_empty());
    }
}
