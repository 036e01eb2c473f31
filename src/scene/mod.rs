//! Scene state store
//!
//! Everything the viewer mutates lives here: the loaded tree, the camera,
//! the model transform, the mesh list, captured original materials and the
//! current selection. Subsystems receive it by `&mut` and nothing else holds
//! on to it.

mod material;
mod node;

pub use material::{Color, Material, MaterialSlot};
pub use node::{Drawable, Geometry, Node, NodeId, NodeKind, SceneTree};

use std::collections::BTreeMap;

use crate::camera::ViewCamera;
use crate::math::{mat4_from_position_rotation, Mat4, Vec3};

/// Root transform applied on top of the model's own hierarchy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelTransform {
    pub position: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
}

impl ModelTransform {
    pub fn matrix(&self) -> Mat4 {
        mat4_from_position_rotation(self.position, self.rotation)
    }
}

/// The single selected mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Name reported to listeners (the named node the hit resolved to)
    pub name: String,
    /// Drawable carrying the highlight
    pub mesh: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct SceneState {
    pub tree: Option<SceneTree>,
    pub camera: ViewCamera,
    pub model: ModelTransform,
    /// Drawable nodes in traversal order
    pub meshes: Vec<NodeId>,
    /// Materials as they were before the first highlight of each mesh
    pub original_materials: BTreeMap<NodeId, MaterialSlot>,
    pub selection: Option<Selection>,
    /// View size in pixels, used for picking
    pub viewport: (f32, f32),
}

impl SceneState {
    /// Empty state with a camera at the given position
    pub fn new(camera_position: Vec3) -> Self {
        Self {
            camera: ViewCamera::new(camera_position),
            viewport: (1.0, 1.0),
            ..Self::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    /// Install a freshly loaded tree, replacing any previous one
    pub fn install(&mut self, tree: SceneTree) {
        self.meshes = tree.drawables();
        self.original_materials.clear();
        self.selection = None;
        self.tree = Some(tree);
    }

    /// Drop the model and everything derived from it
    pub fn teardown(&mut self) {
        self.tree = None;
        self.meshes.clear();
        self.original_materials.clear();
        self.selection = None;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport = (width, height);
            self.camera.set_viewport(width, height);
        }
    }

    /// Names of drawables, in traversal order. Unnamed drawables are skipped.
    pub fn mesh_names(&self) -> Vec<String> {
        let Some(tree) = &self.tree else { return Vec::new() };
        self.meshes
            .iter()
            .filter_map(|&id| tree.node(id)?.name().map(str::to_string))
            .collect()
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.name.as_str())
    }
}
