//! Selection highlighting
//!
//! A highlight replaces a mesh's material with a tinted copy. The material
//! in place before the first highlight is captured once and never
//! overwritten, so `restore_all` always returns meshes to what was loaded.

use crate::scene::{Color, Material, MaterialSlot, NodeId, SceneState};

/// Emissive glow given to highlighted materials that support it
pub const HIGHLIGHT_EMISSIVE: u32 = 0x222222;

/// Tinted copy of a material. Materials without a base color come back unchanged.
pub fn highlighted_material(material: &Material, color: Color) -> Material {
    if !material.has_base_color() {
        return material.clone();
    }
    let mut tinted = material.clone();
    tinted.base_color = Some(color);
    if tinted.has_emissive() {
        tinted.emissive = Some(Color::from_hex(HIGHLIGHT_EMISSIVE));
    }
    tinted
}

/// Tinted copy of every material in a slot
pub fn highlighted_slot(slot: &MaterialSlot, color: Color) -> MaterialSlot {
    slot.map(|m| highlighted_material(m, color))
}

/// Applies and reverts highlight materials
#[derive(Debug, Clone)]
pub struct HighlightManager {
    color: Color,
}

impl HighlightManager {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Highlight one drawable. Returns false if `mesh` is not a drawable.
    pub fn highlight(&self, scene: &mut SceneState, mesh: NodeId) -> bool {
        let Some(tree) = scene.tree.as_mut() else { return false };
        let Some(current) = tree.material_mut(mesh) else { return false };

        let original = scene
            .original_materials
            .entry(mesh)
            .or_insert_with(|| current.clone());
        *current = highlighted_slot(original, self.color);
        true
    }

    /// Put every tracked mesh back on its captured material.
    /// The captures are kept, so calling this repeatedly is harmless.
    pub fn restore_all(scene: &mut SceneState) {
        let Some(tree) = scene.tree.as_mut() else { return };
        for (&mesh, original) in &scene.original_materials {
            if let Some(current) = tree.material_mut(mesh) {
                *current = original.clone();
            }
        }
    }
}
