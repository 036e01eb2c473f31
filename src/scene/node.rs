//! Scene tree: an arena of named nodes
//!
//! The tree mirrors the loaded model's node hierarchy. Groups only carry
//! a transform; drawables also carry triangle geometry and materials.
//! Nodes are never removed, so a `NodeId` stays valid for the tree's life.

use crate::math::{mat4_identity, mat4_mul, Aabb, Mat4, Vec3};
use super::material::MaterialSlot;

/// Index of a node in its `SceneTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Triangle soup in node-local space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    /// Triangle list; always a multiple of three
    pub indices: Vec<u32>,
    pub bounds: Option<Aabb>,
}

impl Geometry {
    pub fn new(positions: Vec<Vec3>, mut indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() as u32;
        // Drop a dangling partial triangle and any out-of-range index
        indices.truncate(indices.len() - indices.len() % 3);
        if indices.iter().any(|&i| i >= vertex_count) {
            indices = indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < vertex_count))
                .flatten()
                .copied()
                .collect();
        }
        let bounds = Aabb::from_points(positions.iter().copied());
        Self { positions, indices, bounds }
    }

    /// Iterate triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Renderable payload of a drawable node
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub geometry: Geometry,
    pub material: MaterialSlot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Drawable(Drawable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Transform relative to the parent
    pub local: Mat4,
    pub kind: NodeKind,
}

impl Node {
    /// Name if present and non-empty
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn is_drawable(&self) -> bool {
        matches!(self.kind, NodeKind::Drawable(_))
    }

    pub fn drawable(&self) -> Option<&Drawable> {
        match &self.kind {
            NodeKind::Drawable(d) => Some(d),
            NodeKind::Group => None,
        }
    }

    pub fn drawable_mut(&mut self) -> Option<&mut Drawable> {
        match &mut self.kind {
            NodeKind::Drawable(d) => Some(d),
            NodeKind::Group => None,
        }
    }
}

/// Node hierarchy of one loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SceneTree {
    /// Create a tree holding only a root group
    pub fn new(root_name: Option<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name,
                parent: None,
                children: Vec::new(),
                local: mat4_identity(),
                kind: NodeKind::Group,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    fn push(&mut self, parent: NodeId, name: Option<String>, local: Mat4, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        // An unknown parent attaches to the root
        let parent = if parent.0 < self.nodes.len() { parent } else { self.root };
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            local,
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_group(&mut self, parent: NodeId, name: Option<String>, local: Mat4) -> NodeId {
        self.push(parent, name, local, NodeKind::Group)
    }

    pub fn add_drawable(
        &mut self,
        parent: NodeId,
        name: Option<String>,
        local: Mat4,
        geometry: Geometry,
        material: MaterialSlot,
    ) -> NodeId {
        self.push(parent, name, local, NodeKind::Drawable(Drawable { geometry, material }))
    }

    /// Pre-order traversal starting at `from` (inclusive)
    pub fn traverse(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if self.node(from).is_none() {
            return order;
        }
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            // Reverse so the first child is visited first
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Every drawable node in traversal order
    pub fn drawables(&self) -> Vec<NodeId> {
        self.traverse(self.root)
            .into_iter()
            .filter(|&id| self.nodes[id.0].is_drawable())
            .collect()
    }

    /// First drawable at or below `id` in traversal order
    pub fn first_drawable_under(&self, id: NodeId) -> Option<NodeId> {
        self.traverse(id)
            .into_iter()
            .find(|&n| self.nodes[n.0].is_drawable())
    }

    /// First drawable with this exact name in traversal order
    pub fn find_drawable_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse(self.root)
            .into_iter()
            .find(|&id| {
                let node = &self.nodes[id.0];
                node.is_drawable() && node.name() == Some(name)
            })
    }

    /// Nearest node at or above `id` that has a name.
    /// Stops at the root even when the root is unnamed.
    pub fn named_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.node(id).map(|_| id)?;
        loop {
            let node = &self.nodes[current.0];
            if node.name().is_some() {
                return Some(current);
            }
            match node.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    /// Model-space transform of a node (product of locals from the root down)
    pub fn world_matrix(&self, id: NodeId, model: &Mat4) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            let Some(node) = self.node(n) else { break };
            chain.push(n);
            current = node.parent;
        }
        chain
            .iter()
            .rev()
            .fold(*model, |acc, n| mat4_mul(&acc, &self.nodes[n.0].local))
    }

    pub fn material(&self, id: NodeId) -> Option<&MaterialSlot> {
        self.node(id)?.drawable().map(|d| &d.material)
    }

    pub fn material_mut(&mut self, id: NodeId) -> Option<&mut MaterialSlot> {
        self.node_mut(id)?.drawable_mut().map(|d| &mut d.material)
    }
}
