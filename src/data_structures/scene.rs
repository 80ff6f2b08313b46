//! The root aggregate for one loaded asset.
//!
//! A [`Scene`] exclusively owns its nodes (in an arena indexed by
//! [`NodeId`]), its materials and its decoded textures. GPU handles embedded
//! in meshes and textures are leased from the GL context and are only
//! released by [`Scene::clear`]; dropping a scene without clearing it leaks
//! those handles in video memory.

use std::collections::HashMap;
use std::path::PathBuf;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::data_structures::aabb::Aabb;
use crate::data_structures::material::PbrMaterial;
use crate::data_structures::node::{Node, NodeId};
use crate::data_structures::texture::Texture;
use crate::shader::Shader;

/// A 3D scene: node hierarchy, materials, deduplicated textures and the
/// shader program used to render it.
pub struct Scene {
    pub name: String,
    pub path: PathBuf,
    pub pos: Vector3<f32>,
    pub rot: Vector3<f32>,
    pub scale: f32,
    pub matrix: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    /// Arena holding every node of the hierarchy.
    pub nodes: Vec<Node>,
    /// Ids of the unique top-level nodes.
    pub roots: Vec<NodeId>,
    /// Depth-first flattening of the hierarchy. Rebuilt by [`linearize`]
    /// (called on load and at the start of every [`clear`]), never maintained
    /// incrementally — do not assume it is current after mutating the graph.
    ///
    /// [`linearize`]: Scene::linearize
    /// [`clear`]: Scene::clear
    pub linear_nodes: Vec<NodeId>,
    /// Decoded textures keyed by source URI, so an image referenced by
    /// several materials is decoded and uploaded at most once per scene.
    pub textures: HashMap<String, Texture>,
    pub materials: Vec<PbrMaterial>,
    pub aabb: Aabb,
    pub shader: Shader,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: PathBuf::new(),
            pos: Vector3::new(0.0, 0.0, 0.0),
            rot: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
            matrix: Matrix4::identity(),
            mvp: Matrix4::identity(),
            nodes: Vec::new(),
            roots: Vec::new(),
            linear_nodes: Vec::new(),
            textures: HashMap::new(),
            materials: Vec::new(),
            aabb: Aabb::default(),
            shader: Shader::default(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node to the arena, linking it to `parent` (or registering it
    /// as a root) and returns its id.
    pub fn push_node(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        node.parent = parent;
        self.nodes.push(node);
        match parent {
            Some(parent_id) => self.nodes[parent_id].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Rebuilds `linear_nodes` as a depth-first flattening of the hierarchy,
    /// using an explicit worklist so arbitrarily deep assets cannot overflow
    /// the call stack.
    pub fn linearize(&mut self) {
        self.linear_nodes.clear();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            self.linear_nodes.push(id);
            for child in self.nodes[id].children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    /// Global transform of a node: the composition of every local matrix from
    /// the node up through its ancestors. Walks the weak parent links
    /// iteratively; cost is proportional to depth, so callers transforming
    /// many nodes per frame should cache the results.
    pub fn global_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut m = self.nodes[id].local_matrix();
        let mut parent = self.nodes[id].parent;
        while let Some(pid) = parent {
            m = self.nodes[pid].local_matrix() * m;
            parent = self.nodes[pid].parent;
        }
        m
    }

    /// Recomputes the scene bounds from every mesh primitive's box
    /// transformed by its node's global matrix.
    pub fn refresh_bounds(&mut self) {
        let mut aabb = Aabb::default();
        for &id in &self.linear_nodes {
            let global = self.global_matrix(id);
            if let Some(mesh) = &self.nodes[id].mesh {
                for primitive in &mesh.primitives {
                    if !primitive.aabb.is_empty() {
                        aabb.merge(&primitive.aabb.transformed(&global));
                    }
                }
            }
        }
        self.aabb = aabb;
    }

    /// Releases every GPU resource owned by the scene and resets it to the
    /// empty state.
    ///
    /// The linear list is rebuilt first so every node in the hierarchy is
    /// visited exactly once; meshes, textures and the shader program are
    /// deleted through the GL context. Idempotent: clearing an already empty
    /// scene performs no deletion calls.
    pub fn clear(&mut self, gl: &glow::Context) {
        self.linearize();
        for i in 0..self.linear_nodes.len() {
            let id = self.linear_nodes[i];
            self.nodes[id].clear(gl);
        }
        for texture in self.textures.values_mut() {
            texture.clear(gl);
        }
        self.textures.clear();
        self.nodes.clear();
        self.roots.clear();
        self.linear_nodes.clear();
        self.materials.clear();
        self.shader.clear(gl);

        log::info!("cleared scene {}", self.path.display());

        self.name.clear();
        self.path = PathBuf::new();
        self.pos = Vector3::new(0.0, 0.0, 0.0);
        self.rot = Vector3::new(0.0, 0.0, 0.0);
        self.scale = 1.0;
        self.matrix = Matrix4::identity();
        self.mvp = Matrix4::identity();
        self.aabb = Aabb::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Quaternion, Rotation3};

    fn matrices_close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = (*a).into();
        let b: [[f32; 4]; 4] = (*b).into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn linearize_is_depth_first() {
        let mut scene = Scene::new();
        // root0 -> (a -> (b), c), root1
        let root0 = scene.push_node(Node::default(), None);
        let a = scene.push_node(Node::default(), Some(root0));
        let _b = scene.push_node(Node::default(), Some(a));
        let _c = scene.push_node(Node::default(), Some(root0));
        let _root1 = scene.push_node(Node::default(), None);
        scene.linearize();
        assert_eq!(scene.linear_nodes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn global_matrix_matches_direct_composition_over_three_levels() {
        let mut scene = Scene::new();

        let mut root = Node::default();
        root.translation = Vector3::new(1.0, 0.0, 0.0);
        let root_id = scene.push_node(root, None);

        let mut mid = Node::default();
        mid.rotation = Quaternion::from_angle_z(Deg(90.0));
        let mid_id = scene.push_node(mid, Some(root_id));

        let mut leaf = Node::default();
        leaf.scale = Vector3::new(2.0, 2.0, 2.0);
        leaf.translation = Vector3::new(0.0, 3.0, 0.0);
        let leaf_id = scene.push_node(leaf, Some(mid_id));

        let expected = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))
            * Matrix4::from(Quaternion::from_angle_z(Deg(90.0)))
            * (Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0)) * Matrix4::from_scale(2.0));
        assert!(matrices_close(&scene.global_matrix(leaf_id), &expected));
    }

    #[test]
    fn push_node_wires_parent_and_children() {
        let mut scene = Scene::new();
        let root = scene.push_node(Node::default(), None);
        let child = scene.push_node(Node::default(), Some(root));
        assert_eq!(scene.roots, vec![root]);
        assert_eq!(scene.nodes[root].children, vec![child]);
        assert_eq!(scene.nodes[child].parent, Some(root));
    }
}
