//! Scene graph nodes.
//!
//! Nodes live in the owning [`Scene`](crate::data_structures::scene::Scene)'s
//! arena and refer to each other by index: `children` is the owning downward
//! edge, `parent` a weak upward index used only to compose global transforms.
//! This keeps the graph tree-shaped with single ownership and no reference
//! cycles.

use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};

use crate::data_structures::mesh::Mesh;

/// Index of a node in its scene's arena.
pub type NodeId = usize;

/// One element of the scene hierarchy.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    /// Index of this node in the source asset's flat node array.
    pub index: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mesh: Option<Mesh>,
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    /// Raw matrix override from the asset; identity when the node only
    /// carries a decomposed transform.
    pub matrix: Matrix4<f32>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            index: 0,
            parent: None,
            children: Vec::new(),
            mesh: None,
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            matrix: Matrix4::identity(),
        }
    }
}

impl Node {
    /// Local transform: translation * rotation * scale * matrix override.
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
            * self.matrix
    }

    /// Releases the GPU resources of the node's mesh, if any.
    pub fn clear(&mut self, gl: &glow::Context) {
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.clear(gl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3};

    fn matrices_close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = (*a).into();
        let b: [[f32; 4]; 4] = (*b).into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn local_matrix_composes_trs_in_order() {
        let mut node = Node::default();
        node.translation = Vector3::new(1.0, 2.0, 3.0);
        node.rotation = Quaternion::from_angle_y(Deg(90.0));
        node.scale = Vector3::new(2.0, 2.0, 2.0);

        let expected = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from(Quaternion::from_angle_y(Deg(90.0)))
            * Matrix4::from_scale(2.0);
        assert!(matrices_close(&node.local_matrix(), &expected));
    }

    #[test]
    fn matrix_override_participates_in_local_transform() {
        let mut node = Node::default();
        node.matrix = Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0));
        node.scale = Vector3::new(2.0, 2.0, 2.0);
        // Scale applies to the override: (0, 5, 0) scaled by 2 => (0, 10, 0).
        let m = node.local_matrix();
        assert!((m.w.y - 10.0).abs() < 1e-5);
    }
}
