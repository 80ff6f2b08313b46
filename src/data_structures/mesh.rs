//! Mesh geometry: flat CPU attribute arrays split into primitives, plus the
//! GPU buffer set once uploaded.

use cgmath::{Matrix4, SquareMatrix};
use glow::HasContext;

use crate::data_structures::aabb::Aabb;
use crate::data_structures::material::PbrMaterial;

/// GPU handles for one uploaded mesh: a vertex array object, one buffer per
/// attribute stream and the index buffer.
///
/// A mesh either has all of these or none of them; the `Option<MeshBuffers>`
/// on [`Mesh`] encodes that invariant.
#[derive(Clone, Copy, Debug)]
pub struct MeshBuffers {
    pub vao: glow::VertexArray,
    pub ebo: glow::Buffer,
    pub positions: glow::Buffer,
    pub normals: glow::Buffer,
    pub tex_coords: glow::Buffer,
}

/// A contiguous index range of a [`Mesh`] drawn with one material.
#[derive(Clone, Debug, Default)]
pub struct MeshPrimitive {
    pub name: String,
    /// Offset into the mesh's shared index array, in indices.
    pub first_index: u32,
    pub index_count: u32,
    pub vertex_count: u32,
    pub has_indices: bool,
    /// Declared for glTF skins; never set by the importer.
    pub has_skin: bool,
    pub material: PbrMaterial,
    /// Bounds as declared by the POSITION accessor's min/max, not recomputed
    /// from vertex data.
    pub aabb: Aabb,
}

/// A bucket of raw vertex attribute arrays shared by one or more primitives.
///
/// All primitives of a mesh append into the same flat arrays with a running
/// vertex offset, so their indices share one index space and one buffer set.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<MeshPrimitive>,
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Skinning attributes; declared but unused.
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub matrix: Matrix4<f32>,
    pub buffers: Option<MeshBuffers>,
    pub aabb: Aabb,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            primitives: Vec::new(),
            indices: Vec::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            joints: Vec::new(),
            weights: Vec::new(),
            matrix: Matrix4::identity(),
            buffers: None,
            aabb: Aabb::default(),
        }
    }
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Deletes the GPU buffer set, if uploaded. Idempotent; CPU attribute
    /// arrays are left untouched so the mesh can be re-uploaded.
    pub fn clear(&mut self, gl: &glow::Context) {
        if let Some(buffers) = self.buffers.take() {
            unsafe {
                gl.delete_buffer(buffers.ebo);
                gl.delete_buffer(buffers.positions);
                gl.delete_buffer(buffers.normals);
                gl.delete_buffer(buffers.tex_coords);
                gl.delete_vertex_array(buffers.vao);
            }
        }
    }
}
