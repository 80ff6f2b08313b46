/**
 * Engine data model: scenes, nodes, meshes, materials, textures and bounds.
 *
 * These are plain data holders with explicit `clear` lifecycle methods; the
 * only external dependency is the GL context used to delete leased GPU
 * handles.
 */
pub mod aabb;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod texture;

pub use aabb::Aabb;
pub use material::{AlphaMode, ChannelFactors, MaterialChannel, PbrMaterial};
pub use mesh::{Mesh, MeshBuffers, MeshPrimitive};
pub use node::{Node, NodeId};
pub use scene::Scene;
pub use texture::{RenderTexturesContainer, Texture};
