//! glint
//!
//! A compact OpenGL rendering toy built around a glTF scene importer. The
//! crate parses `.gltf`/`.glb` assets into a CPU-side scene graph, uploads
//! geometry and textures to the GPU, precomputes image-based-lighting
//! textures from a panorama and draws PBR-shaded meshes. It never creates a
//! GL context itself: every GPU-touching operation takes an explicit
//! `&glow::Context`, so correctness does not depend on hidden global state,
//! and any windowing layer (the demos use SDL2) can drive it.
//!
//! High-level modules
//! - `data_structures`: the scene data model (scenes, nodes, meshes,
//!   materials, textures, bounds) with explicit `clear` lifecycles
//! - `resources`: the glTF importer and asset file helpers
//! - `ibl`: offscreen passes building environment lighting textures
//! - `shader`: GLSL program compilation and uniform setters
//! - `render`: forward draw over the linearized node list
//!
//! GPU handles are owned by the data-model value that created them and are
//! only released through that value's `clear` method; dropping a loaded
//! [`Scene`](data_structures::Scene) without clearing it leaks video memory.

pub mod data_structures;
pub mod error;
pub mod ibl;
pub mod render;
pub mod resources;
pub mod shader;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use data_structures::{
    Aabb, AlphaMode, ChannelFactors, MaterialChannel, Mesh, MeshBuffers, MeshPrimitive, Node,
    NodeId, PbrMaterial, RenderTexturesContainer, Scene, Texture,
};
pub use error::RenderError;
pub use resources::GltfImporter;
pub use shader::Shader;
