//! Error type shared across the crate.

use std::path::PathBuf;

/// Errors produced while importing scenes, compiling shaders or building
/// GPU resources.
///
/// Precondition violations (`MissingShaderProgram`, `MeshAlreadyUploaded`,
/// `EmptyMesh`) are fatal for the operation that raised them. I/O and parse
/// failures are recoverable at the call boundary: the importer rolls the
/// scene back to its empty state before returning them.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no shader program compiled for {0}")]
    MissingShaderProgram(&'static str),

    #[error("unsupported scene file extension: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("failed to parse glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("unsupported buffer source: {0}")]
    UnsupportedBufferSource(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("primitive in mesh {0:?} has no POSITION accessor")]
    MissingPositions(String),

    #[error("mesh {0:?} has already been uploaded to the GPU")]
    MeshAlreadyUploaded(String),

    #[error("mesh {0:?} has no vertex position data to upload")]
    EmptyMesh(String),

    #[error("empty {0} shader path")]
    EmptyShaderPath(&'static str),

    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader program linking failed: {log}")]
    ShaderLink { log: String },

    #[error("offscreen framebuffer is not complete")]
    FramebufferIncomplete,

    #[error("failed to allocate GL object: {0}")]
    GlAllocation(String),
}
