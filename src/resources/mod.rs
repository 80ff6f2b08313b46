use std::fs;
use std::path::Path;

use crate::error::RenderError;

/**
 * This module contains all logic for loading scenes and textures from
 * external files.
 */
pub mod gltf;

pub use gltf::GltfImporter;

/// Reads a binary companion file (buffer or image) of an asset.
pub fn load_binary(path: impl AsRef<Path>) -> Result<Vec<u8>, RenderError> {
    Ok(fs::read(path)?)
}
