//! CPU/GPU texture pairs and the render-texture container used by the
//! image-based-lighting pipeline.
//!
//! A [`Texture`] owns its decoded pixels only until they are uploaded; the
//! CPU copy is dropped the moment the GPU handle exists so that loading many
//! assets does not grow resident memory. GPU handles are leased from the GL
//! context and must be released through `clear` before the value is dropped,
//! otherwise they leak in video memory.

use std::path::PathBuf;

use glow::HasContext;

use crate::shader::Shader;

/// A 2D texture: decode metadata, a transient CPU pixel buffer and the GPU
/// handle once uploaded.
///
/// Invariant: `data` is `None` whenever `id` is `Some`. Upload consumes the
/// CPU buffer.
#[derive(Clone, Debug, Default)]
pub struct Texture {
    pub name: String,
    pub path: PathBuf,
    pub width: i32,
    pub height: i32,
    /// Number of color channels in the decoded image (1, 3 or 4).
    pub channels: i32,
    pub data: Option<Vec<u8>>,
    pub size_bytes: usize,
    pub id: Option<glow::Texture>,
}

impl Texture {
    /// Releases the GPU texture (if any) and drops any CPU pixels.
    /// Idempotent.
    pub fn clear(&mut self, gl: &glow::Context) {
        if let Some(id) = self.id.take() {
            unsafe { gl.delete_texture(id) };
        }
        self.data = None;
        self.size_bytes = 0;
    }
}

/// GPU state for environment-lighting precomputation.
///
/// Groups the cubemap targets, the shared offscreen framebuffer/renderbuffer
/// pair, the unit-cube and screen-quad geometry and the three shader programs
/// the passes use. Constructed empty (all handles unset); the shaders are
/// compiled separately via [`RenderTexturesContainer::compile_shaders`] or by
/// the caller before running a pass.
#[derive(Default)]
pub struct RenderTexturesContainer {
    pub cube_map: Option<glow::Texture>,
    pub irradiance_map: Option<glow::Texture>,
    pub brdf_lut: Option<glow::Texture>,
    /// Staging texture for the decoded panorama; deleted once the cubemap
    /// faces have been rendered.
    pub hdr_texture: Option<glow::Texture>,
    pub fbo: Option<glow::Framebuffer>,
    pub rbo: Option<glow::Renderbuffer>,
    pub cube_vao: Option<glow::VertexArray>,
    pub cube_vbo: Option<glow::Buffer>,
    pub quad_vao: Option<glow::VertexArray>,
    pub quad_vbo: Option<glow::Buffer>,
    /// Metadata of the source images consumed so far (a single panorama, or
    /// several cubemap faces).
    pub textures: Vec<Texture>,
    pub eq_to_cube_shader: Shader,
    pub brdf_lut_shader: Shader,
    pub env_map_shader: Shader,
}

impl RenderTexturesContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the three pass programs from `(vertex, fragment)` path pairs.
    pub fn compile_shaders(
        &mut self,
        gl: &glow::Context,
        eq_to_cube: (&str, &str),
        brdf_lut: (&str, &str),
        env_map: (&str, &str),
    ) -> Result<(), crate::error::RenderError> {
        self.eq_to_cube_shader.compile(gl, eq_to_cube.0, eq_to_cube.1)?;
        self.brdf_lut_shader.compile(gl, brdf_lut.0, brdf_lut.1)?;
        self.env_map_shader.compile(gl, env_map.0, env_map.1)?;
        Ok(())
    }

    /// Deletes every allocated handle exactly once and clears the shaders.
    ///
    /// Safe to call on a container that never allocated anything, and safe to
    /// call twice: handles are taken out before deletion.
    pub fn clear(&mut self, gl: &glow::Context) {
        unsafe {
            if let Some(id) = self.cube_map.take() {
                gl.delete_texture(id);
            }
            if let Some(id) = self.irradiance_map.take() {
                gl.delete_texture(id);
            }
            if let Some(id) = self.brdf_lut.take() {
                gl.delete_texture(id);
            }
            if let Some(id) = self.hdr_texture.take() {
                gl.delete_texture(id);
            }
            if let Some(id) = self.fbo.take() {
                gl.delete_framebuffer(id);
            }
            if let Some(id) = self.rbo.take() {
                gl.delete_renderbuffer(id);
            }
            if let Some(id) = self.cube_vao.take() {
                gl.delete_vertex_array(id);
            }
            if let Some(id) = self.cube_vbo.take() {
                gl.delete_buffer(id);
            }
            if let Some(id) = self.quad_vao.take() {
                gl.delete_vertex_array(id);
            }
            if let Some(id) = self.quad_vbo.take() {
                gl.delete_buffer(id);
            }
        }
        for texture in &mut self.textures {
            texture.clear(gl);
        }
        self.textures.clear();
        self.eq_to_cube_shader.clear(gl);
        self.brdf_lut_shader.clear(gl);
        self.env_map_shader.clear(gl);
    }
}
