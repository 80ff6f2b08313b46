//! GLSL shader program wrapper.
//!
//! Compiles a vertex/fragment pair from source files into one program and
//! exposes string-keyed uniform setters. Setters assume [`Shader::use_program`]
//! has been called; they are side-effecting calls against the bound program
//! and have no return value. The program handle is the bind target other
//! components use to query vertex-attribute locations.

use std::fs;
use std::path::Path;

use cgmath::{Matrix2, Matrix3, Matrix4};
use glow::HasContext;

use crate::error::RenderError;

#[derive(Debug, Default)]
pub struct Shader {
    program: Option<glow::Program>,
}

impl Shader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The linked program handle, if a compile succeeded.
    pub fn program(&self) -> Option<glow::Program> {
        self.program
    }

    /// Reads the vertex and fragment sources from disk.
    ///
    /// Split out of [`compile`](Self::compile) so path validation and I/O
    /// failures surface before any GL object is created.
    pub fn read_sources(
        vs_path: impl AsRef<Path>,
        fs_path: impl AsRef<Path>,
    ) -> Result<(String, String), RenderError> {
        let (vs_path, fs_path) = (vs_path.as_ref(), fs_path.as_ref());
        if vs_path.as_os_str().is_empty() {
            return Err(RenderError::EmptyShaderPath("vertex"));
        }
        if fs_path.as_os_str().is_empty() {
            return Err(RenderError::EmptyShaderPath("fragment"));
        }
        Ok((fs::read_to_string(vs_path)?, fs::read_to_string(fs_path)?))
    }

    /// Compiles and links the program from two source files, replacing any
    /// previously held program (the old one is deleted first).
    ///
    /// On any failure — empty path, missing file, compile error, link error —
    /// the returned error carries the driver's info log and the shader is
    /// left with no program.
    pub fn compile(
        &mut self,
        gl: &glow::Context,
        vs_path: impl AsRef<Path>,
        fs_path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        self.clear(gl);

        let (vs_source, fs_source) = Self::read_sources(vs_path, fs_path)?;
        let vs = compile_stage(gl, glow::VERTEX_SHADER, "vertex", &vs_source)?;
        let fs = match compile_stage(gl, glow::FRAGMENT_SHADER, "fragment", &fs_source) {
            Ok(fs) => fs,
            Err(err) => {
                unsafe { gl.delete_shader(vs) };
                return Err(err);
            }
        };

        unsafe {
            let program = match gl.create_program() {
                Ok(program) => program,
                Err(log) => {
                    gl.delete_shader(vs);
                    gl.delete_shader(fs);
                    return Err(RenderError::GlAllocation(log));
                }
            };
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            let log = gl.get_program_info_log(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            if !linked {
                gl.delete_program(program);
                return Err(RenderError::ShaderLink { log });
            }
            self.program = Some(program);
        }
        Ok(())
    }

    /// Deletes the program if present and resets the handle. Idempotent.
    pub fn clear(&mut self, gl: &glow::Context) {
        if let Some(program) = self.program.take() {
            unsafe { gl.delete_program(program) };
        }
    }

    /// Binds the program for subsequent draw and uniform calls.
    pub fn use_program(&self, gl: &glow::Context) {
        unsafe { gl.use_program(self.program) };
    }

    pub fn set_bool(&self, gl: &glow::Context, name: &str, value: bool) {
        self.set_int(gl, name, value as i32);
    }

    pub fn set_int(&self, gl: &glow::Context, name: &str, value: i32) {
        if let Some(program) = self.program {
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_1_i32(loc.as_ref(), value);
            }
        }
    }

    pub fn set_float(&self, gl: &glow::Context, name: &str, value: f32) {
        if let Some(program) = self.program {
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_1_f32(loc.as_ref(), value);
            }
        }
    }

    pub fn set_vec2(&self, gl: &glow::Context, name: &str, value: impl Into<[f32; 2]>) {
        if let Some(program) = self.program {
            let v = value.into();
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_2_f32(loc.as_ref(), v[0], v[1]);
            }
        }
    }

    pub fn set_vec3(&self, gl: &glow::Context, name: &str, value: impl Into<[f32; 3]>) {
        if let Some(program) = self.program {
            let v = value.into();
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_3_f32(loc.as_ref(), v[0], v[1], v[2]);
            }
        }
    }

    pub fn set_vec4(&self, gl: &glow::Context, name: &str, value: impl Into<[f32; 4]>) {
        if let Some(program) = self.program {
            let v = value.into();
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_4_f32(loc.as_ref(), v[0], v[1], v[2], v[3]);
            }
        }
    }

    pub fn set_mat2(&self, gl: &glow::Context, name: &str, value: &Matrix2<f32>) {
        if let Some(program) = self.program {
            let cols: [[f32; 2]; 2] = (*value).into();
            let flat: [f32; 4] = bytemuck::cast(cols);
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_matrix_2_f32_slice(loc.as_ref(), false, &flat);
            }
        }
    }

    pub fn set_mat3(&self, gl: &glow::Context, name: &str, value: &Matrix3<f32>) {
        if let Some(program) = self.program {
            let cols: [[f32; 3]; 3] = (*value).into();
            let flat: [f32; 9] = bytemuck::cast(cols);
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_matrix_3_f32_slice(loc.as_ref(), false, &flat);
            }
        }
    }

    pub fn set_mat4(&self, gl: &glow::Context, name: &str, value: &Matrix4<f32>) {
        if let Some(program) = self.program {
            let cols: [[f32; 4]; 4] = (*value).into();
            let flat: [f32; 16] = bytemuck::cast(cols);
            unsafe {
                let loc = gl.get_uniform_location(program, name);
                gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &flat);
            }
        }
    }
}

fn compile_stage(
    gl: &glow::Context,
    stage: u32,
    stage_name: &'static str,
    source: &str,
) -> Result<glow::Shader, RenderError> {
    unsafe {
        let shader = gl
            .create_shader(stage)
            .map_err(RenderError::GlAllocation)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(RenderError::ShaderCompile {
                stage: stage_name,
                log,
            });
        }
        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paths_are_rejected_before_touching_gl() {
        match Shader::read_sources("", "assets/shaders/pbr.frag") {
            Err(RenderError::EmptyShaderPath("vertex")) => {}
            other => panic!("unexpected: {other:?}"),
        }
        match Shader::read_sources("assets/shaders/pbr.vert", "") {
            Err(RenderError::EmptyShaderPath("fragment")) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_files_surface_as_io_errors() {
        let result = Shader::read_sources("no/such/shader.vert", "no/such/shader.frag");
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn fresh_shader_has_no_program() {
        assert!(Shader::new().program().is_none());
    }
}
