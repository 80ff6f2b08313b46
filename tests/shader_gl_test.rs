//! Shader compile/clear lifecycle against a live GL context.
#![cfg(feature = "integration-tests")]

mod common;

use glint::error::RenderError;
use glint::shader::Shader;
use glint::{Matrix4, SquareMatrix};

#[test]
fn shader_lifecycle() {
    let ctx = common::create_gl();
    let gl = &ctx.gl;

    // Empty paths are rejected and leave no program behind.
    let mut shader = Shader::new();
    let err = shader
        .compile(gl, "", "assets/shaders/coordinate.frag")
        .unwrap_err();
    assert!(matches!(err, RenderError::EmptyShaderPath("vertex")));
    assert!(shader.program().is_none());

    // Missing files surface as I/O errors, same contract.
    let err = shader
        .compile(gl, "no/such.vert", "no/such.frag")
        .unwrap_err();
    assert!(matches!(err, RenderError::Io(_)));
    assert!(shader.program().is_none());

    // A valid pair compiles to a usable program.
    shader
        .compile(
            gl,
            "assets/shaders/coordinate.vert",
            "assets/shaders/coordinate.frag",
        )
        .expect("coordinate shader compiles");
    assert!(shader.program().is_some());

    // Uniform setters against the bound program must not panic.
    shader.use_program(gl);
    shader.set_int(gl, "textureMap", 0);
    shader.set_mat4(gl, "mvp", &Matrix4::identity());

    // Recompiling replaces the old program.
    shader
        .compile(
            gl,
            "assets/shaders/coordinate.vert",
            "assets/shaders/coordinate.frag",
        )
        .expect("recompile succeeds");
    assert!(shader.program().is_some());

    // Clear resets the handle and is idempotent.
    shader.clear(gl);
    assert!(shader.program().is_none());
    shader.clear(gl);
    assert!(shader.program().is_none());
}
