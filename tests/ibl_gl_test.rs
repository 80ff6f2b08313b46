//! Environment precomputation passes against a live GL context.
#![cfg(feature = "integration-tests")]

mod common;

use glint::data_structures::RenderTexturesContainer;
use glint::error::RenderError;
use glint::ibl;

#[test]
fn ibl_passes() {
    let ctx = common::create_gl();
    let gl = &ctx.gl;

    // Clearing a container that never allocated anything must be a no-op.
    let mut empty = RenderTexturesContainer::new();
    empty.clear(gl);
    empty.clear(gl);

    // The BRDF pass requires its shader.
    let mut container = RenderTexturesContainer::new();
    let err = ibl::load_brdf_lut(gl, &mut container).unwrap_err();
    assert!(matches!(err, RenderError::MissingShaderProgram(_)));

    container
        .compile_shaders(
            gl,
            ("assets/shaders/eq2cubemap.vert", "assets/shaders/eq2cubemap.frag"),
            ("assets/shaders/brdf.vert", "assets/shaders/brdf.frag"),
            ("assets/shaders/envmap.vert", "assets/shaders/envmap.frag"),
        )
        .expect("ibl shaders compile");

    // Panorama to cubemap: staging texture is transient, faces persist.
    let panorama = common::write_panorama_fixture();
    ibl::load_from_hdr(gl, &mut container, &panorama).expect("cubemap pass");
    assert!(container.cube_map.is_some());
    assert!(container.hdr_texture.is_none());
    assert!(container.fbo.is_some());
    assert!(container.rbo.is_some());
    assert!(container.cube_vao.is_some());
    assert!(container.cube_vbo.is_some());
    assert_eq!(container.textures.len(), 1);

    // BRDF LUT renders once; the second call is a logged no-op.
    ibl::load_brdf_lut(gl, &mut container).expect("brdf pass");
    let lut = container.brdf_lut.expect("lut allocated");
    ibl::load_brdf_lut(gl, &mut container).expect("idempotent");
    assert_eq!(container.brdf_lut, Some(lut));
    assert!(container.quad_vao.is_some());

    // Clear releases every handle exactly once and can run twice.
    container.clear(gl);
    assert!(container.cube_map.is_none());
    assert!(container.brdf_lut.is_none());
    assert!(container.fbo.is_none());
    assert!(container.quad_vao.is_none());
    assert!(container.eq_to_cube_shader.program().is_none());
    container.clear(gl);
    assert!(container.cube_map.is_none());
}
