//! Environment-lighting precomputation.
//!
//! Offscreen multi-pass rendering that turns an equirectangular panorama into
//! the textures a PBR shader samples at render time: a cubemap built by
//! rasterizing a unit cube once per face with a 90-degree capture projection,
//! and a BRDF integration lookup texture rendered from a single full-screen
//! quad. All passes share one framebuffer/renderbuffer pair owned by the
//! [`RenderTexturesContainer`].
//!
//! No irradiance-map pass is implemented; the container keeps the slot so a
//! future pass can fill it.

use std::path::Path;

use cgmath::{perspective, Deg, Matrix4, Point3, Vector3};
use glow::HasContext;

use crate::data_structures::texture::{RenderTexturesContainer, Texture};
use crate::error::RenderError;
use crate::resources::gltf::{ATTRIB_POSITION, ATTRIB_TEX_COORDS};

/// Edge length of the cubemap faces and the BRDF lookup texture.
const TARGET_SIZE: i32 = 128;

/// Decodes a panorama image, uploads it as a staging 2D texture and renders
/// it into the six faces of the container's environment cubemap.
///
/// Preconditions: the container's equirectangular-to-cubemap shader must be
/// compiled, and the offscreen framebuffer must report complete status after
/// the depth renderbuffer is attached. Violations abort the pass and release
/// the container's resources. The staging texture is deleted once the six
/// faces are rendered; only its decode metadata is retained.
pub fn load_from_hdr(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
    path: impl AsRef<Path>,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let panorama = decoded.to_rgb8();
    let (width, height) = (panorama.width() as i32, panorama.height() as i32);
    let pixels = panorama.into_raw();

    if container.eq_to_cube_shader.program().is_none() {
        container.clear(gl);
        return Err(RenderError::MissingShaderProgram(
            "equirectangular-to-cubemap pass",
        ));
    }

    unsafe {
        // Staging texture holding the decoded panorama.
        let hdr = gl.create_texture().map_err(RenderError::GlAllocation)?;
        container.hdr_texture = Some(hdr);
        gl.bind_texture(glow::TEXTURE_2D, Some(hdr));
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGB8 as i32,
            width,
            height,
            0,
            glow::RGB,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&pixels)),
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );

        ensure_offscreen_target(gl, container)?;

        // Destination cubemap, one face per axis direction.
        let cube_map = gl.create_texture().map_err(RenderError::GlAllocation)?;
        container.cube_map = Some(cube_map);
        gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(cube_map));
        for face in 0..6 {
            gl.tex_image_2d(
                glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                0,
                glow::RGB8 as i32,
                TARGET_SIZE,
                TARGET_SIZE,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
        }
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_R,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );

        let projection = perspective(Deg(90.0), 1.0, 0.1, 10.0);
        let program = container
            .eq_to_cube_shader
            .program()
            .ok_or(RenderError::MissingShaderProgram(
                "equirectangular-to-cubemap pass",
            ))?;
        container.eq_to_cube_shader.use_program(gl);
        container.eq_to_cube_shader.set_int(gl, "equirectangularMap", 0);
        container
            .eq_to_cube_shader
            .set_mat4(gl, "projection", &projection);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_2D, Some(hdr));

        gl.viewport(0, 0, TARGET_SIZE, TARGET_SIZE);
        gl.bind_framebuffer(glow::FRAMEBUFFER, container.fbo);
        let views = capture_views();
        for (face, view) in views.iter().enumerate() {
            container.eq_to_cube_shader.set_mat4(gl, "view", view);
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_CUBE_MAP_POSITIVE_X + face as u32,
                Some(cube_map),
                0,
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            setup_cube(gl, container, program)?;
        }
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);

        // The panorama is a staging resource; drop it now that the faces exist.
        if let Some(hdr) = container.hdr_texture.take() {
            gl.delete_texture(hdr);
        }
    }

    container.textures.push(Texture {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        width,
        height,
        channels: 3,
        data: None,
        size_bytes: pixels.len(),
        id: None,
    });
    log::info!("environment cubemap built from {}", path.display());
    Ok(())
}

/// Renders the BRDF integration lookup into a two-channel texture.
///
/// Idempotent: if the LUT already exists the call logs and returns without
/// touching GPU state. Requires the container's BRDF shader to be compiled.
pub fn load_brdf_lut(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
) -> Result<(), RenderError> {
    if container.brdf_lut_shader.program().is_none() {
        return Err(RenderError::MissingShaderProgram("BRDF LUT pass"));
    }
    if container.brdf_lut.is_some() {
        log::info!("BRDF lookup texture has already been allocated");
        return Ok(());
    }

    unsafe {
        let lut = gl.create_texture().map_err(RenderError::GlAllocation)?;
        container.brdf_lut = Some(lut);
        gl.bind_texture(glow::TEXTURE_2D, Some(lut));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RG8 as i32,
            TARGET_SIZE,
            TARGET_SIZE,
            0,
            glow::RG,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(None),
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );

        ensure_offscreen_target(gl, container)?;
        gl.bind_framebuffer(glow::FRAMEBUFFER, container.fbo);
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(lut),
            0,
        );

        gl.viewport(0, 0, TARGET_SIZE, TARGET_SIZE);
        container.brdf_lut_shader.use_program(gl);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        let program = container
            .brdf_lut_shader
            .program()
            .ok_or(RenderError::MissingShaderProgram("BRDF LUT pass"))?;
        setup_quad(gl, container, program)?;
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    }
    log::info!("BRDF lookup texture allocated");
    Ok(())
}

/// Releases the container's resources.
pub fn clear(gl: &glow::Context, container: &mut RenderTexturesContainer) {
    container.clear(gl);
}

/// Allocates the shared framebuffer/renderbuffer pair if this is the first
/// pass, attaches the depth renderbuffer and verifies completeness. A failed
/// completeness check releases the container and aborts.
fn ensure_offscreen_target(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
) -> Result<(), RenderError> {
    unsafe {
        if container.fbo.is_none() && container.rbo.is_none() {
            container.fbo = Some(gl.create_framebuffer().map_err(RenderError::GlAllocation)?);
            container.rbo = Some(gl.create_renderbuffer().map_err(RenderError::GlAllocation)?);
        }
        gl.bind_framebuffer(glow::FRAMEBUFFER, container.fbo);
        gl.bind_renderbuffer(glow::RENDERBUFFER, container.rbo);
        gl.renderbuffer_storage(
            glow::RENDERBUFFER,
            glow::DEPTH_COMPONENT24,
            TARGET_SIZE,
            TARGET_SIZE,
        );
        gl.framebuffer_renderbuffer(
            glow::FRAMEBUFFER,
            glow::DEPTH_ATTACHMENT,
            glow::RENDERBUFFER,
            container.rbo,
        );
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        if status != glow::FRAMEBUFFER_COMPLETE
            && status != glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        {
            // Missing-attachment is expected here: the color target is bound
            // per face/pass right after this check.
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            container.clear(gl);
            return Err(RenderError::FramebufferIncomplete);
        }
    }
    Ok(())
}

/// Draws the unit cube, allocating its VAO/VBO pair on first use.
///
/// Allocation happens only when both handles are unset; later calls re-bind
/// and redraw, so running the six cubemap faces does not duplicate
/// resources. `program` supplies the position attribute location.
pub fn setup_cube(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
    program: glow::Program,
) -> Result<(), RenderError> {
    unsafe {
        if container.cube_vao.is_none() && container.cube_vbo.is_none() {
            let vao = gl.create_vertex_array().map_err(RenderError::GlAllocation)?;
            let vbo = gl.create_buffer().map_err(RenderError::GlAllocation)?;
            container.cube_vao = Some(vao);
            container.cube_vbo = Some(vbo);

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&CUBE_VERTICES),
                glow::STATIC_DRAW,
            );
            if let Some(location) = gl.get_attrib_location(program, ATTRIB_POSITION) {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, 3, glow::FLOAT, false, 3 * 4, 0);
            } else {
                log::warn!("cube pass program declares no {ATTRIB_POSITION} attribute");
            }
        }
        gl.bind_vertex_array(container.cube_vao);
        gl.draw_arrays(glow::TRIANGLES, 0, 36);
        gl.bind_vertex_array(None);
    }
    Ok(())
}

/// Draws the full-screen quad, allocating its VAO/VBO pair on first use.
/// Same idempotence contract as [`setup_cube`].
pub fn setup_quad(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
    program: glow::Program,
) -> Result<(), RenderError> {
    unsafe {
        if container.quad_vao.is_none() && container.quad_vbo.is_none() {
            let vao = gl.create_vertex_array().map_err(RenderError::GlAllocation)?;
            let vbo = gl.create_buffer().map_err(RenderError::GlAllocation)?;
            container.quad_vao = Some(vao);
            container.quad_vbo = Some(vbo);

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );
            let stride = 5 * 4;
            if let Some(location) = gl.get_attrib_location(program, ATTRIB_POSITION) {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, 3, glow::FLOAT, false, stride, 0);
            } else {
                log::warn!("quad pass program declares no {ATTRIB_POSITION} attribute");
            }
            if let Some(location) = gl.get_attrib_location(program, ATTRIB_TEX_COORDS) {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, 2, glow::FLOAT, false, stride, 3 * 4);
            } else {
                log::warn!("quad pass program declares no {ATTRIB_TEX_COORDS} attribute");
            }
        }
        gl.bind_vertex_array(container.quad_vao);
        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        gl.bind_vertex_array(None);
    }
    Ok(())
}

/// The six fixed look-at views used to capture each cubemap face, in
/// `POSITIVE_X .. NEGATIVE_Z` order.
fn capture_views() -> [Matrix4<f32>; 6] {
    let origin = Point3::new(0.0, 0.0, 0.0);
    let look = |target: Vector3<f32>, up: Vector3<f32>| {
        Matrix4::look_at_rh(origin, Point3::new(target.x, target.y, target.z), up)
    };
    [
        look(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
        look(Vector3::new(-1.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
        look(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, 1.0)),
        look(Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.0, 0.0, -1.0)),
        look(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, -1.0, 0.0)),
        look(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, -1.0, 0.0)),
    ]
}

/// 36 vertices of a unit cube, three floats each.
const CUBE_VERTICES: [f32; 108] = [
    -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, //
    1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, //
    -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, //
    -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, //
    1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, //
    -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, //
    -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, //
    1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, //
];

/// Full-screen quad as a triangle strip: position (3) + texcoord (2).
const QUAD_VERTICES: [f32; 20] = [
    -1.0, 1.0, 0.0, 0.0, 1.0, //
    -1.0, -1.0, 0.0, 0.0, 0.0, //
    1.0, 1.0, 0.0, 1.0, 1.0, //
    1.0, -1.0, 0.0, 1.0, 0.0, //
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_views_cover_all_six_axes() {
        let views = capture_views();
        assert_eq!(views.len(), 6);
        // Each view must be distinct; a duplicated look-at would render the
        // same face twice and leave another face empty.
        for i in 0..6 {
            for j in (i + 1)..6 {
                let a: [[f32; 4]; 4] = views[i].into();
                let b: [[f32; 4]; 4] = views[j].into();
                assert_ne!(a, b, "views {i} and {j} coincide");
            }
        }
    }

    #[test]
    fn cube_and_quad_geometry_have_expected_vertex_counts() {
        assert_eq!(CUBE_VERTICES.len(), 36 * 3);
        assert_eq!(QUAD_VERTICES.len(), 4 * 5);
    }
}
