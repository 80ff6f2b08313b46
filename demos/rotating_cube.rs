//! Rotating textured cube demo.
//!
//! Builds a hardcoded cube mesh, uploads it through the engine's mesh setup
//! path, textures it with a procedurally generated checkerboard and spins it.

use std::time::Instant;

use anyhow::anyhow;
use glint::data_structures::{Mesh, MeshPrimitive};
use glint::resources::gltf::setup_mesh;
use glint::shader::Shader;
use glint::{perspective, Deg, Matrix4, Point3, Vector3};
use glow::HasContext;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::video::GLProfile;

const WINDOW_SIZE: u32 = 1000;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let sdl = sdl2::init().map_err(|e| anyhow!(e))?;
    let video = sdl.video().map_err(|e| anyhow!(e))?;
    let gl_attr = video.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(3, 3);
    gl_attr.set_depth_size(24);

    let window = video
        .window("rotating-textured-cube", WINDOW_SIZE, WINDOW_SIZE)
        .opengl()
        .position_centered()
        .resizable()
        .build()?;
    let _gl_context = window.gl_create_context().map_err(|e| anyhow!(e))?;
    let gl =
        unsafe { glow::Context::from_loader_function(|s| video.gl_get_proc_address(s) as *const _) };

    unsafe {
        gl.enable(glow::DEPTH_TEST);
    }

    let mut shader = Shader::new();
    shader.compile(
        &gl,
        "assets/shaders/coordinate.vert",
        "assets/shaders/coordinate.frag",
    )?;
    let program = shader
        .program()
        .ok_or_else(|| anyhow!("shader program missing after compile"))?;

    let mut mesh = cube_mesh();
    setup_mesh(&gl, &mut mesh, program)?;
    let checker = checker_texture(&gl).map_err(|e| anyhow!(e))?;

    let mut event_pump = sdl.event_pump().map_err(|e| anyhow!(e))?;
    let started = Instant::now();
    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(width, height),
                    ..
                } => unsafe {
                    gl.viewport(0, 0, width, height);
                },
                _ => {}
            }
        }

        let elapsed = started.elapsed().as_secs_f32();
        let (width, height) = window.drawable_size();
        let projection = perspective(Deg(45.0), width as f32 / height as f32, 0.1, 100.0);
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 1.5, 3.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let model = Matrix4::from_angle_y(Deg(elapsed * 50.0)) * Matrix4::from_angle_x(Deg(20.0));
        let mvp = projection * view * model;

        unsafe {
            gl.clear_color(0.1, 0.1, 0.12, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        shader.use_program(&gl);
        shader.set_mat4(&gl, "mvp", &mvp);
        shader.set_int(&gl, "textureMap", 0);
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(checker));
            let buffers = mesh.buffers.expect("mesh was uploaded");
            gl.bind_vertex_array(Some(buffers.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, mesh.primitives[0].vertex_count as i32);
            gl.bind_vertex_array(None);
        }
        window.gl_swap_window();
    }

    mesh.clear(&gl);
    shader.clear(&gl);
    unsafe { gl.delete_texture(checker) };
    Ok(())
}

fn cube_mesh() -> Mesh {
    let positions: [[f32; 3]; 36] = [
        [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5],
        [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5],
        [-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, -0.5, 0.5],
        [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5],
        [-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5],
        [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5],
        [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5],
    ];
    let face_uvs: [[f32; 2]; 6] = [
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0],
        [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
    ];

    let mut mesh = Mesh::new("cube");
    mesh.positions = positions.to_vec();
    mesh.tex_coords = (0..36).map(|i| face_uvs[i % 6]).collect();
    mesh.normals = vec![[0.0, 0.0, 0.0]; 36];
    mesh.primitives.push(MeshPrimitive {
        vertex_count: 36,
        ..MeshPrimitive::default()
    });
    mesh
}

/// Generates an 8x8 checkerboard, 64x64 pixels, and uploads it.
fn checker_texture(gl: &glow::Context) -> Result<glow::Texture, String> {
    const SIZE: usize = 64;
    const CELL: usize = 8;
    let mut pixels = Vec::with_capacity(SIZE * SIZE * 4);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let on = ((x / CELL) + (y / CELL)) % 2 == 0;
            let value = if on { 230u8 } else { 40u8 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    unsafe {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            SIZE as i32,
            SIZE as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&pixels)),
        );
        gl.generate_mipmap(glow::TEXTURE_2D);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR_MIPMAP_LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::NEAREST as i32,
        );
        Ok(texture)
    }
}
