//! glTF viewer demo.
//!
//! Usage: `viewer <scene.gltf|scene.glb> [panorama image]`
//!
//! Loads the scene with the PBR shader, orbits the camera around its bounds
//! and, when a panorama is given, precomputes the environment cubemap and
//! BRDF lookup and draws the environment as a skybox.

use std::time::Instant;

use anyhow::{anyhow, Context as _};
use glint::data_structures::{RenderTexturesContainer, Scene};
use glint::render::draw_scene;
use glint::resources::GltfImporter;
use glint::{ibl, perspective, Deg, Matrix4, Point3, Vector3};
use glow::HasContext;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::video::GLProfile;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let scene_path = args
        .next()
        .context("usage: viewer <scene.gltf|scene.glb> [panorama image]")?;
    let panorama_path = args.next();

    let sdl = sdl2::init().map_err(|e| anyhow!(e))?;
    let video = sdl.video().map_err(|e| anyhow!(e))?;
    let gl_attr = video.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(3, 3);
    gl_attr.set_depth_size(24);

    let window = video
        .window("opengl-viewer", 1000, 1000)
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

    let importer = GltfImporter::new();
    let mut scene = Scene::new();
    scene
        .shader
        .compile(&gl, "assets/shaders/pbr.vert", "assets/shaders/pbr.frag")?;
    importer
        .load(&gl, &mut scene, &scene_path)
        .with_context(|| format!("loading {scene_path}"))?;
    log::info!(
        "loaded {} ({} nodes, {} materials, {} textures)",
        scene_path,
        scene.nodes.len(),
        scene.materials.len(),
        scene.textures.len()
    );

    let mut container = RenderTexturesContainer::new();
    if let Some(panorama) = &panorama_path {
        container.compile_shaders(
            &gl,
            ("assets/shaders/eq2cubemap.vert", "assets/shaders/eq2cubemap.frag"),
            ("assets/shaders/brdf.vert", "assets/shaders/brdf.frag"),
            ("assets/shaders/envmap.vert", "assets/shaders/envmap.frag"),
        )?;
        ibl::load_from_hdr(&gl, &mut container, panorama)?;
        ibl::load_brdf_lut(&gl, &mut container)?;
        // The IBL passes shrink the viewport to their render targets.
        let (width, height) = window.drawable_size();
        unsafe { gl.viewport(0, 0, width as i32, height as i32) };
    }

    // Frame the whole scene: orbit around its bounds.
    let center = if scene.aabb.is_empty() {
        Vector3::new(0.0, 0.0, 0.0)
    } else {
        scene.aabb.center
    };
    let mut distance = if scene.aabb.is_empty() {
        3.0
    } else {
        scene.aabb.scale.max(0.01) * 2.0
    };

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
                Event::MouseWheel { y, .. } => {
                    distance = (distance * (1.0 - y as f32 * 0.1)).max(0.05);
                }
                _ => {}
            }
        }

        let angle = started.elapsed().as_secs_f32() * 0.4;
        let eye = Point3::new(
            center.x + distance * angle.cos(),
            center.y + distance * 0.4,
            center.z + distance * angle.sin(),
        );
        let target = Point3::new(center.x, center.y, center.z);
        let (width, height) = window.drawable_size();
        let projection = perspective(Deg(45.0), width as f32 / height as f32, 0.01, 1000.0);
        let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
        let view_projection = projection * view;

        unsafe {
            gl.clear_color(0.05, 0.05, 0.07, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        scene.shader.use_program(&gl);
        scene
            .shader
            .set_vec3(&gl, "cameraPosition", [eye.x, eye.y, eye.z]);
        scene
            .shader
            .set_vec3(&gl, "lightDirection", [-0.4, -1.0, -0.3]);
        scene.shader.set_vec3(&gl, "lightColor", [3.0, 3.0, 3.0]);
        draw_scene(&gl, &scene, &view_projection);

        if container.cube_map.is_some() {
            draw_environment(&gl, &mut container, &projection, &view)?;
        }

        window.gl_swap_window();
    }

    importer.clear(&gl, &mut scene);
    container.clear(&gl);
    Ok(())
}

/// Draws the precomputed environment cubemap as a skybox behind the scene.
fn draw_environment(
    gl: &glow::Context,
    container: &mut RenderTexturesContainer,
    projection: &Matrix4<f32>,
    view: &Matrix4<f32>,
) -> anyhow::Result<()> {
    let program = container
        .env_map_shader
        .program()
        .ok_or_else(|| anyhow!("environment shader not compiled"))?;
    container.env_map_shader.use_program(gl);
    container.env_map_shader.set_mat4(gl, "projection", projection);
    container.env_map_shader.set_mat4(gl, "view", view);
    container.env_map_shader.set_int(gl, "environmentMap", 0);
    unsafe {
        gl.depth_func(glow::LEQUAL);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_CUBE_MAP, container.cube_map);
    }
    ibl::setup_cube(gl, container, program)?;
    unsafe {
        gl.depth_func(glow::LESS);
    }
    Ok(())
}
