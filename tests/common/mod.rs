//! Shared helpers for tests that need a live OpenGL context.
//!
//! Each integration-test binary creates exactly one hidden SDL window and
//! keeps the subsystem handles alive for the duration of its single test
//! function, so GL state never crosses threads.
#![cfg(feature = "integration-tests")]

use std::path::PathBuf;

use sdl2::video::GLProfile;

pub struct GlTest {
    // Held so the context and window outlive the glow wrapper.
    _sdl: sdl2::Sdl,
    _video: sdl2::VideoSubsystem,
    _window: sdl2::video::Window,
    _gl_context: sdl2::video::GLContext,
    pub gl: glow::Context,
}

pub fn create_gl() -> GlTest {
    let _ = env_logger::builder().is_test(true).try_init();

    let sdl = sdl2::init().expect("sdl init");
    let video = sdl.video().expect("sdl video subsystem");
    let gl_attr = video.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(3, 3);
    gl_attr.set_depth_size(24);

    let window = video
        .window("glint-test", 256, 256)
        .opengl()
        .hidden()
        .build()
        .expect("test window");
    let gl_context = window.gl_create_context().expect("gl context");
    window.gl_make_current(&gl_context).expect("make current");
    let gl =
        unsafe { glow::Context::from_loader_function(|s| video.gl_get_proc_address(s) as *const _) };

    GlTest {
        _sdl: sdl,
        _video: video,
        _window: window,
        _gl_context: gl_context,
        gl,
    }
}

/// Writes a self-contained textured asset (gltf + bin + png) into a fresh
/// temp directory and returns the `.gltf` path.
pub fn write_textured_fixture() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glint-fixture-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("fixture dir");

    // 4x4 solid orange base color texture.
    let mut png = image::RgbaImage::new(4, 4);
    for pixel in png.pixels_mut() {
        *pixel = image::Rgba([255, 128, 0, 255]);
    }
    png.save(dir.join("base.png")).expect("write png");

    // One triangle: positions, normals, uvs, u16 indices.
    let mut bin: Vec<u8> = Vec::new();
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
    let uvs: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    for v in positions.iter().flatten().chain(normals.iter().flatten()) {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    for v in uvs.iter().flatten() {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    std::fs::write(dir.join("triangle.bin"), &bin).expect("write bin");

    let gltf = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "solo", "mesh": 0 }],
  "meshes": [{
    "primitives": [{
      "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 },
      "indices": 3,
      "material": 0,
      "mode": 4
    }]
  }],
  "materials": [{
    "name": "orange",
    "pbrMetallicRoughness": {
      "baseColorTexture": { "index": 0 },
      "metallicFactor": 0.0,
      "roughnessFactor": 0.8
    },
    "alphaMode": "OPAQUE"
  }],
  "textures": [{ "source": 0 }],
  "images": [{ "uri": "base.png" }],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
    { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
    { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 72, "byteLength": 24 },
    { "buffer": 0, "byteOffset": 96, "byteLength": 6 }
  ],
  "buffers": [{ "uri": "triangle.bin", "byteLength": 102 }]
}"#;
    let path = dir.join("triangle.gltf");
    std::fs::write(&path, gltf).expect("write gltf");
    path
}

/// Writes a small panorama image usable as an environment source.
pub fn write_panorama_fixture() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glint-panorama-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("fixture dir");
    let mut png = image::RgbImage::new(16, 8);
    for (x, _y, pixel) in png.enumerate_pixels_mut() {
        let v = (x * 16) as u8;
        *pixel = image::Rgb([v, 64, 255 - v]);
    }
    let path = dir.join("panorama.png");
    png.save(&path).expect("write panorama");
    path
}
