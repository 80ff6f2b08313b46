//! Full importer round trip against a live GL context: load, GPU upload,
//! rollback on failure and the clear lifecycle.
#![cfg(feature = "integration-tests")]

mod common;

use glint::data_structures::Scene;
use glint::error::RenderError;
use glint::resources::gltf::{setup_mesh, GltfImporter};

#[test]
fn importer_round_trip() {
    let ctx = common::create_gl();
    let gl = &ctx.gl;
    let importer = GltfImporter::new();

    // Loading without a compiled shader is a precondition violation.
    let mut scene = Scene::new();
    let err = importer
        .load(gl, &mut scene, "tests/fixtures/triangle.gltf")
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingShaderProgram(_)));

    // A failed load rolls the scene back to the empty state.
    scene
        .shader
        .compile(gl, "assets/shaders/pbr.vert", "assets/shaders/pbr.frag")
        .expect("pbr shader compiles");
    let err = importer
        .load(gl, &mut scene, "no/such/scene.gltf")
        .unwrap_err();
    assert!(matches!(err, RenderError::Gltf(_)));
    assert!(scene.path.as_os_str().is_empty());
    assert!(scene.roots.is_empty());
    assert!(scene.nodes.is_empty());
    assert!(scene.textures.is_empty());

    // Unsupported extensions are rejected by policy, with the same rollback.
    scene
        .shader
        .compile(gl, "assets/shaders/pbr.vert", "assets/shaders/pbr.frag")
        .expect("pbr shader compiles");
    let err = importer.load(gl, &mut scene, "model.obj").unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedExtension(_)));
    assert!(scene.path.as_os_str().is_empty());

    // A valid single-node asset with one texture loads completely.
    let fixture = common::write_textured_fixture();
    scene
        .shader
        .compile(gl, "assets/shaders/pbr.vert", "assets/shaders/pbr.frag")
        .expect("pbr shader compiles");
    importer
        .load(gl, &mut scene, &fixture)
        .expect("fixture loads");

    assert_eq!(scene.path, fixture);
    assert_eq!(scene.textures.len(), 1);
    assert_eq!(scene.roots.len(), 1);
    assert_eq!(scene.linear_nodes.len(), 1);
    let texture = scene.textures.get("base.png").expect("texture keyed by URI");
    assert!(texture.id.is_some());
    assert!(texture.data.is_none());

    let root = &scene.nodes[scene.roots[0]];
    let mesh = root.mesh.as_ref().expect("root node carries a mesh");
    assert!(mesh.buffers.is_some());
    assert_eq!(mesh.primitives.len(), 1);
    let primitive = &mesh.primitives[0];
    assert_eq!(primitive.first_index, 0);
    assert_eq!(primitive.index_count, 3);
    assert!(primitive.material.base_color.texture.is_some());
    assert!(!scene.aabb.is_empty());

    // Re-uploading an already uploaded mesh must fail.
    let program = scene.shader.program().expect("program present");
    let mesh = scene.nodes[0].mesh.as_mut().unwrap();
    let err = setup_mesh(gl, mesh, program).unwrap_err();
    assert!(matches!(err, RenderError::MeshAlreadyUploaded(_)));

    // Clear resets everything and is idempotent.
    scene.clear(gl);
    assert!(scene.path.as_os_str().is_empty());
    assert!(scene.nodes.is_empty());
    assert!(scene.textures.is_empty());
    assert!(scene.materials.is_empty());
    assert!(scene.shader.program().is_none());
    scene.clear(gl);
    assert!(scene.nodes.is_empty());
}
