//! Forward rendering of a loaded scene.
//!
//! Iterates the scene's linearized node list, computes each node's global
//! transform and issues one draw call per mesh primitive with that
//! primitive's material bound. The scene's shader is expected to follow the
//! uniform naming used by `assets/shaders/pbr.*`.

use cgmath::Matrix4;
use glow::HasContext;

use crate::data_structures::{AlphaMode, MaterialChannel, PbrMaterial, Scene};

/// Texture units the material channels are bound to, in the order the PBR
/// fragment shader declares its samplers.
const UNIT_BASE_COLOR: u32 = 0;
const UNIT_METALLIC_ROUGHNESS: u32 = 1;
const UNIT_NORMAL: u32 = 2;
const UNIT_OCCLUSION: u32 = 3;
const UNIT_EMISSIVE: u32 = 4;

/// Draws every mesh of the scene with its shader.
///
/// `view_projection` is combined with each node's global matrix into the
/// per-draw `mvp` uniform; the global matrix alone is passed as `model`.
/// Assumes the scene's linear node list is current (the importer rebuilds it
/// after a load).
pub fn draw_scene(gl: &glow::Context, scene: &Scene, view_projection: &Matrix4<f32>) {
    scene.shader.use_program(gl);
    for &id in &scene.linear_nodes {
        let Some(mesh) = scene.nodes[id].mesh.as_ref() else {
            continue;
        };
        let Some(buffers) = mesh.buffers else {
            continue;
        };
        let global = scene.global_matrix(id);
        let mvp = view_projection * global;
        scene.shader.set_mat4(gl, "mvp", &mvp);
        scene.shader.set_mat4(gl, "model", &global);

        unsafe {
            gl.bind_vertex_array(Some(buffers.vao));
        }
        for primitive in &mesh.primitives {
            bind_material(gl, scene, &primitive.material);
            unsafe {
                if primitive.has_indices {
                    gl.draw_elements(
                        glow::TRIANGLES,
                        primitive.index_count as i32,
                        glow::UNSIGNED_INT,
                        (primitive.first_index * 4) as i32,
                    );
                } else {
                    gl.draw_arrays(glow::TRIANGLES, 0, primitive.vertex_count as i32);
                }
            }
        }
        unsafe {
            gl.bind_vertex_array(None);
        }
    }
}

fn bind_material(gl: &glow::Context, scene: &Scene, material: &PbrMaterial) {
    let shader = &scene.shader;

    bind_channel(gl, UNIT_BASE_COLOR, &material.base_color);
    bind_channel(gl, UNIT_METALLIC_ROUGHNESS, &material.metallic_roughness);
    bind_channel(gl, UNIT_NORMAL, &material.normal);
    bind_channel(gl, UNIT_OCCLUSION, &material.occlusion);
    bind_channel(gl, UNIT_EMISSIVE, &material.emissive);

    shader.set_int(gl, "baseColorMap", UNIT_BASE_COLOR as i32);
    shader.set_int(gl, "metallicRoughnessMap", UNIT_METALLIC_ROUGHNESS as i32);
    shader.set_int(gl, "normalMap", UNIT_NORMAL as i32);
    shader.set_int(gl, "occlusionMap", UNIT_OCCLUSION as i32);
    shader.set_int(gl, "emissiveMap", UNIT_EMISSIVE as i32);

    shader.set_bool(gl, "hasBaseColorMap", material.base_color.texture.is_some());
    shader.set_bool(
        gl,
        "hasMetallicRoughnessMap",
        material.metallic_roughness.texture.is_some(),
    );
    shader.set_bool(gl, "hasNormalMap", material.normal.texture.is_some());
    shader.set_bool(gl, "hasOcclusionMap", material.occlusion.texture.is_some());
    shader.set_bool(gl, "hasEmissiveMap", material.emissive.texture.is_some());

    shader.set_vec4(gl, "baseColorFactor", material.base_color_factor());
    let (metallic, roughness) = material.metallic_roughness_factors();
    shader.set_float(gl, "metallicFactor", metallic);
    shader.set_float(gl, "roughnessFactor", roughness);
    shader.set_float(gl, "normalScale", material.normal_scale());
    shader.set_float(gl, "occlusionStrength", material.occlusion_strength());
    shader.set_vec3(gl, "emissiveFactor", material.emissive_factor());

    let mask_cutoff = match material.alpha_mode {
        AlphaMode::Mask => material.alpha_cutoff,
        _ => 0.0,
    };
    shader.set_float(gl, "alphaCutoff", mask_cutoff);

    unsafe {
        if material.alpha_mode == AlphaMode::Blend {
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        } else {
            gl.disable(glow::BLEND);
        }
        if material.double_sided {
            gl.disable(glow::CULL_FACE);
        } else {
            gl.enable(glow::CULL_FACE);
        }
    }
}

fn bind_channel(gl: &glow::Context, unit: u32, channel: &MaterialChannel) {
    unsafe {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(glow::TEXTURE_2D, channel.texture);
    }
}
