//! glTF scene importer.
//!
//! Parses a `.gltf`/`.glb` asset, populates a [`Scene`] (textures, materials
//! and the node hierarchy) and uploads geometry and textures to the GPU.
//! Loading follows a fixed order: textures first, then materials (which look
//! textures up by URI), then nodes with their meshes. On any failure the
//! scene is rolled back to its empty state so callers never observe a
//! half-loaded asset.

use std::path::Path;

use cgmath::Quaternion;
use glow::HasContext;
use gltf::mesh::util::ReadIndices;

use crate::data_structures::{
    Aabb, AlphaMode, ChannelFactors, MaterialChannel, Mesh, MeshBuffers, MeshPrimitive, Node,
    PbrMaterial, Scene, Texture,
};
use crate::error::RenderError;
use crate::resources::load_binary;

/// Names the vertex shader must use for its attribute inputs; `setup_mesh`
/// queries the program for these locations.
pub const ATTRIB_POSITION: &str = "inVertexPosition";
pub const ATTRIB_NORMAL: &str = "inVertexNormal";
pub const ATTRIB_TEX_COORDS: &str = "inVertexTextureCoordinates";

/// Importer for glTF 2.0 assets (`.gltf` ASCII or `.glb` binary).
#[derive(Debug, Default)]
pub struct GltfImporter;

impl GltfImporter {
    pub fn new() -> Self {
        Self
    }

    /// Loads the asset at `path` into `scene`.
    ///
    /// The scene's shader must already be compiled; its program is the bind
    /// target used to resolve vertex attribute locations during mesh upload.
    /// On failure the scene is cleared before the error is returned.
    pub fn load(
        &self,
        gl: &glow::Context,
        scene: &mut Scene,
        path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        if scene.shader.program().is_none() {
            return Err(RenderError::MissingShaderProgram("scene"));
        }
        if let Err(err) = self.try_load(gl, scene, path.as_ref()) {
            scene.clear(gl);
            return Err(err);
        }
        Ok(())
    }

    /// Releases all scene resources in RAM and VRAM.
    pub fn clear(&self, gl: &glow::Context, scene: &mut Scene) {
        scene.clear(gl);
    }

    fn try_load(
        &self,
        gl: &glow::Context,
        scene: &mut Scene,
        path: &Path,
    ) -> Result<(), RenderError> {
        scene.path = path.to_path_buf();
        scene.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        validate_extension(path)?;
        let (gltf, buffers) = read_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

        load_textures(gl, scene, &gltf.document, &base_dir)?;
        load_materials(scene, &gltf.document);
        load_nodes(scene, &gltf.document, &buffers)?;

        scene.linearize();
        let program = scene
            .shader
            .program()
            .ok_or(RenderError::MissingShaderProgram("scene"))?;
        for i in 0..scene.linear_nodes.len() {
            let id = scene.linear_nodes[i];
            if let Some(mesh) = scene.nodes[id].mesh.as_mut() {
                setup_mesh(gl, mesh, program)?;
            }
        }
        scene.refresh_bounds();
        Ok(())
    }
}

/// Uploads a mesh's attribute arrays to the GPU and records the buffer set.
///
/// Fails if the mesh was already uploaded or has no position data. Vertex
/// attributes are bound to the locations `program` reports for
/// [`ATTRIB_POSITION`], [`ATTRIB_NORMAL`] and [`ATTRIB_TEX_COORDS`]; a stream
/// the program does not declare is skipped with a warning.
pub fn setup_mesh(
    gl: &glow::Context,
    mesh: &mut Mesh,
    program: glow::Program,
) -> Result<(), RenderError> {
    if mesh.buffers.is_some() {
        return Err(RenderError::MeshAlreadyUploaded(mesh.name.clone()));
    }
    if mesh.positions.is_empty() {
        return Err(RenderError::EmptyMesh(mesh.name.clone()));
    }

    unsafe {
        let vao = gl.create_vertex_array().map_err(RenderError::GlAllocation)?;
        let ebo = gl.create_buffer().map_err(RenderError::GlAllocation)?;
        let positions = gl.create_buffer().map_err(RenderError::GlAllocation)?;
        let normals = gl.create_buffer().map_err(RenderError::GlAllocation)?;
        let tex_coords = gl.create_buffer().map_err(RenderError::GlAllocation)?;

        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&mesh.indices),
            glow::STATIC_DRAW,
        );

        upload_attribute(
            gl,
            program,
            positions,
            ATTRIB_POSITION,
            bytemuck::cast_slice(&mesh.positions),
            3,
        );
        upload_attribute(
            gl,
            program,
            normals,
            ATTRIB_NORMAL,
            bytemuck::cast_slice(&mesh.normals),
            3,
        );
        upload_attribute(
            gl,
            program,
            tex_coords,
            ATTRIB_TEX_COORDS,
            bytemuck::cast_slice(&mesh.tex_coords),
            2,
        );

        gl.bind_vertex_array(None);

        mesh.buffers = Some(MeshBuffers {
            vao,
            ebo,
            positions,
            normals,
            tex_coords,
        });
    }
    Ok(())
}

fn upload_attribute(
    gl: &glow::Context,
    program: glow::Program,
    buffer: glow::Buffer,
    name: &str,
    data: &[u8],
    components: i32,
) {
    unsafe {
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
        match gl.get_attrib_location(program, name) {
            Some(location) => {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
            }
            None => log::warn!("shader program declares no attribute {name}; stream left unbound"),
        }
    }
}

fn validate_extension(path: &Path) -> Result<bool, RenderError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gltf") => Ok(false),
        Some(ext) if ext.eq_ignore_ascii_case("glb") => Ok(true),
        _ => Err(RenderError::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Opens the asset and resolves every buffer: the GLB blob for binary
/// payloads, companion files for URI references. Data URIs are not supported.
fn read_document(path: &Path) -> Result<(gltf::Gltf, Vec<Vec<u8>>), RenderError> {
    let gltf = gltf::Gltf::open(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut buffers = Vec::new();
    for buffer in gltf.document.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or_else(|| {
                    RenderError::UnsupportedBufferSource("missing GLB binary chunk".into())
                })?;
                buffers.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    return Err(RenderError::UnsupportedBufferSource(format!(
                        "data URI buffer in {}",
                        path.display()
                    )));
                }
                buffers.push(load_binary(base_dir.join(uri))?);
            }
        }
    }
    Ok((gltf, buffers))
}

/// Decodes and uploads every image referenced by the asset's textures,
/// keyed by URI so an image is uploaded at most once per scene.
///
/// A texture whose image cannot be decoded is skipped with a warning rather
/// than failing the load; embedded (buffer-view or data-URI) images are out
/// of scope and skipped the same way.
fn load_textures(
    gl: &glow::Context,
    scene: &mut Scene,
    document: &gltf::Document,
    base_dir: &Path,
) -> Result<(), RenderError> {
    for texture in document.textures() {
        match texture.source().source() {
            gltf::image::Source::Uri { uri, .. } => {
                if uri.starts_with("data:") {
                    log::warn!("skipping embedded data URI image for texture {uri:?}");
                    continue;
                }
                if scene.textures.contains_key(uri) {
                    continue;
                }
                let image_path = base_dir.join(uri);
                let decoded = match image::open(&image_path) {
                    Ok(decoded) => decoded,
                    Err(err) => {
                        log::warn!("skipping texture {}: {err}", image_path.display());
                        continue;
                    }
                };
                let uploaded = upload_texture(gl, uri, &image_path, decoded)?;
                scene.textures.insert(uri.to_string(), uploaded);
            }
            gltf::image::Source::View { .. } => {
                log::warn!(
                    "skipping embedded buffer-view image for texture {:?}",
                    texture.name().unwrap_or("unnamed")
                );
            }
        }
    }
    Ok(())
}

fn upload_texture(
    gl: &glow::Context,
    name: &str,
    path: &Path,
    decoded: image::DynamicImage,
) -> Result<Texture, RenderError> {
    use image::DynamicImage;

    let width = decoded.width() as i32;
    let height = decoded.height() as i32;
    let (internal_format, format, channels, pixels) = match decoded {
        DynamicImage::ImageLuma8(img) => (glow::R8, glow::RED, 1, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (glow::RGB8, glow::RGB, 3, img.into_raw()),
        DynamicImage::ImageRgba8(img) => (glow::RGBA8, glow::RGBA, 4, img.into_raw()),
        other => (glow::RGBA8, glow::RGBA, 4, other.to_rgba8().into_raw()),
    };
    let size_bytes = pixels.len();

    let id = unsafe {
        let id = gl.create_texture().map_err(RenderError::GlAllocation)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(id));
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            internal_format as i32,
            width,
            height,
            0,
            format,
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
            glow::LINEAR as i32,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        id
    };

    // The CPU copy is dropped here; only the GPU handle and metadata remain.
    Ok(Texture {
        name: name.to_string(),
        path: path.to_path_buf(),
        width,
        height,
        channels,
        data: None,
        size_bytes,
        id: Some(id),
    })
}

/// Builds the scene's material list. Must run after `load_textures`: each
/// channel resolves its texture by URI in the scene's texture map, falling
/// back to an empty channel that only carries the material's constant
/// factors.
fn load_materials(scene: &mut Scene, document: &gltf::Document) {
    let mut materials = Vec::new();
    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();

        let base_color = MaterialChannel::new(
            channel_texture(scene, pbr.base_color_texture().map(|info| info.texture())),
            ChannelFactors::BaseColor(pbr.base_color_factor()),
        );
        let metallic_roughness = MaterialChannel::new(
            channel_texture(
                scene,
                pbr.metallic_roughness_texture().map(|info| info.texture()),
            ),
            ChannelFactors::MetallicRoughness {
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
            },
        );
        let normal = MaterialChannel::new(
            channel_texture(scene, material.normal_texture().map(|info| info.texture())),
            ChannelFactors::Normal {
                scale: material.normal_texture().map(|info| info.scale()).unwrap_or(1.0),
            },
        );
        let occlusion = MaterialChannel::new(
            channel_texture(
                scene,
                material.occlusion_texture().map(|info| info.texture()),
            ),
            ChannelFactors::Occlusion {
                strength: material
                    .occlusion_texture()
                    .map(|info| info.strength())
                    .unwrap_or(1.0),
            },
        );
        let emissive = MaterialChannel::new(
            channel_texture(scene, material.emissive_texture().map(|info| info.texture())),
            ChannelFactors::Emissive(material.emissive_factor()),
        );

        let alpha_mode = match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        };

        materials.push(PbrMaterial {
            name: material.name().unwrap_or_default().to_string(),
            base_color,
            metallic_roughness,
            normal,
            occlusion,
            emissive,
            alpha_mode,
            alpha_cutoff: material.alpha_cutoff().unwrap_or(0.5),
            double_sided: material.double_sided(),
        });
    }
    scene.materials = materials;
}

fn channel_texture(scene: &Scene, texture: Option<gltf::Texture>) -> Option<glow::Texture> {
    texture.and_then(|texture| match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => {
            scene.textures.get(uri).and_then(|texture| texture.id)
        }
        gltf::image::Source::View { .. } => None,
    })
}

/// Walks the active scene's node hierarchy parent-first with an explicit
/// worklist (depth-first order, no recursion) and builds CPU-side meshes.
/// Materials must already be populated: primitives attach them by index.
fn load_nodes(
    scene: &mut Scene,
    document: &gltf::Document,
    buffers: &[Vec<u8>],
) -> Result<(), RenderError> {
    let Some(active) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Ok(());
    };

    let mut worklist: Vec<(gltf::Node, Option<usize>)> = Vec::new();
    let mut root_nodes: Vec<gltf::Node> = active.nodes().collect();
    root_nodes.reverse();
    for root in root_nodes {
        worklist.push((root, None));
    }

    while let Some((gltf_node, parent)) = worklist.pop() {
        let mut node = Node {
            name: gltf_node.name().unwrap_or_default().to_string(),
            index: gltf_node.index(),
            ..Node::default()
        };
        match gltf_node.transform() {
            gltf::scene::Transform::Matrix { matrix } => {
                node.matrix = matrix.into();
            }
            gltf::scene::Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => {
                node.translation = translation.into();
                // glTF stores quaternions as [x, y, z, w].
                node.rotation =
                    Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
                node.scale = scale.into();
            }
        }
        if let Some(gltf_mesh) = gltf_node.mesh() {
            node.mesh = Some(build_mesh(&gltf_mesh, buffers, &scene.materials)?);
        }

        let id = scene.push_node(node, parent);
        let mut children: Vec<gltf::Node> = gltf_node.children().collect();
        children.reverse();
        for child in children {
            worklist.push((child, Some(id)));
        }
    }
    Ok(())
}

/// Decodes all primitives of a glTF mesh into one flat attribute/index
/// buffer set.
///
/// Primitives append into the shared arrays with a running vertex offset so
/// they can share one index space; decoded indices are rebased by that
/// offset. POSITION is mandatory; NORMAL (normalized) and TEXCOORD_0 default
/// to zero vectors. The primitive's bounds come straight from the POSITION
/// accessor's declared min/max.
fn build_mesh(
    gltf_mesh: &gltf::Mesh,
    buffers: &[Vec<u8>],
    materials: &[PbrMaterial],
) -> Result<Mesh, RenderError> {
    let mut mesh = Mesh::new(gltf_mesh.name().unwrap_or_default());

    for primitive in gltf_mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let vertex_start = mesh.positions.len() as u32;
        let first_index = mesh.indices.len() as u32;

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| RenderError::MissingPositions(mesh.name.clone()))?
            .collect();
        let vertex_count = positions.len() as u32;
        mesh.positions.extend(positions);

        match reader.read_normals() {
            Some(normals) => mesh.normals.extend(normals.map(normalized)),
            None => mesh
                .normals
                .extend(std::iter::repeat([0.0f32; 3]).take(vertex_count as usize)),
        }
        match reader.read_tex_coords(0) {
            Some(tex_coords) => mesh.tex_coords.extend(tex_coords.into_f32()),
            None => mesh
                .tex_coords
                .extend(std::iter::repeat([0.0f32; 2]).take(vertex_count as usize)),
        }

        let has_indices = if let Some(indices) = reader.read_indices() {
            match indices {
                ReadIndices::U8(iter) => mesh
                    .indices
                    .extend(iter.map(|index| u32::from(index) + vertex_start)),
                ReadIndices::U16(iter) => mesh
                    .indices
                    .extend(iter.map(|index| u32::from(index) + vertex_start)),
                ReadIndices::U32(iter) => {
                    mesh.indices.extend(iter.map(|index| index + vertex_start))
                }
            }
            true
        } else {
            false
        };
        let index_count = mesh.indices.len() as u32 - first_index;

        let bounds = primitive.bounding_box();
        let aabb = Aabb::new(bounds.min.into(), bounds.max.into());
        mesh.aabb.merge(&aabb);

        let material = primitive
            .material()
            .index()
            .and_then(|index| materials.get(index))
            .cloned()
            .unwrap_or_default();

        mesh.primitives.push(MeshPrimitive {
            name: String::new(),
            first_index,
            index_count,
            vertex_count,
            has_indices,
            has_skin: false,
            material,
            aabb,
        });
    }
    Ok(mesh)
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Matrix4, Rotation3, Vector3};

    const FIXTURE: &str = "tests/fixtures/triangle.gltf";

    fn load_fixture_cpu() -> Scene {
        let (gltf, buffers) = read_document(Path::new(FIXTURE)).expect("fixture parses");
        let mut scene = Scene::new();
        load_materials(&mut scene, &gltf.document);
        load_nodes(&mut scene, &gltf.document, &buffers).expect("nodes load");
        scene.linearize();
        scene
    }

    #[test]
    fn extension_policy_accepts_gltf_and_glb_only() {
        assert_eq!(validate_extension(Path::new("a/scene.gltf")).unwrap(), false);
        assert_eq!(validate_extension(Path::new("a/SCENE.GLTF")).unwrap(), false);
        assert_eq!(validate_extension(Path::new("b.glb")).unwrap(), true);
        assert_eq!(validate_extension(Path::new("b.GLB")).unwrap(), true);
        assert!(matches!(
            validate_extension(Path::new("model.obj")),
            Err(RenderError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            validate_extension(Path::new("model")),
            Err(RenderError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn fixture_builds_three_node_chain_with_one_root() {
        let scene = load_fixture_cpu();
        assert_eq!(scene.roots.len(), 1);
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.linear_nodes.len(), 3);
        // Depth-first: root, pivot, leaf.
        let names: Vec<&str> = scene
            .linear_nodes
            .iter()
            .map(|&id| scene.nodes[id].name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "pivot", "leaf"]);
    }

    #[test]
    fn fixture_mesh_decodes_primitive_ranges_and_bounds() {
        let scene = load_fixture_cpu();
        let leaf = &scene.nodes[scene.linear_nodes[2]];
        let mesh = leaf.mesh.as_ref().expect("leaf carries the mesh");
        assert!(mesh.buffers.is_none());

        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.tex_coords.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);

        assert_eq!(mesh.primitives.len(), 1);
        let primitive = &mesh.primitives[0];
        assert_eq!(primitive.first_index, 0);
        assert_eq!(primitive.index_count, 3);
        assert_eq!(primitive.vertex_count, 3);
        assert!(primitive.has_indices);
        assert!(!primitive.has_skin);

        // Bounds come from the accessor's declared min/max.
        assert_eq!(primitive.aabb.min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(primitive.aabb.max, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn fixture_node_transforms_round_trip_through_global_matrix() {
        let scene = load_fixture_cpu();
        let leaf_id = scene.linear_nodes[2];

        let expected = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))
            * Matrix4::from(Quaternion::from_angle_z(Deg(90.0)))
            * Matrix4::from_scale(2.0);
        let actual = scene.global_matrix(leaf_id);

        let expected: [[f32; 4]; 4] = expected.into();
        let actual: [[f32; 4]; 4] = actual.into();
        for (a, b) in actual.iter().flatten().zip(expected.iter().flatten()) {
            assert!((a - b).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn fixture_primitive_without_material_gets_default_channels() {
        let scene = load_fixture_cpu();
        let mesh = scene.nodes[scene.linear_nodes[2]].mesh.as_ref().unwrap();
        let material = &mesh.primitives[0].material;
        assert_eq!(material.alpha_mode, AlphaMode::None);
        assert!(material.base_color.texture.is_none());
        assert!(material.emissive.texture.is_none());
    }

    #[test]
    fn missing_companion_buffer_is_an_io_error() {
        let result = read_document(Path::new("tests/fixtures/broken-buffer.gltf"));
        assert!(matches!(result, Err(RenderError::Io(_))));
    }
}
