//! GLB/glTF model loading
//!
//! Parses a model into a `SceneTree`. Buffers come from the GLB blob,
//! base64 `data:` URIs, or (async only) files next to the model.
//!
//! Node mapping:
//! - A node without a mesh becomes a group.
//! - A node whose mesh has one primitive becomes a drawable named after
//!   the node, or the mesh when the node is unnamed.
//! - A node whose mesh has several primitives becomes a group named after
//!   the node holding one drawable per primitive, `"{mesh}_{i}"`.

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine as _;
use gltf::buffer::Source;
use gltf::mesh::Mode;
use gltf::Gltf;

use crate::error::LoadError;
use crate::math::{mat4_from_trs, mat4_identity, Vec3};
use crate::scene::{Color, Geometry, Material, MaterialSlot, NodeId, SceneTree};

/// Handle to a model file on disk (or served alongside a WASM build)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    pub path: String,
}

impl ModelAsset {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Load and parse the model, fetching external buffers relative to it
    pub async fn fetch(&self) -> Result<SceneTree, LoadError> {
        use macroquad::prelude::load_file;

        let path = self.path.replace('\\', "/");
        log::info!("Loading model {}", path);

        let bytes = load_file(&path)
            .await
            .map_err(|e| LoadError::Io(format!("{}: {}", path, e)))?;
        let gltf = Gltf::from_slice(&bytes)?;

        let mut buffers = Vec::with_capacity(gltf.buffers().len());
        for buffer in gltf.buffers() {
            let data = match inline_buffer(&gltf, &buffer) {
                Some(data) => data?,
                None => {
                    let Source::Uri(uri) = buffer.source() else {
                        return Err(missing(buffer.index(), "no source"));
                    };
                    let sibling = sibling_path(&path, uri);
                    load_file(&sibling)
                        .await
                        .map_err(|e| missing(buffer.index(), format!("{}: {}", sibling, e)))?
                }
            };
            check_length(&buffer, &data)?;
            buffers.push(data);
        }

        build_scene_tree(&gltf, &buffers)
    }
}

/// Parse a self-contained model (GLB, or glTF with only `data:` buffers)
pub fn parse_model(bytes: &[u8]) -> Result<SceneTree, LoadError> {
    let gltf = Gltf::from_slice(bytes)?;

    let mut buffers = Vec::with_capacity(gltf.buffers().len());
    for buffer in gltf.buffers() {
        let data = inline_buffer(&gltf, &buffer)
            .unwrap_or_else(|| Err(missing(buffer.index(), "external buffer needs async fetch")))?;
        check_length(&buffer, &data)?;
        buffers.push(data);
    }

    build_scene_tree(&gltf, &buffers)
}

fn missing(index: usize, reason: impl Into<String>) -> LoadError {
    LoadError::MissingBuffer { index, reason: reason.into() }
}

/// Buffer data that needs no file access. None for external files.
fn inline_buffer(gltf: &Gltf, buffer: &gltf::Buffer) -> Option<Result<Vec<u8>, LoadError>> {
    match buffer.source() {
        Source::Bin => Some(
            gltf.blob
                .clone()
                .ok_or_else(|| missing(buffer.index(), "GLB has no binary chunk")),
        ),
        Source::Uri(uri) if uri.starts_with("data:") => Some(decode_data_uri(uri)),
        Source::Uri(_) => None,
    }
}

fn check_length(buffer: &gltf::Buffer, data: &[u8]) -> Result<(), LoadError> {
    if data.len() < buffer.length() {
        return Err(missing(
            buffer.index(),
            format!("expected {} bytes, got {}", buffer.length(), data.len()),
        ));
    }
    Ok(())
}

/// Decode `data:[<mime>];base64,<payload>`
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::BadDataUri("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::BadDataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(LoadError::BadDataUri(format!("unsupported encoding '{}'", header)));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| LoadError::BadDataUri(e.to_string()))
}

/// Resolve a buffer URI against the directory of the model file
fn sibling_path(model_path: &str, uri: &str) -> String {
    match Path::new(model_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            dir.join(uri).to_string_lossy().replace('\\', "/")
        }
        _ => uri.to_string(),
    }
}

/// Build the scene tree from a parsed document and its resolved buffers
pub fn build_scene_tree(gltf: &gltf::Document, buffers: &[Vec<u8>]) -> Result<SceneTree, LoadError> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(LoadError::EmptyScene)?;

    let mut tree = SceneTree::new(scene.name().map(str::to_string));
    let root = tree.root();
    for node in scene.nodes() {
        add_node(&mut tree, root, &node, buffers)?;
    }

    warn_duplicate_names(&tree);
    log::info!(
        "Model has {} nodes, {} drawables",
        tree.len(),
        tree.drawables().len()
    );
    Ok(tree)
}

fn add_node(
    tree: &mut SceneTree,
    parent: NodeId,
    node: &gltf::Node,
    buffers: &[Vec<u8>],
) -> Result<(), LoadError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = mat4_from_trs(Vec3::from(translation), rotation, Vec3::from(scale));
    let node_name = node.name().map(str::to_string);

    let id = match node.mesh() {
        None => tree.add_group(parent, node_name, local),
        Some(mesh) => {
            let mesh_name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

            let mut parts = Vec::new();
            for primitive in mesh.primitives() {
                parts.push(convert_primitive(&primitive, buffers, &mesh_name)?);
            }

            if parts.len() == 1 {
                let (geometry, material) = parts.remove(0);
                let name = node_name.or_else(|| mesh.name().map(str::to_string));
                tree.add_drawable(parent, name, local, geometry, material.into())
            } else {
                let group = tree.add_group(parent, node_name, local);
                for (i, (geometry, material)) in parts.into_iter().enumerate() {
                    tree.add_drawable(
                        group,
                        Some(format!("{}_{}", mesh_name, i)),
                        mat4_identity(),
                        geometry,
                        MaterialSlot::Single(material),
                    );
                }
                group
            }
        }
    };

    for child in node.children() {
        add_node(tree, id, &child, buffers)?;
    }
    Ok(())
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    mesh_name: &str,
) -> Result<(Geometry, Material), LoadError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| LoadError::MissingPositions { mesh: mesh_name.to_string() })?
        .map(Vec3::from)
        .collect();

    let vertices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let indices = match primitive.mode() {
        Mode::Triangles => vertices,
        Mode::TriangleStrip => strip_to_list(&vertices),
        Mode::TriangleFan => fan_to_list(&vertices),
        other => {
            log::debug!("Mesh '{}': {:?} primitive is not pickable", mesh_name, other);
            Vec::new()
        }
    };

    Ok((Geometry::new(positions, indices), convert_material(&primitive.material())))
}

fn strip_to_list(strip: &[u32]) -> Vec<u32> {
    let mut list = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for i in 2..strip.len() {
        // Alternate winding so every triangle faces the same way
        if i % 2 == 0 {
            list.extend_from_slice(&[strip[i - 2], strip[i - 1], strip[i]]);
        } else {
            list.extend_from_slice(&[strip[i - 1], strip[i - 2], strip[i]]);
        }
    }
    list
}

fn fan_to_list(fan: &[u32]) -> Vec<u32> {
    let mut list = Vec::with_capacity(fan.len().saturating_sub(2) * 3);
    for i in 2..fan.len() {
        list.extend_from_slice(&[fan[0], fan[i - 1], fan[i]]);
    }
    list
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let [er, eg, eb] = material.emissive_factor();

    Material {
        name: material.name().map(str::to_string),
        base_color: Some(Color::new(r, g, b)),
        // Unlit materials have no emissive channel to glow with
        emissive: (!material.unlit()).then(|| Color::new(er, eg, eb)),
        opacity: match material.alpha_mode() {
            gltf::material::AlphaMode::Blend => a,
            _ => 1.0,
        },
        double_sided: material.double_sided(),
    }
}

/// Name lookups take the first match, so later duplicates are unreachable by name
fn warn_duplicate_names(tree: &SceneTree) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for id in tree.drawables() {
        if let Some(name) = tree.node(id).and_then(|n| n.name()) {
            *counts.entry(name).or_default() += 1;
        }
    }
    for (name, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
        log::warn!(
            "{} meshes are named '{}'; selection by name picks the first",
            count, name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mat4_transform_point;

    /// One triangle: (0,0,0), (1,0,0), (0,1,0)
    fn triangle_data_uri() -> String {
        let bytes: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    /// Minimal glTF JSON around a triangle buffer. `nodes` and `meshes` are raw JSON arrays.
    fn gltf_json(uri: &str, nodes: &str, meshes: &str, scene_nodes: &str) -> String {
        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "name": "Scene", "nodes": {scene_nodes} }}],
                "nodes": {nodes},
                "meshes": {meshes},
                "materials": [{{
                    "name": "Paint",
                    "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }}
                }}],
                "buffers": [{{ "byteLength": 36, "uri": "{uri}" }}],
                "bufferViews": [{{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }}],
                "accessors": [{{
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                    "min": [0.0, 0.0, 0.0],
                    "max": [1.0, 1.0, 0.0]
                }}]
            }}"#
        )
    }

    const ONE_PRIMITIVE: &str =
        r#"[{ "name": "TriMesh", "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }]"#;

    #[test]
    fn test_single_primitive_node_is_named_drawable() {
        let json = gltf_json(
            &triangle_data_uri(),
            r#"[{ "name": "Head", "mesh": 0, "translation": [0.0, 0.0, 1.0] }]"#,
            ONE_PRIMITIVE,
            "[0]",
        );
        let tree = parse_model(json.as_bytes()).unwrap();

        let head = tree.find_drawable_by_name("Head").unwrap();
        let drawable = tree.node(head).unwrap().drawable().unwrap();
        assert_eq!(drawable.geometry.triangle_count(), 1);
        assert_eq!(drawable.geometry.indices, vec![0, 1, 2]);

        let material = drawable.material.primary().unwrap();
        assert_eq!(material.name.as_deref(), Some("Paint"));
        assert_eq!(material.base_color, Some(Color::new(1.0, 0.0, 0.0)));
        assert!(material.has_emissive());

        let p = mat4_transform_point(&tree.node(head).unwrap().local, Vec3::ZERO);
        assert_eq!(p, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tree.node(tree.root()).unwrap().name(), Some("Scene"));
    }

    #[test]
    fn test_unlit_material_has_no_emissive() {
        let json = gltf_json(&triangle_data_uri(), r#"[{ "name": "Flat", "mesh": 0 }]"#, ONE_PRIMITIVE, "[0]")
            .replace(r#""scene": 0,"#, r#""extensionsUsed": ["KHR_materials_unlit"], "scene": 0,"#)
            .replace(
                r#""name": "Paint","#,
                r#""name": "Paint", "extensions": { "KHR_materials_unlit": {} },"#,
            );
        let tree = parse_model(json.as_bytes()).unwrap();

        let id = tree.find_drawable_by_name("Flat").unwrap();
        let material = tree.material(id).unwrap().primary().unwrap();
        assert!(material.has_base_color());
        assert!(!material.has_emissive());
    }

    #[test]
    fn test_unnamed_node_takes_mesh_name() {
        let json = gltf_json(&triangle_data_uri(), r#"[{ "mesh": 0 }]"#, ONE_PRIMITIVE, "[0]");
        let tree = parse_model(json.as_bytes()).unwrap();
        assert!(tree.find_drawable_by_name("TriMesh").is_some());
    }

    #[test]
    fn test_multi_primitive_mesh_becomes_group() {
        let json = gltf_json(
            &triangle_data_uri(),
            r#"[{ "name": "Body", "mesh": 0, "children": [1] }, { "name": "Arm", "mesh": 1 }]"#,
            r#"[
                { "name": "BodyMesh", "primitives": [
                    { "attributes": { "POSITION": 0 } },
                    { "attributes": { "POSITION": 0 }, "material": 0 }
                ] },
                { "primitives": [{ "attributes": { "POSITION": 0 } }] }
            ]"#,
            "[0]",
        );
        let tree = parse_model(json.as_bytes()).unwrap();

        let names: Vec<_> = tree
            .drawables()
            .into_iter()
            .filter_map(|id| tree.node(id).and_then(|n| n.name()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["BodyMesh_0", "BodyMesh_1", "Arm"]);

        let part = tree.find_drawable_by_name("BodyMesh_0").unwrap();
        let group = tree.node(part).unwrap().parent.unwrap();
        assert_eq!(tree.node(group).unwrap().name(), Some("Body"));
        assert!(!tree.node(group).unwrap().is_drawable());
    }

    #[test]
    fn test_external_buffer_needs_fetch() {
        let json = gltf_json("triangle.bin", r#"[{ "mesh": 0 }]"#, ONE_PRIMITIVE, "[0]");
        let err = parse_model(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingBuffer { index: 0, .. }));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode([0u8; 12])
        );
        let json = gltf_json(&uri, r#"[{ "mesh": 0 }]"#, ONE_PRIMITIVE, "[0]");
        assert!(matches!(
            parse_model(json.as_bytes()),
            Err(LoadError::MissingBuffer { .. })
        ));
    }

    #[test]
    fn test_garbage_is_gltf_error() {
        assert!(matches!(parse_model(b"not a model"), Err(LoadError::Gltf(_))));
    }

    #[test]
    fn test_decode_data_uri() {
        assert_eq!(decode_data_uri("data:;base64,AQID").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(LoadError::BadDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("data:;base64,!!!"),
            Err(LoadError::BadDataUri(_))
        ));
    }

    #[test]
    fn test_strip_and_fan_expand_to_lists() {
        assert_eq!(strip_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(fan_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert!(strip_to_list(&[0, 1]).is_empty());
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(sibling_path("assets/robot.gltf", "robot.bin"), "assets/robot.bin");
        assert_eq!(sibling_path("robot.gltf", "robot.bin"), "robot.bin");
    }
}
