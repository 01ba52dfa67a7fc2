/// Flatten a glTF scene into a single world-space mesh
use gltf::mesh::Mode;
use gltf::{buffer, Gltf, Node};
use nalgebra::Matrix4;
use std::path::Path;

use crate::error::Result;
use crate::geometry::{Mesh, Triangle, Vertex};

/// Decode GLB or glTF bytes; buffers must be embedded or data URIs unless `base` is given
pub fn parse_gltf(data: &[u8], base: Option<&Path>) -> Result<Mesh> {
    let Gltf { document, blob } = Gltf::from_slice(data)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let mut mesh = Mesh::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit(&node, &Matrix4::identity(), &buffers, &mut mesh);
            }
        }
        None => {
            // no scene graph: take every mesh untransformed
            for source in document.meshes() {
                mesh.extend(read_mesh(&source, &buffers));
            }
        }
    }

    log::debug!("glTF flattened into {} triangles", mesh.triangles.len());
    Ok(mesh)
}

fn visit(node: &Node, parent: &Matrix4<f32>, buffers: &[buffer::Data], out: &mut Mesh) {
    let local = Matrix4::from(node.transform().matrix());
    let world = parent * local;

    if let Some(source) = node.mesh() {
        out.extend(read_mesh(&source, buffers).transformed(&world));
    }
    for child in node.children() {
        visit(&child, &world, buffers, out);
    }
}

fn read_mesh(source: &gltf::Mesh, buffers: &[buffer::Data]) -> Mesh {
    let mut mesh = Mesh::new();

    for primitive in source.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::warn!(
                "skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                source.name()
            );
            continue;
        }

        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let positions: Vec<[f32; 3]> = match reader.read_positions() {
            Some(iter) => iter.collect(),
            None => continue,
        };
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let vertex = |i: u32| -> Option<Vertex> {
            let [x, y, z] = *positions.get(i as usize)?;
            let [nx, ny, nz] = normals
                .as_ref()
                .and_then(|n| n.get(i as usize).copied())
                .unwrap_or([0.0; 3]);
            Some(Vertex::new(x, y, z, nx, ny, nz))
        };

        for corner in indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (vertex(corner[0]), vertex(corner[1]), vertex(corner[2])) else {
                continue;
            };
            let mut triangle = Triangle::new(a, b, c);
            if normals.is_none() {
                let normal = triangle.calculate_normal();
                for v in &mut triangle.vertices {
                    v.normal = normal;
                }
            }
            mesh.add_triangle(triangle);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    // one triangle, positions only, buffer as a base64 data URI
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0, "translation": [0.0, 0.0, 5.0] } ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
        "accessors": [ {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ]
    }"#;

    #[test]
    fn test_parse_embedded_triangle() {
        let mesh = parse_gltf(TRIANGLE_GLTF.as_bytes(), None).unwrap();
        assert_eq!(mesh.triangles.len(), 1);

        let t = &mesh.triangles[0];
        // node translation applied
        assert!((t.vertices[0].position.z - 5.0).abs() < 1e-6);
        assert!((t.vertices[1].position.x - 1.0).abs() < 1e-6);
        // normal computed from winding
        assert!((t.vertices[0].normal.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_gltf(b"{ not json", None).is_err());
    }
}
