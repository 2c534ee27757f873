#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// Builds the binary blob and the accessor / buffer view tables of a fixture.
#[derive(Default)]
pub struct Geometry {
    blob: Vec<u8>,
    accessors: Vec<Value>,
    views: Vec<Value>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, bytes: &[u8], count: usize, component_type: u32, type_: &str) -> usize {
        while self.blob.len() % 4 != 0 {
            self.blob.push(0);
        }
        self.views.push(json!({ "buffer": 0, "byteOffset": self.blob.len(), "byteLength": bytes.len() }));
        self.blob.extend_from_slice(bytes);
        self.accessors.push(json!({
            "bufferView": self.views.len() - 1,
            "count": count,
            "componentType": component_type,
            "type": type_
        }));
        self.accessors.len() - 1
    }

    pub fn indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        self.push(&bytes, indices.len(), 5123, "SCALAR")
    }

    pub fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = positions.iter().flatten().flat_map(|c| c.to_le_bytes()).collect();
        self.push(&bytes, positions.len(), 5126, "VEC3")
    }

    /// Half float texture coordinates, as MSFS writes them.
    pub fn tex_coords(&mut self, uvs: &[[f32; 2]]) -> usize {
        let bytes: Vec<u8> = uvs
            .iter()
            .flatten()
            .flat_map(|c| half::f16::from_f32(*c).to_le_bytes())
            .collect();
        self.push(&bytes, uvs.len(), 5131, "VEC2")
    }

    /// Adds the accessor, buffer view and buffer tables to `document`.
    pub fn finish(self, mut document: Value) -> (Value, Vec<u8>) {
        document["accessors"] = Value::Array(self.accessors);
        document["bufferViews"] = Value::Array(self.views);
        document["buffers"] = json!([{ "byteLength": self.blob.len() }]);
        (document, self.blob)
    }
}

/// Primitive of the shared pool with an Asobo range.
pub fn primitive(indices: usize, position: usize, uv: usize, material: Option<usize>, start: usize, count: usize) -> Value {
    json!({
        "attributes": { "POSITION": position, "TEXCOORD_0": uv },
        "indices": indices,
        "material": material,
        "extras": { "ASOBO_primitive": { "StartIndex": start, "PrimitiveCount": count } }
    })
}

/// Writes `<root>/model/<name>.gltf` and its sibling `.bin`, SimObject style.
pub fn write_model(root: &Path, name: &str, document: &Value, blob: &[u8]) -> PathBuf {
    let model = root.join("model");
    fs::create_dir_all(&model).unwrap();
    let gltf = model.join(format!("{}.gltf", name));
    fs::write(&gltf, serde_json::to_vec_pretty(document).unwrap()).unwrap();
    fs::write(model.join(format!("{}.bin", name)), blob).unwrap();
    gltf
}

/// Creates `<root>/TEXTURE` holding empty files with the given names.
pub fn write_textures(root: &Path, names: &[&str]) -> PathBuf {
    let dir = root.join("TEXTURE");
    fs::create_dir_all(&dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
    dir
}
