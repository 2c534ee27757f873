//! Typed view of a glTF 2.0 document as written by the MSFS exporter.
//!
//! Only the parts the importer reads are modelled. Every field the format allows
//! to be absent is an explicit `Option` or carries a serde default, so the
//! algorithms never have to guess what a missing key means.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Key of the vendor block inside `primitive.extras`.
pub const ASOBO_PRIMITIVE_KEY: &str = "ASOBO_primitive";

pub const COMPONENT_UNSIGNED_BYTE: u32 = 5121;
pub const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
pub const COMPONENT_UNSIGNED_INT: u32 = 5125;
pub const COMPONENT_FLOAT: u32 = 5126;
/// Non-standard half float component type used by MSFS for texture coordinates.
pub const COMPONENT_HALF_FLOAT: u32 = 5131;

pub const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub textures: Vec<Texture>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Document {
    pub fn from_slice(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Name of the material, or `material_<index>` when the document leaves it out.
    pub fn material_name(&self, index: usize) -> Option<String> {
        self.materials.get(index).map(|m| {
            m.name.clone().unwrap_or_else(|| format!("material_{}", index))
        })
    }

    pub fn mesh_name(&self, index: usize) -> String {
        self.meshes
            .get(index)
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| format!("mesh_{}", index))
    }

    pub fn node_name(&self, index: usize) -> String {
        self.nodes
            .get(index)
            .and_then(|n| n.name.clone())
            .unwrap_or_else(|| format!("node_{}", index))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Absent only for sparse or zero-filled accessors, which MSFS never writes.
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub count: usize,
    pub component_type: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    #[serde(default)]
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Absent means tightly packed elements.
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Primitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Option<u32>,
    pub extras: Option<serde_json::Value>,
}

impl Primitive {
    pub fn attribute(&self, semantic: &str) -> Option<usize> {
        self.attributes.get(semantic).copied()
    }

    /// Resolves the Asobo sub-range of this primitive.
    ///
    /// `StartIndex` and `BaseVertexIndex` default to zero. `PrimitiveCount` has no
    /// default: a block without it, a malformed block, or no block at all yields `None`.
    pub fn asobo_range(&self) -> Option<AsoboRange> {
        let block = self.extras.as_ref()?.get(ASOBO_PRIMITIVE_KEY)?;
        let raw: AsoboPrimitive = serde_json::from_value(block.clone()).ok()?;
        Some(AsoboRange {
            start_index: raw.start_index.unwrap_or(0) as usize,
            base_vertex: raw.base_vertex_index.unwrap_or(0) as usize,
            primitive_count: raw.primitive_count? as usize,
        })
    }
}

/// Raw `extras.ASOBO_primitive` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AsoboPrimitive {
    start_index: Option<u64>,
    base_vertex_index: Option<u64>,
    primitive_count: Option<u64>,
}

/// Sub-range of the shared index pool covered by one primitive, defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsoboRange {
    pub start_index: usize,
    pub base_vertex: usize,
    pub primitive_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: Option<String>,
    pub mesh: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            mesh: None,
            children: Vec::new(),
            translation: [0.0; 3],
            rotation: default_rotation(),
            scale: default_scale(),
        }
    }
}

fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub normal_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<TextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureInfo {
    pub index: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Texture {
    pub source: Option<usize>,
    pub extensions: Option<TextureExtensions>,
}

impl Texture {
    /// Image referenced by this texture. MSFS textures point at their DDS image
    /// through `MSFT_texture_dds`; plain `source` is the fallback.
    pub fn image_index(&self) -> Option<usize> {
        self.extensions
            .as_ref()
            .and_then(|e| e.msft_texture_dds.as_ref())
            .map(|dds| dds.source)
            .or(self.source)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextureExtensions {
    #[serde(rename = "MSFT_texture_dds")]
    pub msft_texture_dds: Option<TextureSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureSource {
    pub source: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
}
