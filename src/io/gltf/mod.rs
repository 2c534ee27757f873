use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::core::document::Document;

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("Invalid data URI in buffer 0: {0}")]
    DataUri(String),
    #[error("Failed to read '{}': {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
    #[error("Invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parsed document together with the blob its buffer views address.
#[derive(Debug, Clone)]
pub struct GltfFile {
    pub path: PathBuf,
    pub document: Document,
    pub blob: Vec<u8>,
}

/// Parses a document from JSON bytes.
pub fn parse(json: &[u8]) -> Result<Document, Err> {
    Ok(Document::from_slice(json)?)
}

/// Reads the `.gltf` at `path` and the blob of its first buffer.
///
/// The blob is `buffers[0].uri` (a file next to the document, or an embedded
/// base64 data URI) and defaults to the sibling `.bin` file when the buffer has
/// no URI. A document without buffers gets an empty blob.
pub fn load(path: &Path) -> Result<GltfFile, Err> {
    let json = read(path)?;
    let document = parse(&json)?;

    let blob = match document.buffers.first() {
        None => Vec::new(),
        Some(buffer) => match buffer.uri.as_deref() {
            Some(uri) if uri.starts_with(DATA_URI_PREFIX) => decode_data_uri(uri)?,
            Some(uri) => read(&sibling(path, uri))?,
            None => read(&path.with_extension("bin"))?,
        },
    };
    log::info!(
        "Loaded '{}': {} meshes, {} nodes, {} bytes of binary data",
        path.display(),
        document.meshes.len(),
        document.nodes.len(),
        blob.len()
    );

    Ok(GltfFile { path: path.to_path_buf(), document, blob })
}

fn read(path: &Path) -> Result<Vec<u8>, Err> {
    fs::read(path).map_err(|e| Err::Io { path: path.to_path_buf(), reason: e.to_string() })
}

fn sibling(path: &Path, uri: &str) -> PathBuf {
    path.parent().unwrap_or_else(|| Path::new(".")).join(uri)
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, Err> {
    let start = uri
        .find(BASE64_MARKER)
        .ok_or_else(|| Err::DataUri("only base64 data URIs are supported".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(&uri[start + BASE64_MARKER.len()..])
        .map_err(|e| Err::DataUri(e.to_string()))
}
