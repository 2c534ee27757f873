use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Serialize;

/// A non-fatal event raised while importing. Diagnostics never stop the import;
/// they describe which part of the output degraded and why.
#[remain::sorted]
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("Texture converter invocation failed: {reason}")]
    ConverterInvocationFailed { reason: String },
    #[error("Texture converter reported {reported} outputs for {expected} inputs")]
    ConverterReportMismatch { expected: usize, reported: usize },
    #[error("Scene graph cycle detected at node {node}")]
    CycleDetected { node: usize },
    #[error("Fallback '{entry}' of '{}' not found", .directory.display())]
    FallbackNotFound { directory: PathBuf, entry: String },
    #[error("Invalid texture config '{}': {reason}", .path.display())]
    InvalidTextureConfig { path: PathBuf, reason: String },
    #[error("Could not handle mesh \"{mesh}\": {reason}")]
    MeshAssemblyFailed { mesh: String, reason: String },
    #[error("No Asobo sub primitive in primitive {primitive} of mesh \"{mesh}\"")]
    MissingVendorData { mesh: String, primitive: usize },
    #[error("Scene graph references node {node}, which does not exist")]
    NodeOutOfRange { node: usize },
    #[error("Texture directory '{}' does not exist", .path.display())]
    TextureDirectoryMissing { path: PathBuf },
    #[error("Texture '{uri}' not found in any texture directory")]
    TextureNotFound { uri: String },
    #[error("Replaced texture '{original}' with '{substitute}', DDS not supported")]
    TextureSubstituted { original: String, substitute: String },
    #[error("Texture {texture} does not reference a known image")]
    UnresolvedTexture { texture: usize },
    #[error("Primitive {primitive} of mesh \"{mesh}\" uses topology mode {mode}, only triangle lists are imported")]
    UnsupportedTopology { mesh: String, primitive: usize, mode: u32 },
}

/// Ordered list of diagnostics scoped to a single import call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and forwards it to the log.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
