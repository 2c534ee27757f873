// lib.rs

/// Contains the document model, binary decoding, mesh assembly and the scene graph.
pub mod core;

/// Contains the interface between glTF files on disk, texture directories,
/// the external texture converter and the import result.
pub mod io;

/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::core::accessor::{decode, ElementType};
    pub use crate::core::diagnostics::{Diagnostic, Diagnostics};
    pub use crate::core::document::Document;
    pub use crate::core::mesh::{AssembledMesh, Corner, MaterialSlot};
    pub use crate::core::mesh::assembler::{assemble, assemble_all};
    pub use crate::core::scene::{resolve, Placement};
    pub use crate::io::import::{AsoboImporter, Import, ImportOptions};
    pub use crate::io::texture::conversion::{ConvertedSet, TextureConverter};
    pub use crate::io::texture::fallback::{collect_fallbacks, FallbackSet};
}
