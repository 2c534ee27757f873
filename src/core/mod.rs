/// Decodes typed, strided element runs described by accessors.
pub mod accessor;

/// Right-handed Y-up to Z-up conversions shared by vertices and node transforms.
pub mod axis;

/// Addresses bounded byte windows inside the binary blob.
pub mod buffer;

/// Non-fatal events collected while importing.
pub mod diagnostics;

/// Typed glTF document with the Asobo vendor blocks.
pub mod document;

/// Assembled polygon meshes and the Asobo sub-primitive assembler.
pub mod mesh;

/// Scene graph traversal producing placed, parented instances.
pub mod scene;
