/// Reads glTF documents and their binary blob from disk.
pub mod gltf;

/// Resolves images, textures and materials to files in the texture directories.
pub mod texture;

/// Runs a whole import and gathers its result.
pub mod import;
