use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::Serialize;

use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::core::mesh::assembler;
use crate::core::mesh::AssembledMesh;
use crate::core::scene::{self, Placement};
use crate::io::gltf::{self, GltfFile};
use crate::io::texture::conversion::{ConvertedSet, TextureConverter};
use crate::io::texture::{self, fallback, ResolvedImage, ResolvedMaterial, DEFAULT_TEXTURE_FOLDER};

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("Loading Error: {0}")]
    LoadingError(#[from] gltf::Err),
}

/// Name of the directory under the system temp dir receiving converted textures.
pub const DEFAULT_CONVERTED_DIR_NAME: &str = "asobo-gltf-textures";

/// Options of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Texture folder. Relative folders are looked up next to the model folder.
    pub texture_folder: PathBuf,
    /// Simulator install directory that fallback entries may point into.
    pub base_install: Option<PathBuf>,
    /// DDS to PNG converter. Without one, DDS images are replaced by PNG siblings.
    pub converter: Option<PathBuf>,
    pub converted_dir: PathBuf,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            texture_folder: PathBuf::from(DEFAULT_TEXTURE_FOLDER),
            base_install: None,
            converter: None,
            converted_dir: std::env::temp_dir().join(DEFAULT_CONVERTED_DIR_NAME),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.texture_folder = folder.into();
        self
    }

    pub fn with_base_install(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_install = Some(dir.into());
        self
    }

    pub fn with_converter(mut self, executable: impl Into<PathBuf>) -> Self {
        self.converter = Some(executable.into());
        self
    }

    pub fn with_converted_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.converted_dir = dir.into();
        self
    }
}

/// Everything an import produced. Degraded parts are listed in `diagnostics`.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Import {
    pub meshes: Vec<AssembledMesh>,
    pub placements: Vec<Placement>,
    pub materials: Vec<ResolvedMaterial>,
    pub images: Vec<ResolvedImage>,
    pub textures: Vec<Option<PathBuf>>,
    pub diagnostics: Diagnostics,
}

/// Imports MSFS glTF files. Create it once and import any number of files.
#[derive(Debug, Clone)]
pub struct AsoboImporter {
    options: ImportOptions,
    converter: Option<TextureConverter>,
}

impl Default for AsoboImporter {
    fn default() -> Self {
        Self::create(ImportOptions::default())
    }
}

impl AsoboImporter {
    pub fn create(options: ImportOptions) -> Self {
        let converter = options
            .converter
            .as_ref()
            .map(|exe| TextureConverter::new(exe.clone(), options.converted_dir.clone()));
        Self { options, converter }
    }

    /// Imports one file with its own set of converted textures.
    pub fn import_file(&self, path: &Path) -> Result<Import, Err> {
        self.import_file_with(path, &mut ConvertedSet::new())
    }

    /// Imports one file, reusing and extending `converted` so textures shared by
    /// several files are converted once.
    ///
    /// Only loading the document can fail. Every other problem degrades the
    /// affected part of the result and is reported in [`Import::diagnostics`].
    pub fn import_file_with(&self, path: &Path, converted: &mut ConvertedSet) -> Result<Import, Err> {
        let file = gltf::load(path)?;
        Ok(self.import(&file, converted))
    }

    pub fn import(&self, file: &GltfFile, converted: &mut ConvertedSet) -> Import {
        let doc = &file.document;
        let mut diagnostics = Diagnostics::new();

        let meshes = assembler::assemble_all(doc, &file.blob, &mut diagnostics);
        let placements = match scene::resolve(doc) {
            Ok(placements) => placements,
            Err(scene::Err::CycleDetected { node }) => {
                diagnostics.push(Diagnostic::CycleDetected { node });
                Vec::new()
            }
            Err(scene::Err::NodeOutOfRange(node)) => {
                diagnostics.push(Diagnostic::NodeOutOfRange { node });
                Vec::new()
            }
        };

        let texture_dir = texture::texture_dir(&file.path, &self.options.texture_folder);
        let fallbacks = if doc.images.is_empty() {
            fallback::FallbackSet::default()
        } else {
            fallback::collect_fallbacks(&texture_dir, self.options.base_install.as_deref(), &mut diagnostics)
        };
        let images = texture::resolve_images(doc, &fallbacks, self.converter.as_ref(), converted, &mut diagnostics);
        let textures = texture::resolve_textures(doc, &images, &mut diagnostics);
        let materials = texture::resolve_materials(doc, &textures);

        log::info!(
            "Imported '{}': {} meshes, {} placements, {} images, {} diagnostics",
            file.path.display(),
            meshes.len(),
            placements.len(),
            images.len(),
            diagnostics.len()
        );
        Import { meshes, placements, materials, images, textures, diagnostics }
    }
}
