pub mod conversion;
pub mod fallback;

use std::path::{Path, PathBuf};

use image::ImageFormat;
use schemars::JsonSchema;
use serde::Serialize;

use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::core::document::{Document, TextureInfo};
use conversion::{ConvertedSet, TextureConverter};
use fallback::FallbackSet;

/// Texture folder name of the standard SimObject layout.
pub const DEFAULT_TEXTURE_FOLDER: &str = "TEXTURE";

/// An image of the document and the local file it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ResolvedImage {
    pub uri: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct ResolvedMaterial {
    pub name: String,
    pub base_color: Option<PathBuf>,
    pub metallic_roughness: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    pub occlusion: Option<PathBuf>,
    pub emissive: Option<PathBuf>,
}

/// Root texture directory of a document.
///
/// An absolute `folder` is used as is. A relative one is looked up next to the
/// model folder, i.e. `<document>/../../<folder>`.
pub fn texture_dir(document_path: &Path, folder: &Path) -> PathBuf {
    if folder.is_absolute() {
        return folder.to_path_buf();
    }
    document_path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."))
        .join(folder)
}

pub fn is_dds(uri: &str) -> bool {
    matches!(ImageFormat::from_path(uri), Ok(ImageFormat::Dds))
}

/// PNG file standing in for a DDS image: `x.dds` and `x.png.dds` both become `x.png`.
pub fn png_substitute(uri: &str) -> String {
    let stem = Path::new(uri).with_extension("");
    let is_png = matches!(ImageFormat::from_path(&stem), Ok(ImageFormat::Png));
    let substitute = if is_png { stem } else { stem.with_extension("png") };
    substitute.to_string_lossy().into_owned()
}

/// Resolves every image of the document to a file in `fallbacks`.
///
/// With a converter, all DDS images found are converted in one batch. Without
/// one, each DDS image is replaced by its PNG sibling.
pub fn resolve_images(
    doc: &Document,
    fallbacks: &FallbackSet,
    converter: Option<&TextureConverter>,
    converted: &mut ConvertedSet,
    diagnostics: &mut Diagnostics,
) -> Vec<ResolvedImage> {
    let mut images = Vec::with_capacity(doc.images.len());
    let mut pending: Vec<Option<PathBuf>> = vec![None; doc.images.len()];

    for (index, image) in doc.images.iter().enumerate() {
        let Some(uri) = image.uri.clone() else {
            log::debug!("Image {} has no URI", index);
            images.push(ResolvedImage { uri: None, path: None });
            continue;
        };

        let path = match (is_dds(&uri), converter) {
            (true, Some(_)) => {
                pending[index] = find(fallbacks, &uri, diagnostics);
                None
            }
            (true, None) => {
                let substitute = png_substitute(&uri);
                diagnostics.push(Diagnostic::TextureSubstituted {
                    original: uri.clone(),
                    substitute: substitute.clone(),
                });
                find(fallbacks, &substitute, diagnostics)
            }
            (false, _) => find(fallbacks, &uri, diagnostics),
        };
        images.push(ResolvedImage { uri: Some(uri), path });
    }

    if let Some(converter) = converter {
        if pending.iter().any(Option::is_some) {
            let outputs = converter.convert(&pending, converted, diagnostics);
            for ((image, source), output) in images.iter_mut().zip(&pending).zip(outputs) {
                if source.is_some() {
                    image.path = output;
                }
            }
        }
    }
    images
}

fn find(fallbacks: &FallbackSet, uri: &str, diagnostics: &mut Diagnostics) -> Option<PathBuf> {
    let found = fallbacks.find(Path::new(uri));
    if found.is_none() {
        diagnostics.push(Diagnostic::TextureNotFound { uri: uri.to_string() });
    }
    found
}

/// File of every texture, following `MSFT_texture_dds` before `source`.
pub fn resolve_textures(
    doc: &Document,
    images: &[ResolvedImage],
    diagnostics: &mut Diagnostics,
) -> Vec<Option<PathBuf>> {
    doc.textures
        .iter()
        .enumerate()
        .map(|(index, texture)| match texture.image_index().and_then(|i| images.get(i)) {
            Some(image) => image.path.clone(),
            None => {
                diagnostics.push(Diagnostic::UnresolvedTexture { texture: index });
                None
            }
        })
        .collect()
}

pub fn resolve_materials(doc: &Document, textures: &[Option<PathBuf>]) -> Vec<ResolvedMaterial> {
    let path = |info: Option<&TextureInfo>| info.and_then(|t| textures.get(t.index)).cloned().flatten();

    doc.materials
        .iter()
        .enumerate()
        .map(|(index, material)| {
            let pbr = material.pbr_metallic_roughness.as_ref();
            ResolvedMaterial {
                name: doc.material_name(index).unwrap_or_default(),
                base_color: path(pbr.and_then(|p| p.base_color_texture.as_ref())),
                metallic_roughness: path(pbr.and_then(|p| p.metallic_roughness_texture.as_ref())),
                normal: path(material.normal_texture.as_ref()),
                occlusion: path(material.occlusion_texture.as_ref()),
                emissive: path(material.emissive_texture.as_ref()),
            }
        })
        .collect()
}
