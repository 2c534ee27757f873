use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::diagnostics::{Diagnostic, Diagnostics};

/// Prefix of the converter's stdout lines announcing one produced file.
pub const CONVERTED_PREFIX: &str = "writing ";

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Could not create output directory '{}': {reason}", .path.display())]
    CreateOutputDir { path: PathBuf, reason: String },
    #[error("Converter exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("Could not start '{}': {reason}", .executable.display())]
    Spawn { executable: PathBuf, reason: String },
}

/// Source to output mapping of the conversions done for one import.
///
/// Sources already present are not converted again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedSet {
    outputs: HashMap<PathBuf, PathBuf>,
}

impl ConvertedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &Path) -> Option<&PathBuf> {
        self.outputs.get(source)
    }

    pub fn contains(&self, source: &Path) -> bool {
        self.outputs.contains_key(source)
    }

    pub fn insert(&mut self, source: PathBuf, output: PathBuf) {
        self.outputs.insert(source, output);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// External DDS to PNG converter, invoked as
/// `<exe> -y -o <output_dir> -f rgba -ft png <sources...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureConverter {
    executable: PathBuf,
    output_dir: PathBuf,
}

impl TextureConverter {
    pub fn new(executable: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into(), output_dir: output_dir.into() }
    }

    pub fn command(&self, sources: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("-y")
            .arg("-o")
            .arg(&self.output_dir)
            .args(["-f", "rgba", "-ft", "png"])
            .args(sources);
        command
    }

    /// Runs the converter once over `sources` and returns the reported outputs in order.
    pub fn run(&self, sources: &[PathBuf]) -> Result<Vec<PathBuf>, Err> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Err::CreateOutputDir {
            path: self.output_dir.clone(),
            reason: e.to_string(),
        })?;

        log::info!("Converting {} textures with '{}'", sources.len(), self.executable.display());
        let output = self.command(sources).output().map_err(|e| Err::Spawn {
            executable: self.executable.clone(),
            reason: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(Err::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_report(&String::from_utf8_lossy(&output.stdout), &self.output_dir))
    }

    /// Converts every known source in one batch and returns one slot per input.
    ///
    /// `None` inputs are gaps and stay `None`. The Nth reported output belongs to
    /// the Nth distinct unconverted source. A failed invocation turns every slot
    /// into `None` and records a single diagnostic.
    pub fn convert(
        &self,
        sources: &[Option<PathBuf>],
        converted: &mut ConvertedSet,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Option<PathBuf>> {
        let dense = dense_sources(sources, converted);
        if !dense.is_empty() {
            match self.run(&dense) {
                Ok(reports) => record(&dense, reports, converted, diagnostics),
                Err(e) => {
                    diagnostics.push(Diagnostic::ConverterInvocationFailed { reason: e.to_string() });
                    return vec![None; sources.len()];
                }
            }
        }
        lookup(sources, converted)
    }
}

/// Output paths announced on stdout, relative ones resolved against `output_dir`.
pub fn parse_report(stdout: &str, output_dir: &Path) -> Vec<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(CONVERTED_PREFIX))
        .map(|path| path.trim())
        .filter(|path| !path.is_empty())
        .map(|path| {
            let path = Path::new(path);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                output_dir.join(path)
            }
        })
        .collect()
}

/// Distinct known sources not converted yet, in first-seen order.
pub fn dense_sources(sources: &[Option<PathBuf>], converted: &ConvertedSet) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut dense = Vec::new();
    for source in sources.iter().flatten() {
        if !converted.contains(source) && seen.insert(source) {
            dense.push(source.clone());
        }
    }
    dense
}

fn record(dense: &[PathBuf], reports: Vec<PathBuf>, converted: &mut ConvertedSet, diagnostics: &mut Diagnostics) {
    if reports.len() < dense.len() {
        diagnostics.push(Diagnostic::ConverterReportMismatch {
            expected: dense.len(),
            reported: reports.len(),
        });
    }
    for (source, output) in dense.iter().zip(reports) {
        log::debug!("Converted '{}' to '{}'", source.display(), output.display());
        converted.insert(source.clone(), output);
    }
}

fn lookup(sources: &[Option<PathBuf>], converted: &ConvertedSet) -> Vec<Option<PathBuf>> {
    sources
        .iter()
        .map(|source| source.as_deref().and_then(|s| converted.get(s)).cloned())
        .collect()
}
