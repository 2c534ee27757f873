use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use asobo_gltf::prelude::{AsoboImporter, Import, ImportOptions};
use clap::Parser;

#[derive(Parser)]
#[command(name = "asobo-gltf-cli")]
#[command(about = "Imports MSFS glTF files and prints their geometry, scene and textures as JSON")]
struct Cli {
    /// Input .gltf file path
    #[arg(short, long, required_unless_present = "print_schema")]
    input: Option<PathBuf>,

    /// Texture folder name, or an absolute path
    #[arg(short, long, default_value = "TEXTURE")]
    textures: PathBuf,

    /// Simulator install directory used to resolve texture fallbacks
    #[arg(long)]
    base_install: Option<PathBuf>,

    /// DDS to PNG converter executable (texconv compatible)
    #[arg(long)]
    converter: Option<PathBuf>,

    /// Directory receiving converted textures
    #[arg(long)]
    converted_dir: Option<PathBuf>,

    /// Output JSON file path; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the JSON schema of the output and exit
    #[arg(long)]
    print_schema: bool,
}

impl Cli {
    fn options(&self) -> ImportOptions {
        let mut options = ImportOptions::new().with_texture_folder(&self.textures);
        if let Some(dir) = &self.base_install {
            options = options.with_base_install(dir);
        }
        if let Some(exe) = &self.converter {
            options = options.with_converter(exe);
        }
        if let Some(dir) = &self.converted_dir {
            options = options.with_converted_dir(dir);
        }
        options
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let json = if cli.print_schema {
        serde_json::to_string_pretty(&schemars::schema_for!(Import))?
    } else {
        let input = cli.input.as_ref().context("An input file is required")?;
        let import = AsoboImporter::create(cli.options())
            .import_file(input)
            .with_context(|| format!("Failed to import '{}'", input.display()))?;
        if !import.diagnostics.is_empty() {
            log::warn!("{} diagnostics while importing '{}'", import.diagnostics.len(), input.display());
        }
        serde_json::to_string_pretty(&import)?
    };

    match &cli.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write output file '{}'", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
