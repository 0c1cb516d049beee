pub mod batch;
pub mod config;
pub mod extract;
pub mod fields;
pub mod protect;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use lexingest_core::LexConfig;

/// Resolve the effective configuration.
///
/// An explicit `--config` path must exist. Otherwise the per-user file is used
/// when present. Environment variables are applied last.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LexConfig> {
    let mut config = match config_path {
        Some(path) => LexConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                debug!("Using config file {}", default_path.display());
                LexConfig::from_file(&default_path)?
            } else {
                LexConfig::default()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Read text from a file, or from stdin when the path is absent or `-`.
pub fn read_text_input(input: Option<&PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            Ok(fs::read_to_string(path)?)
        }
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Write to a file when given, otherwise to stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            debug!("Output written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
