//! Protect and restore commands - keep facts intact across an external rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use lexingest_core::{protect, restore, PlaceholderMap};

use super::{read_text_input, write_output};

/// Arguments for the protect command.
#[derive(Args)]
pub struct ProtectArgs {
    /// Text file to read (default: stdin)
    input: Option<PathBuf>,

    /// Output file for the protected text (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the placeholder map to this file and print only the protected text
    #[arg(short, long)]
    map_out: Option<PathBuf>,
}

/// Arguments for the restore command.
#[derive(Args)]
pub struct RestoreArgs {
    /// Rewritten text to read (default: stdin)
    input: Option<PathBuf>,

    /// Placeholder map written by `protect`
    #[arg(short, long, required = true)]
    map: PathBuf,

    /// Output file for the restored text (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with an error when placeholders were dropped by the rewrite
    #[arg(long)]
    strict: bool,
}

pub async fn run_protect(args: ProtectArgs) -> anyhow::Result<()> {
    let text = read_text_input(args.input.as_ref())?;
    let protected = protect(&text);
    info!("Protected {} facts", protected.map.len());

    match &args.map_out {
        Some(map_path) => {
            fs::write(map_path, serde_json::to_string_pretty(&protected.map)?)?;
            write_output(args.output.as_ref(), &protected.protected_text)?;
            eprintln!(
                "{} {} placeholders written to {}",
                style("✓").green(),
                protected.map.len(),
                map_path.display()
            );
        }
        None => {
            write_output(args.output.as_ref(), &serde_json::to_string_pretty(&protected)?)?;
        }
    }

    Ok(())
}

pub async fn run_restore(args: RestoreArgs) -> anyhow::Result<()> {
    let text = read_text_input(args.input.as_ref())?;
    let map = read_map(&args.map)?;

    let report = restore(&text, &map);
    write_output(args.output.as_ref(), &report.restored_text)?;

    if !report.is_intact() {
        eprintln!(
            "{} The rewrite dropped {} protected facts:",
            style("⚠").yellow(),
            report.missing_placeholders.len()
        );
        for placeholder in &report.missing_placeholders {
            eprintln!(
                "  - {} ({})",
                placeholder,
                map.get(placeholder).unwrap_or_default()
            );
        }
        if args.strict {
            anyhow::bail!("{} placeholders missing", report.missing_placeholders.len());
        }
    }

    Ok(())
}

/// Accepts either a bare map or the full `protect` JSON output.
fn read_map(path: &Path) -> anyhow::Result<PlaceholderMap> {
    if !path.exists() {
        anyhow::bail!("Map file not found: {}", path.display());
    }
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let map = match value.get("map") {
        Some(map) => serde_json::from_value(map.clone())?,
        None => serde_json::from_value(value)?,
    };
    Ok(map)
}
