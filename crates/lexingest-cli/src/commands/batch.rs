//! Batch command - extract text and fields from many documents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use lexingest_core::{ExtractOptions, MimeClass, Orchestrator, PathTaken};

use super::extract::{extract_document, read_document, ExtractReport};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern selecting input files
    #[arg(required = true)]
    input: String,

    /// JSON-lines output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a CSV summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Use the strict analysis cascade
    #[arg(long)]
    analysis: bool,

    /// Maximum pages scanned by local OCR
    #[arg(long)]
    ocr_pages: Option<usize>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct BatchResult {
    path: PathBuf,
    report: Option<ExtractReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && MimeClass::mime_for_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let options = ExtractOptions {
        max_ocr_pages: args.ocr_pages,
        force_ocr: false,
    };
    let analysis = args.analysis;
    let continue_on_error = args.continue_on_error;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    let worker_pb = pb.clone();

    // Cloud clients block; the whole run stays off the runtime
    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<BatchResult>> {
        let orchestrator = Orchestrator::from_config(&config)?;
        let mut results = Vec::with_capacity(files.len());

        for path in files {
            let file_start = Instant::now();
            let result = process_file(&path, &orchestrator, &options, analysis);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match result {
                Ok(report) => results.push(BatchResult {
                    path,
                    report: Some(report),
                    error: None,
                    processing_time_ms,
                }),
                Err(e) => {
                    let error_msg = e.to_string();
                    if !continue_on_error {
                        error!("Failed to process {}: {}", path.display(), error_msg);
                        anyhow::bail!("Processing failed: {}", error_msg);
                    }
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(BatchResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                }
            }

            worker_pb.inc(1);
        }

        Ok(results)
    })
    .await??;

    pb.finish_and_clear();

    write_lines(args.output.as_deref(), &results)?;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results
        .iter()
        .filter(|r| r.report.as_ref().is_none_or(|report| report.text.is_none()))
        .count();

    eprintln!(
        "{} Processed {} files in {:?}: {} with text, {} without",
        style("✓").green(),
        results.len(),
        start.elapsed(),
        style(results.len() - failed).green(),
        style(failed).red()
    );

    Ok(())
}

fn process_file(
    path: &Path,
    orchestrator: &Orchestrator,
    options: &ExtractOptions,
    analysis: bool,
) -> anyhow::Result<ExtractReport> {
    let document = read_document(path, None)?;
    let outcome = extract_document(orchestrator, &document, options, analysis);
    debug!("{}: path taken {:?}", path.display(), outcome.path_taken);
    Ok(ExtractReport::new(path, &document, outcome).with_fields())
}

fn write_lines(output: Option<&Path>, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };

    for result in results {
        let line = match &result.report {
            Some(report) => serde_json::to_string(report)?,
            None => serde_json::json!({
                "file": result.path.display().to_string(),
                "error": result.error,
            })
            .to_string(),
        };
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "path_taken",
        "low_confidence",
        "text_length",
        "insured_name",
        "market_ref",
        "certificate_ref",
        "policy_period_start",
        "policy_period_end",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        match &result.report {
            Some(report) => {
                let fields = report.fields.clone().unwrap_or_default();
                let status = if report.text.is_some() { "success" } else { "no_text" };
                let path_taken = match report.path_taken {
                    PathTaken::Strategy(kind) => kind.name(),
                    PathTaken::None => "none",
                };
                let text_length = report
                    .text
                    .as_ref()
                    .map(|t| t.chars().count())
                    .unwrap_or(0)
                    .to_string();
                wtr.write_record([
                    filename,
                    status,
                    path_taken,
                    if report.low_confidence { "true" } else { "false" },
                    &text_length,
                    &fields.insured_name,
                    &fields.market_ref,
                    &fields.certificate_ref,
                    &fields.policy_period_start,
                    &fields.policy_period_end,
                    &time,
                    report.error.as_deref().unwrap_or(""),
                ])?;
            }
            None => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &time,
                    result.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
