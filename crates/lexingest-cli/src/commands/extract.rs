//! Extract command - pull text out of a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use lexingest_core::extraction::FanOutObserver;
use lexingest_core::{
    extract_fields, AttemptEvent, Document, ExtractOptions, ExtractionObserver, ExtractionOutcome,
    MimeClass, Orchestrator, PathTaken, RecordingObserver, StructuredPolicyFields, TracingObserver,
};

use super::{load_config, write_output};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input document (PDF, image, DOCX, text or JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// MIME type; guessed from the extension when omitted
    #[arg(long)]
    mime: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ExtractFormat,

    /// Skip the native text layer
    #[arg(long)]
    force_ocr: bool,

    /// Maximum pages scanned by local OCR
    #[arg(long)]
    ocr_pages: Option<usize>,

    /// Use the strict analysis cascade (text layer, then one cloud job)
    #[arg(long)]
    analysis: bool,

    /// Also extract structured policy fields
    #[arg(long)]
    with_fields: bool,

    /// Report every strategy attempt
    #[arg(long)]
    trace_attempts: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ExtractFormat {
    /// Extracted text only
    Text,
    /// JSON report with path taken and confidence
    Json,
}

/// JSON report for one document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractReport {
    pub file: String,
    pub mime_type: String,
    pub text: Option<String>,
    pub path_taken: PathTaken,
    pub low_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<StructuredPolicyFields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptEvent>,
}

impl ExtractReport {
    pub fn new(path: &Path, document: &Document, outcome: ExtractionOutcome) -> Self {
        let error = outcome
            .error(document.mime_class(), document.mime_type())
            .map(|e| e.to_string());
        Self {
            file: path.display().to_string(),
            mime_type: document.mime_type().to_string(),
            text: outcome.text,
            path_taken: outcome.path_taken,
            low_confidence: outcome.low_confidence,
            error,
            fields: None,
            attempts: Vec::new(),
        }
    }

    pub fn with_fields(mut self) -> Self {
        self.fields = self.text.as_deref().map(extract_fields);
        self
    }
}

/// Read a file into a document, resolving its MIME type.
pub fn read_document(path: &Path, mime: Option<&str>) -> anyhow::Result<Document> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let mime_type = match mime {
        Some(mime) => mime.to_string(),
        None => MimeClass::mime_for_path(path)
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot determine MIME type of {}; pass --mime",
                    path.display()
                )
            })?,
    };

    let bytes = fs::read(path)?;
    debug!("Read {} bytes from {} as {}", bytes.len(), path.display(), mime_type);
    Ok(Document::new(bytes, mime_type))
}

/// Run the standard or the analysis cascade.
pub fn extract_document(
    orchestrator: &Orchestrator,
    document: &Document,
    options: &ExtractOptions,
    analysis: bool,
) -> ExtractionOutcome {
    if analysis {
        orchestrator.extract_for_analysis(document, options)
    } else {
        orchestrator.extract(document, options)
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let document = read_document(&args.input, args.mime.as_deref())?;
    info!("Extracting text from {}", args.input.display());

    let recorder = Arc::new(RecordingObserver::new());
    let observer: Option<Arc<dyn ExtractionObserver>> = args.trace_attempts.then(|| {
        let observers: Vec<Arc<dyn ExtractionObserver>> =
            vec![Arc::new(TracingObserver), recorder.clone()];
        Arc::new(FanOutObserver::new(observers)) as Arc<dyn ExtractionObserver>
    });

    let options = ExtractOptions {
        max_ocr_pages: args.ocr_pages,
        force_ocr: args.force_ocr,
    };
    let analysis = args.analysis;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting text...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    // Cloud clients block; they are built, used and dropped off the runtime
    let (document, outcome) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let mut orchestrator = Orchestrator::from_config(&config)?;
        if let Some(observer) = observer {
            orchestrator = orchestrator.with_observer(observer);
        }
        let outcome = extract_document(&orchestrator, &document, &options, analysis);
        Ok((document, outcome))
    })
    .await??;

    pb.finish_and_clear();

    let mut report = ExtractReport::new(&args.input, &document, outcome);
    if args.with_fields {
        report = report.with_fields();
    }
    report.attempts = recorder.events();

    if args.trace_attempts {
        print_attempts(&report.attempts);
    }

    match args.format {
        ExtractFormat::Json => {
            write_output(args.output.as_ref(), &serde_json::to_string_pretty(&report)?)?;
        }
        ExtractFormat::Text => {
            let Some(text) = report.text.as_deref() else {
                anyhow::bail!(
                    "{}",
                    report.error.as_deref().unwrap_or("No text could be extracted")
                );
            };
            write_output(args.output.as_ref(), text)?;
            if let Some(fields) = &report.fields {
                eprintln!();
                for (name, value) in fields.entries() {
                    if !value.is_empty() {
                        eprintln!("{:>18}: {}", style(name).cyan(), value);
                    }
                }
            }
        }
    }

    if report.low_confidence {
        eprintln!(
            "{} Text came from recognition or a short text layer; review before relying on it",
            style("⚠").yellow()
        );
    }

    debug!("Total extraction time: {:?}", start.elapsed());

    Ok(())
}

fn print_attempts(events: &[AttemptEvent]) {
    eprintln!("{}", style("Attempts:").bold());
    for event in events {
        let status = if event.succeeded {
            style("ok").green()
        } else {
            style("no text").red()
        };
        eprintln!(
            "  {:<22} {:<8} {:>6}ms {:>7} chars {}",
            event.strategy.name(),
            status,
            event.duration_ms,
            event.text_length,
            event.error_reason.as_deref().unwrap_or("")
        );
    }
}
