//! Fields command - structured policy metadata from plain text.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use lexingest_core::{extract_fields, StructuredPolicyFields};

use super::{read_text_input, write_output};

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// Text file to read (default: stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON object with camelCase keys
    Json,
    /// CSV with a header row
    Csv,
    /// One `name: value` line per field
    Text,
}

pub async fn run(args: FieldsArgs) -> anyhow::Result<()> {
    let text = read_text_input(args.input.as_ref())?;
    let fields = extract_fields(&text);

    let found = fields.entries().iter().filter(|(_, v)| !v.is_empty()).count();
    info!("Recovered {} of {} fields", found, StructuredPolicyFields::FIELD_NAMES.len());

    let output = format_fields(&fields, args.format)?;
    write_output(args.output.as_ref(), output.trim_end())
}

pub fn format_fields(fields: &StructuredPolicyFields, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
        OutputFormat::Csv => format_csv(fields),
        OutputFormat::Text => Ok(format_text(fields)),
    }
}

fn format_csv(fields: &StructuredPolicyFields) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let entries = fields.entries();

    wtr.write_record(entries.iter().map(|(name, _)| *name))?;
    wtr.write_record(entries.iter().map(|(_, value)| *value))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(fields: &StructuredPolicyFields) -> String {
    let mut output = String::new();
    for (name, value) in fields.entries() {
        output.push_str(&format!("{}: {}\n", name, value));
    }
    output
}
