//! CLI for document ingestion, policy field extraction, and fact protection.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, extract, fields, protect};

/// Extract text and policy metadata from uploaded documents
#[derive(Parser)]
#[command(name = "lexingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single document
    Extract(extract::ExtractArgs),

    /// Extract structured policy fields from text
    Fields(fields::FieldsArgs),

    /// Replace facts with placeholders before rewriting
    Protect(protect::ProtectArgs),

    /// Restore placeholders after rewriting
    Restore(protect::RestoreArgs),

    /// Extract text and fields from many documents
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Fields(args) => fields::run(args).await,
        Commands::Protect(args) => protect::run_protect(args).await,
        Commands::Restore(args) => protect::run_restore(args).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
