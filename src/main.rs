//! Main entry point for the export translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod core;
mod processors;

/// Bulk AI translator for structured database exports
#[derive(Parser, Debug)]
#[command(name = "export-translator", version, about, long_about = None)]
struct Args {
    /// Input JSON export file
    #[arg(long)]
    input: PathBuf,

    /// Output JSON file
    #[arg(long)]
    output: PathBuf,

    /// Target language name (e.g. French, Spanish)
    #[arg(long, default_value = "English")]
    lang: String,

    /// API key (optional, defaults to GROQ_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model identifier override
    #[arg(long)]
    model: Option<String>,

    /// Batch size override
    #[arg(long)]
    batch_size: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Override config with CLI args if provided
    if let Some(api_key) = args.api_key {
        std::env::set_var("GROQ_API_KEY", api_key);
    }

    if let Some(model) = args.model {
        std::env::set_var("MODEL_ID", model);
    }

    if let Some(batch_size) = args.batch_size {
        std::env::set_var("BATCH_SIZE", batch_size.to_string());
    }

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    // Initialize logging
    let log_level = if std::env::var("RUST_LOG").is_ok() {
        std::env::var("RUST_LOG").unwrap()
    } else {
        "info".to_string()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::commands::handle_translate(args.input, args.output, args.lang).await?;

    Ok(())
}
