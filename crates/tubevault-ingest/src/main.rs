//! Command-line ingestion of a single video.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tubevault_ingest::Orchestrator;
use tubevault_models::{IngestOptions, ProcessVideoResult};

#[derive(Parser)]
#[command(name = "tubevault-ingest")]
#[command(about = "Store a YouTube video, its metadata and its transcript in object storage")]
struct Cli {
    /// Video URL or 11-character video ID
    input: String,

    /// Skip fetching and storing metadata.json
    #[arg(long)]
    no_metadata: bool,

    /// Skip fetching and storing transcript.json
    #[arg(long)]
    no_transcript: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let options = IngestOptions {
        fetch_metadata: !cli.no_metadata,
        fetch_transcript: !cli.no_transcript,
    };

    let orchestrator = Orchestrator::from_env().await?;
    info!(input = %cli.input, "Starting ingest");

    let report = orchestrator.ingest_report(&cli.input, options).await;
    let result = ProcessVideoResult::from(&report.outcome);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match (&result.file_path, &result.error) {
            (Some(path), _) => println!("Stored: {}", path),
            (None, Some(error)) => println!("Failed: {}", error),
            (None, None) => println!("Failed"),
        }
        for warning in &report.warnings {
            println!("Warning: {}", warning);
        }
        if !report.timings.is_empty() {
            println!("Timings: {}", report.timings.summary());
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
