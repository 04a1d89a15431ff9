use std::path::PathBuf;
use std::time::Duration;

use mass_verify_rs::engine::{EngineConfig, DEFAULT_BINARY};
use mass_verify_rs::pipeline::{self, ParseOptions};
use mass_verify_rs::types::ParseSummary;
use mass_verify_rs::verify::DEFAULT_WORKERS;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use tokio_util::sync::CancellationToken;

/// mass-verify-rs — drive a masscan sweep, verify reported open ports with
/// real TCP connects, and write the survivors as host:port lines.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mass-verify-rs",
    version,
    about = "Masscan orchestration with concurrent TCP verification of reported open ports.",
    long_about = None
)]
struct Cli {
    /// Path to the masscan binary.
    #[arg(long, default_value = DEFAULT_BINARY)]
    binary: PathBuf,

    /// Port spec passed to the engine (e.g., 80,443 or 0-65535).
    #[arg(long, default_value = "")]
    ports: String,

    /// Address ranges to sweep (e.g., 10.0.0.0/8).
    #[arg(long, default_value = "")]
    ranges: String,

    /// Engine packet rate.
    #[arg(long, default_value = "")]
    rate: String,

    /// Addresses to exclude from the sweep.
    #[arg(long, default_value = "")]
    exclude: String,

    /// File of addresses to exclude from the sweep.
    #[arg(long = "exclude-file", default_value = "")]
    exclude_file: String,

    /// File of target addresses, one per line (engine -iL).
    #[arg(long = "input-file", default_value = "")]
    input_file: String,

    /// Where the engine writes its raw greppable output.
    #[arg(long = "raw-out", default_value = "masscan.out")]
    raw_out: PathBuf,

    /// Where verified/accepted host:port lines are written.
    #[arg(long, default_value = "parsed.out")]
    out: PathBuf,

    /// Extra arguments passed to the engine verbatim.
    #[arg(long = "engine-arg")]
    engine_args: Vec<String>,

    /// Re-probe every open record with a TCP connect before accepting it.
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Concurrent verification workers.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Verification connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Write run counters as pretty JSON to this path (optional).
    #[arg(long = "summary-json")]
    summary_json: Option<PathBuf>,

    /// Keep the raw engine output file instead of removing it.
    #[arg(long = "keep-raw", default_value_t = false)]
    keep_raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    println!("mass-verify-rs configuration:");
    println!("  binary      : {}", cli.binary.display());
    println!("  ports       : {}", or_none(&cli.ports));
    println!("  ranges      : {}", or_none(&cli.ranges));
    println!("  rate        : {}", or_none(&cli.rate));
    println!("  raw out     : {}", cli.raw_out.display());
    println!("  parsed out  : {}", cli.out.display());
    println!("  verify      : {}", cli.verify);
    if cli.verify {
        println!("  workers     : {}", cli.workers);
        println!("  timeout_ms  : {}", cli.timeout_ms);
    }

    // Ctrl-C cancels the sweep and stops feeding verification targets.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let engine = EngineConfig {
        binary_path: cli.binary,
        args: cli.engine_args,
        rate: cli.rate,
        exclude_file: cli.exclude_file,
        ranges: cli.ranges,
        input_file: cli.input_file,
        ports: cli.ports,
        exclude: cli.exclude,
        raw_outfile: cli.raw_out.clone(),
    };

    engine
        .run(&cancel)
        .await
        .context("scan engine run failed")?;

    let options = ParseOptions {
        verify: cli.verify,
        workers: cli.workers,
        timeout: Duration::from_millis(cli.timeout_ms),
        cancel,
    };
    let summary = pipeline::parse_results(&cli.raw_out, &cli.out, options)
        .await
        .context("parsing scan results failed")?;

    println!(
        "\nOpen records: {} | written to {}: {}",
        summary.records,
        cli.out.display(),
        summary.written
    );
    if let Some(path) = cli.summary_json.as_deref() {
        if let Err(e) = write_summary_json(path, &summary) {
            eprintln!("Failed to write JSON summary to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON summary to {}", path.display());
        }
    }

    if !cli.keep_raw {
        if let Err(e) = engine.clean().await {
            eprintln!("Warning: could not remove raw output: {e}");
        }
    }

    Ok(())
}

fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "<none>"
    } else {
        s
    }
}

fn write_summary_json(path: &std::path::Path, summary: &ParseSummary) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
