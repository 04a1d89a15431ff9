use crate::error::{Error, Result};
use crate::parse::parse_result_line;
use crate::types::{ParseSummary, Target};
use crate::verify::{self, DEFAULT_VERIFY_TIMEOUT};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How the raw output gets turned into the parsed output.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Re-probe every open record with a live TCP connect before writing it.
    pub verify: bool,
    /// Verification worker count; zero means the pool default.
    pub workers: usize,
    /// Per-target connect timeout.
    pub timeout: Duration,
    /// Stops feeding new targets when triggered. In-flight dials still run
    /// to their timeout; cancellation is best effort, not instantaneous.
    pub cancel: CancellationToken,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            verify: false,
            workers: verify::DEFAULT_WORKERS,
            timeout: DEFAULT_VERIFY_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }
}

/// Parse the engine's raw output at `raw_path` into `host:port` lines at
/// `parsed_path`, optionally verifying each record first.
///
/// The parsed file is created fresh on every run (no append). A missing raw
/// file or an uncreatable parsed file is a setup error reported before any
/// verification work starts.
pub async fn parse_results(
    raw_path: impl AsRef<Path>,
    parsed_path: impl AsRef<Path>,
    options: ParseOptions,
) -> Result<ParseSummary> {
    let raw_path = raw_path.as_ref();
    let parsed_path = parsed_path.as_ref();

    tokio::fs::metadata(raw_path)
        .await
        .map_err(|e| Error::setup(raw_path, e))?;
    let sink = File::create(parsed_path)
        .await
        .map_err(|e| Error::setup(parsed_path, e))?;
    let mut sink = BufWriter::new(sink);
    let source = File::open(raw_path)
        .await
        .map_err(|e| Error::setup(raw_path, e))?;
    let lines = BufReader::new(source).lines();

    let summary = if options.verify {
        parse_verified(lines, &mut sink, &options).await?
    } else {
        parse_sequential(lines, &mut sink, &options.cancel).await?
    };

    sink.flush().await?;
    info!(
        records = summary.records,
        written = summary.written,
        "parsed {}",
        raw_path.display()
    );
    Ok(summary)
}

/// Verification off: every accepted record goes straight to the sink, in
/// input order.
async fn parse_sequential(
    mut lines: Lines<BufReader<File>>,
    sink: &mut BufWriter<File>,
    cancel: &CancellationToken,
) -> Result<ParseSummary> {
    let mut summary = ParseSummary::default();
    while let Some(line) = lines.next_line().await? {
        if cancel.is_cancelled() {
            break;
        }
        if let Some(record) = parse_result_line(&line) {
            summary.records += 1;
            sink.write_all(format!("{}\n", record.target()).as_bytes())
                .await?;
            summary.written += 1;
        }
    }
    Ok(summary)
}

/// Verification on: a feeder task parses lines into the job channel, the
/// worker pool probes them, and this task drains verified targets into the
/// sink. Three completion signals are awaited before returning: the result
/// channel closing (which the pool guarantees happens only after every
/// worker has exited), the feeder join, and the worker join set draining.
async fn parse_verified(
    mut lines: Lines<BufReader<File>>,
    sink: &mut BufWriter<File>,
    options: &ParseOptions,
) -> Result<ParseSummary> {
    // Rendezvous-sized channels: the hand-off itself is the synchronization.
    let (job_tx, job_rx) = mpsc::channel::<Target>(1);
    let (result_tx, mut result_rx) = mpsc::channel::<Target>(1);

    let mut workers = verify::spawn_pool(job_rx, result_tx, options.workers, options.timeout);

    let cancel = options.cancel.clone();
    let feeder = tokio::spawn(async move {
        let mut records = 0u64;
        while let Some(line) = lines.next_line().await? {
            if cancel.is_cancelled() {
                debug!("cancelled, not feeding further targets");
                break;
            }
            if let Some(record) = parse_result_line(&line) {
                records += 1;
                if job_tx.send(record.target()).await.is_err() {
                    break;
                }
            }
        }
        // Dropping job_tx closes the job channel; workers drain and exit.
        Ok::<u64, std::io::Error>(records)
    });

    let mut written = 0u64;
    while let Some(target) = result_rx.recv().await {
        sink.write_all(format!("{target}\n").as_bytes()).await?;
        written += 1;
    }

    let records = feeder
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;
    while workers.join_next().await.is_some() {}

    Ok(ParseSummary { records, written })
}
