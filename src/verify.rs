use crate::types::Target;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time;
use tracing::debug;

/// Per-target connect ceiling. The dial is bounded by this timer only; there
/// is no cooperative cancellation of an in-flight connect.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Worker count used when the configured value is zero.
pub const DEFAULT_WORKERS: usize = 5;

/// Probe a single target with a bare TCP connect.
///
/// Returns true if the connect succeeds within `timeout`; the stream is
/// dropped immediately, nothing is sent or read. Any dial error (refused,
/// unreachable, DNS failure, timeout) is logged and reported as false —
/// a failed probe means "not open", never a pipeline fault.
pub async fn verify_target(target: &Target, timeout: Duration) -> bool {
    let addr = target.to_string();
    match time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            debug!(addr = %target, error = %e, "verification dial failed");
            false
        }
        Err(_) => {
            debug!(addr = %target, timeout_ms = timeout.as_millis() as u64, "verification dial timed out");
            false
        }
    }
}

/// Spawn the verification worker pool.
///
/// Exactly `workers` tasks (or [`DEFAULT_WORKERS`] if zero) share the job
/// receiver; each pulls targets until the channel is closed and drained,
/// probing at most one target at a time, so no more than `workers` dials are
/// ever outstanding. Verified targets go to `results`.
///
/// Every worker holds its own clone of the result sender and the one passed
/// in is dropped here, so the result channel closes exactly when the last
/// worker finishes — the receiver observing `None` implies all in-flight
/// work is done. The returned [`JoinSet`] lets the caller also join the
/// workers themselves.
pub fn spawn_pool(
    jobs: mpsc::Receiver<Target>,
    results: mpsc::Sender<Target>,
    workers: usize,
    timeout: Duration,
) -> JoinSet<()> {
    let workers = if workers > 0 { workers } else { DEFAULT_WORKERS };
    let jobs = Arc::new(Mutex::new(jobs));
    let mut set = JoinSet::new();
    for _ in 0..workers {
        let jobs = Arc::clone(&jobs);
        let results = results.clone();
        set.spawn(async move {
            loop {
                // Hold the lock only for the receive; the dial itself runs
                // unlocked so workers probe concurrently.
                let job = { jobs.lock().await.recv().await };
                let Some(target) = job else { break };
                if verify_target(&target, timeout).await {
                    // Receiver gone means the run is being torn down.
                    if results.send(target).await.is_err() {
                        break;
                    }
                }
            }
        });
    }
    set
}
