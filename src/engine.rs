use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Where masscan usually lands when built from source.
pub const DEFAULT_BINARY: &str = "/usr/local/bin/masscan";

/// Invocation settings for the external scan engine.
///
/// Only non-empty fields contribute arguments; see [`EngineConfig::build_args`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub binary_path: PathBuf,
    /// Extra arguments passed through verbatim, ahead of the generated ones.
    pub args: Vec<String>,
    pub rate: String,
    pub exclude_file: String,
    pub ranges: String,
    pub input_file: String,
    pub ports: String,
    pub exclude: String,
    /// Where the engine writes its greppable (`-oL`) output.
    pub raw_outfile: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from(DEFAULT_BINARY),
            args: Vec::new(),
            rate: String::new(),
            exclude_file: String::new(),
            ranges: String::new(),
            input_file: String::new(),
            ports: String::new(),
            exclude: String::new(),
            raw_outfile: PathBuf::new(),
        }
    }
}

impl EngineConfig {
    pub fn new(raw_outfile: impl Into<PathBuf>) -> Self {
        Self {
            raw_outfile: raw_outfile.into(),
            ..Self::default()
        }
    }

    /// Assemble the engine argument list.
    ///
    /// Flag/value pairs are appended only for non-empty fields, in a fixed
    /// order so the invocation is reproducible: `--rate`, `--excludefile`,
    /// `--range`, `-iL`, `-p`, `--exclude`, and always `-oL <raw outfile>`
    /// last.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        for (flag, value) in [
            ("--rate", &self.rate),
            ("--excludefile", &self.exclude_file),
            ("--range", &self.ranges),
            ("-iL", &self.input_file),
            ("-p", &self.ports),
            ("--exclude", &self.exclude),
        ] {
            if !value.is_empty() {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args.push("-oL".to_string());
        args.push(self.raw_outfile.to_string_lossy().into_owned());
        args
    }

    /// Run the scan engine to completion, or until `cancel` fires.
    ///
    /// A missing binary is a setup error reported without spawning anything.
    /// On nonzero exit the captured stderr text becomes the error message
    /// when there is any, otherwise the exit status itself. Returns the
    /// captured stdout on success. Cancellation kills the subprocess.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        tokio::fs::metadata(&self.binary_path)
            .await
            .map_err(|e| Error::setup(&self.binary_path, format!("scan engine could not be run: {e}")))?;

        let args = self.build_args();
        info!(binary = %self.binary_path.display(), ?args, "launching scan engine");

        let child = Command::new(&self.binary_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::select! {
            out = child.wait_with_output() => out?,
            _ = cancel.cancelled() => {
                // Dropping the wait future drops the child, which kills it.
                return Err(Error::Subprocess {
                    message: "scan engine cancelled".to_string(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::Subprocess { message });
        }
        Ok(output.stdout)
    }

    /// Remove the raw output file. Best effort: an absent or undeletable
    /// file is reported, but prior parsed results stay valid.
    pub async fn clean(&self) -> Result<()> {
        tokio::fs::metadata(&self.raw_outfile).await?;
        tokio::fs::remove_file(&self.raw_outfile).await?;
        Ok(())
    }
}
