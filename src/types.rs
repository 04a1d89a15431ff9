use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed `open` record from the scan engine's greppable output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub status: String,
    pub protocol: String,
    pub port: u16,
    pub host: String,
}

impl ScanRecord {
    /// The verification job derived from this record.
    pub fn target(&self) -> Target {
        Target {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// A single host:port pair queued for verification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Counters for one pass over the raw output file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Accepted `open` records seen in the raw output.
    pub records: u64,
    /// Lines written to the parsed output. Equals `records` when
    /// verification is disabled.
    pub written: u64,
}
