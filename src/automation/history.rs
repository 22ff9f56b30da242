use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;
use crate::types::{Action, AcMode, Power};

/// One automation run, as appended to the decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub created_at: DateTime<Utc>,
    pub room_temperature: Option<f64>,
    pub room_humidity: Option<f64>,
    pub outside_temperature: Option<f64>,
    pub ac_power: Option<Power>,
    pub ac_temperature: Option<i32>,
    pub ac_mode: Option<AcMode>,
    pub action: Action,
    pub reasoning: String,
    pub executed: bool,
}

/// Append-only NDJSON decision log.
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DecisionRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Up to `limit` records, newest first. A missing file is an empty history.
    pub fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<DecisionRecord> = contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str(l) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("skipping malformed decision log line: {e}");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}
