//! Persisting finished matches
//!
//! Recording is best-effort: the orchestrator logs a failed write and carries
//! on, so a broken store never blocks a match from ending.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::error::Result;
use crate::orchestrator::stats::MatchStats;

/// Sink for end-of-match statistics
pub trait MatchRecorder: Send {
    fn record_match_result(&mut self, stats: &MatchStats) -> Result<()>;
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl MatchRecorder for NullRecorder {
    fn record_match_result(&mut self, _stats: &MatchStats) -> Result<()> {
        Ok(())
    }
}

/// Keeps results in memory; clones share the same list
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<MatchStats>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn records(&self) -> Vec<MatchStats> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl MatchRecorder for MemoryRecorder {
    fn record_match_result(&mut self, stats: &MatchStats) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(stats.clone());
        Ok(())
    }
}

/// Appends one JSON object per match to a file
#[derive(Debug, Clone)]
pub struct JsonLinesRecorder {
    path: PathBuf,
}

impl JsonLinesRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<MatchStats>> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl MatchRecorder for JsonLinesRecorder {
    fn record_match_result(&mut self, stats: &MatchStats) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(stats)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;

        tracing::debug!(path = %self.path.display(), match_id = %stats.match_id.0, "Match result recorded");
        Ok(())
    }
}
