use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::dashboard::View;

// ---------------------------------------------------------------------------
// Interaction log entry (JSONL)
// ---------------------------------------------------------------------------

/// One line of `~/.credit-dashboard/interactions.jsonl`.
///
/// Records what the operator asked for and how the interaction ended. Read
/// back by `credit-dashboard history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionLogEntry {
    pub timestamp: String,
    /// Identifier as typed.
    pub input: String,
    /// Resolved client, when the lookup succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
    pub section: String,
    /// One of the [`crate::dashboard::Outcome`] names.
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub latency_ms: u64,
}

impl InteractionLogEntry {
    /// Build an entry for a finished interaction.
    pub fn from_view(input: &str, view: &View, latency_ms: u64) -> Self {
        let status_code = match view.outcome {
            crate::dashboard::Outcome::ApiStatus(code) => Some(code),
            _ => None,
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            input: input.to_string(),
            client_id: view.client_id,
            section: view.section.slug().to_string(),
            outcome: view.outcome.as_str().to_string(),
            status_code,
            latency_ms,
        }
    }

    /// Whether the interaction ended without an error.
    pub fn succeeded(&self) -> bool {
        self.outcome == "rendered" || self.outcome == "idle"
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append an entry when logging is enabled. Failures are ignored so a
/// read-only home directory never breaks the dashboard.
pub fn log_interaction(config: &LoggingConfig, entry: &InteractionLogEntry) {
    if !config.enabled {
        return;
    }
    if let Some(path) = interaction_log_path(config) {
        let _ = append_log_entry(&path, entry);
    }
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all entries from `path`.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_entries(path: &Path) -> Vec<InteractionLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<InteractionLogEntry>(&line).ok())
        .collect()
}

/// The `limit` most recent entries of the configured log, newest last.
pub fn read_recent(config: &LoggingConfig, limit: usize) -> Vec<InteractionLogEntry> {
    let Some(path) = interaction_log_path(config) else {
        return Vec::new();
    };
    let mut entries = read_entries(&path);
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    entries
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub(crate) fn append_log_entry(path: &Path, entry: &InteractionLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the interaction log file.
pub fn interaction_log_path(config: &LoggingConfig) -> Option<PathBuf> {
    config
        .path
        .clone()
        .or_else(|| crate::config::home_dir().map(|dir| dir.join("interactions.jsonl")))
}
