use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::playback::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

/// One executed command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub session: SessionId,
    pub command: String,
    pub outcome: Outcome,
    /// Cursor and pending length once the command finished.
    pub cursor: usize,
    pub pending: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JournalEntry {
    pub fn new(session: SessionId, command: impl Into<String>, outcome: Outcome) -> Self {
        JournalEntry {
            timestamp: Utc::now(),
            session,
            command: command.into(),
            outcome,
            cursor: 0,
            pending: 0,
            message: None,
        }
    }

    pub fn with_position(mut self, cursor: usize, pending: usize) -> Self {
        self.cursor = cursor;
        self.pending = pending;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn append(path: &Path, entry: &JournalEntry) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open journal {:?}", path))?;

        let line =
            serde_json::to_string(entry).with_context(|| "Failed to serialize journal entry")?;

        writeln!(file, "{}", line).with_context(|| "Failed to write to journal")
    }

    pub fn read_all(path: &Path) -> anyhow::Result<Vec<JournalEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read journal {:?}", path))?;

        content
            .lines()
            .filter(|ln| !ln.trim().is_empty())
            .map(|ln| {
                serde_json::from_str(ln)
                    .with_context(|| format!("Failed to parse journal line: {}", ln))
            })
            .collect()
    }
}
