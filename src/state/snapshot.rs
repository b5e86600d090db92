use std::{fs, path::Path};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::playback::{Action, Queue, SessionId};
use crate::provider::{Item, ProviderKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub title: String,
    pub duration_seconds: u32,
    pub provider: ProviderKind,
    #[serde(default)]
    pub playlist: bool,
    #[serde(default)]
    pub broken: bool,
}

impl From<&Item> for SnapshotItem {
    fn from(item: &Item) -> Self {
        SnapshotItem {
            title: item.title.clone(),
            duration_seconds: item.duration_seconds,
            provider: item.provider,
            playlist: item.is_playlist_member,
            broken: item.broken,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAction {
    pub id: u64,
    pub name: String,
    pub author: u64,
    pub linked: bool,
    pub performed_at_cursor: usize,
    pub performed_at: Option<DateTime<Utc>>,
}

impl From<&Action> for SnapshotAction {
    fn from(action: &Action) -> Self {
        SnapshotAction {
            id: action.id().map(|id| id.0).unwrap_or_default(),
            name: action.name().to_string(),
            author: action.author().0,
            linked: action.is_linked_to_previous(),
            performed_at_cursor: action.performed_at_cursor(),
            performed_at: action.performed_at(),
        }
    }
}

/// Point-in-time export of one session's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub session: SessionId,
    pub cursor: usize,
    pub repeating: bool,
    /// Played items, oldest first.
    pub history: Vec<SnapshotItem>,
    pub pending: Vec<SnapshotItem>,
    pub actions: Vec<SnapshotAction>,
}

impl QueueSnapshot {
    pub fn capture(session: SessionId, queue: &Queue) -> Self {
        let mut history: Vec<SnapshotItem> = queue.history_iter().map(SnapshotItem::from).collect();
        history.reverse();

        QueueSnapshot {
            session,
            cursor: queue.cursor(),
            repeating: queue.is_repeating(),
            history,
            pending: queue.pending_iter().map(SnapshotItem::from).collect(),
            actions: queue.log().iter().map(SnapshotAction::from).collect(),
        }
    }
}

pub fn to_yaml(snapshot: &QueueSnapshot) -> anyhow::Result<String> {
    serde_yaml::to_string(snapshot).with_context(|| "Failed to serialize snapshot")
}

pub fn compute_hash(snapshot: &QueueSnapshot) -> anyhow::Result<String> {
    let yaml = serde_yaml::to_string(snapshot)
        .with_context(|| "Failed to serialize snapshot for hashing")?;

    let mut hasher = Sha256::new();
    hasher.update(yaml.as_bytes());
    let result = hasher.finalize();

    let hex = result
        .iter()
        .take(6)
        .map(|b| format!("{:02x}", b))
        .collect();

    Ok(hex)
}

pub fn save(snapshot: &QueueSnapshot, path: &Path) -> anyhow::Result<()> {
    let yaml = to_yaml(snapshot)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    fs::write(path, yaml).with_context(|| format!("Failed to write snapshot to {:?}", path))
}

pub fn load(path: &Path) -> anyhow::Result<QueueSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {:?}", path))?;

    serde_yaml::from_str(&content).with_context(|| "Failed to parse snapshot YAML")
}
