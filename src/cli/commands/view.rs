use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::cli::commands::utils::{format_ago, format_duration};
use crate::playback::{Queue, Session};
use crate::provider::Item;
use crate::state::snapshot::{self, QueueSnapshot};

fn entry(item: &Item) -> String {
    let mut line = format!(
        "[{}] {}",
        format_duration(u64::from(item.duration_seconds)),
        item.title
    );
    if item.broken {
        line.push_str(" (unavailable)");
    } else if item.resolution_pending {
        line.push_str(" (unresolved)");
    }
    line
}

pub fn queue(queue: &Queue, limit: usize) -> String {
    let mut out = String::new();
    if let Some(item) = queue.now_playing() {
        let _ = writeln!(out, "Now playing: {}", entry(item));
    }

    if queue.is_empty() {
        out.push_str("The queue is empty");
        return out;
    }

    for (i, item) in queue.pending_iter().take(limit).enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, entry(item));
    }
    if queue.len() > limit {
        let _ = writeln!(out, "... and {} more", queue.len() - limit);
    }
    let _ = write!(
        out,
        "{} tracks, total [{}]",
        queue.len(),
        format_duration(queue.total_duration())
    );
    out
}

pub fn history(queue: &Queue, limit: usize) -> String {
    if queue.history_len() == 0 {
        return "Nothing has been played yet".to_string();
    }

    let mut out = String::new();
    for (i, item) in queue.history_iter().take(limit).enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, entry(item));
    }
    if queue.history_len() > limit {
        let _ = writeln!(out, "... and {} more", queue.history_len() - limit);
    }
    out.truncate(out.trim_end().len());
    out
}

/// Audit log, most recent first. Linked runs are drawn as a bracket.
pub fn actions(queue: &Queue, limit: usize, now: DateTime<Utc>) -> String {
    if queue.log().is_empty() {
        return "No actions available".to_string();
    }

    let mut out = String::new();
    let mut was_linked = false;
    for action in queue.log().iter().rev().take(limit) {
        let linked = action.is_linked_to_previous();
        let icon = match (was_linked, linked) {
            (true, true) => "┣",
            (true, false) => "┗",
            (false, true) => "┏",
            (false, false) => "●",
        };
        let ago = action
            .performed_at()
            .map(|at| format_ago((now - at).num_seconds()))
            .unwrap_or_default();

        let _ = writeln!(
            out,
            "{} `{}` - {} (user {})",
            icon,
            action.name(),
            ago,
            action.author().0
        );
        if linked {
            out.push_str("┃\n");
        }
        was_linked = linked;
    }
    let _ = write!(out, "{} actions", queue.log().len());
    out
}

pub fn status(session: &Session) -> String {
    session.read(|queue| {
        let playing = queue
            .now_playing()
            .map(entry)
            .unwrap_or_else(|| "nothing".to_string());
        format!(
            "Session {}: playing {}, {} pending, {} played, repeat {}, {} actions ({} undone)",
            session.id(),
            playing,
            queue.len(),
            queue.history_len(),
            if queue.is_repeating() { "on" } else { "off" },
            queue.log().len(),
            queue.undone().len()
        )
    })
}

pub fn dump(session: &Session, path: Option<&Path>) -> Result<String> {
    let snapshot = session.read(|queue| QueueSnapshot::capture(session.id(), queue));
    let hash = snapshot::compute_hash(&snapshot)?;

    match path {
        Some(path) => {
            snapshot::save(&snapshot, path)?;
            Ok(format!("Wrote snapshot {} to {}", hash, path.display()))
        }
        None => Ok(format!("# snapshot {}\n{}", hash, snapshot::to_yaml(&snapshot)?)),
    }
}
