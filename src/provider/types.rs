use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Youtube,
    Spotify,
    Direct,
}

impl ProviderKind {
    /// Entries from this provider need a playable source looked up before playback.
    pub fn needs_resolution(self) -> bool {
        matches!(self, ProviderKind::Spotify)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl ItemId {
    fn next() -> Self {
        ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One playable queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub duration_seconds: u32,
    pub provider: ProviderKind,
    pub is_playlist_member: bool,
    pub resolution_pending: bool,
    pub broken: bool,
    #[serde(default)]
    pub seek_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(title: impl Into<String>, duration_seconds: u32, provider: ProviderKind) -> Self {
        Item {
            id: ItemId::next(),
            title: title.into(),
            duration_seconds,
            provider,
            is_playlist_member: false,
            resolution_pending: provider.needs_resolution(),
            broken: false,
            seek_seconds: 0,
            created_at: Utc::now(),
        }
    }

    pub fn playlist_member(mut self) -> Self {
        self.is_playlist_member = true;
        self
    }

    pub fn starting_at(mut self, seek_seconds: u32) -> Self {
        self.seek_seconds = seek_seconds;
        self
    }

    pub fn is_playable(&self) -> bool {
        !self.resolution_pending && !self.broken
    }
}

/// Metadata a resolver learned while looking up the playable source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub title: Option<String>,
    pub duration_seconds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Item::new("a", 10, ProviderKind::Youtube);
        let b = Item::new("b", 10, ProviderKind::Youtube);
        assert_ne!(a.id, b.id);
        assert_eq!(a.clone().id, a.id);
    }

    #[test]
    fn test_spotify_items_start_pending() {
        let item = Item::new("song", 200, ProviderKind::Spotify);
        assert!(item.resolution_pending);
        assert!(!item.is_playable());

        let item = Item::new("video", 200, ProviderKind::Youtube);
        assert!(!item.resolution_pending);
        assert!(item.is_playable());
    }

    #[test]
    fn test_builders() {
        let item = Item::new("x", 60, ProviderKind::Direct)
            .playlist_member()
            .starting_at(15);
        assert!(item.is_playlist_member);
        assert_eq!(item.seek_seconds, 15);
    }
}
