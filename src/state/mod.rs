mod config;
pub mod journal;
pub mod snapshot;

pub use config::{Config, DEFAULT_CONFIG_PATH};
pub use journal::{JournalEntry, Outcome};
pub use snapshot::QueueSnapshot;
