use crate::provider::{Item, Resolution};
use async_trait::async_trait;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Look up a playable source for an item whose resolution is still pending.
    ///
    /// Called outside the queue lock. An error marks the item as broken.
    async fn resolve(&self, item: &Item) -> anyhow::Result<Resolution>;
}
