use anyhow::bail;
use async_trait::async_trait;

use crate::provider::{Item, Resolution, Resolver};

/// Resolver for offline use: accepts every entry as-is.
///
/// Entries without a title cannot be searched for, so they are rejected.
pub struct PassthroughResolver;

#[async_trait]
impl Resolver for PassthroughResolver {
    async fn resolve(&self, item: &Item) -> anyhow::Result<Resolution> {
        if item.title.trim().is_empty() {
            bail!("Nothing to search for item {}", item.id);
        }
        Ok(Resolution::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;

    #[tokio::test]
    async fn test_resolves_titled_items() {
        let item = Item::new("Song", 100, ProviderKind::Spotify);
        let res = PassthroughResolver.resolve(&item).await.unwrap();
        assert_eq!(res, Resolution::default());
    }

    #[tokio::test]
    async fn test_rejects_blank_title() {
        let item = Item::new("  ", 100, ProviderKind::Spotify);
        assert!(PassthroughResolver.resolve(&item).await.is_err());
    }
}
