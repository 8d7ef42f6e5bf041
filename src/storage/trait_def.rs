use crate::models::{AnalyticsEvent, Link, NewAnalyticsEvent, NewLink};
use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, indexes)
    async fn init(&self) -> Result<()>;

    /// Get a link by short code
    async fn find_link_by_short_code(&self, short_code: &str) -> Result<Option<Link>>;

    /// Get a link by id
    async fn find_link_by_id(&self, id: &str) -> Result<Option<Link>>;

    /// Analytics events of a link, newest first
    async fn find_analytics_events(&self, link_id: &str) -> Result<Vec<AnalyticsEvent>>;

    /// Insert a new link. Fails with `StorageError::Conflict` if the short code
    /// is already taken.
    async fn create_link(&self, link: NewLink) -> StorageResult<Link>;

    /// Atomically add `by` to the click counter. Returns false if no link matched.
    async fn increment_clicks(&self, id: &str, by: i64) -> Result<bool>;

    async fn create_analytics_event(
        &self,
        link_id: &str,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent>;

    async fn delete_analytics_events_by_link_id(&self, link_id: &str) -> Result<u64>;

    /// Delete a link row. Returns false if no link matched.
    async fn delete_link_by_id(&self, id: &str) -> Result<bool>;

    /// All links, newest first
    async fn list_links(&self) -> Result<Vec<Link>>;

    /// Count one visit: bump the counter and store the event.
    ///
    /// Backends that support transactions should override this so both
    /// writes commit together.
    async fn record_click(&self, link_id: &str, event: NewAnalyticsEvent) -> Result<AnalyticsEvent> {
        if !self.increment_clicks(link_id, 1).await? {
            anyhow::bail!("link {link_id} does not exist");
        }
        self.create_analytics_event(link_id, event)
            .await
            .with_context(|| format!("failed to store analytics event for link {link_id}"))
    }

    /// Delete a link together with its analytics events.
    /// Returns false if the link does not exist.
    async fn remove_link(&self, id: &str) -> Result<bool> {
        if self.find_link_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.delete_analytics_events_by_link_id(id).await?;
        self.delete_link_by_id(id).await
    }
}
