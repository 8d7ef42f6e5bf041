use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::metadata::{Metadata, MetadataSource};
use crate::models::{Link, LinkWithAnalytics, NewAnalyticsEvent, NewLink};
use crate::shortcode::ShortCodeIssuer;
use crate::storage::{Storage, StorageError};
use crate::useragent::classify_platform;

/// How many fresh codes to try when the insert itself loses a race on the
/// unique constraint.
const MAX_INSERT_ATTEMPTS: usize = 3;

/// Metadata supplied by the caller. Missing or empty fields are filled in
/// from the target page.
#[derive(Debug, Clone, Default)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl PartialMetadata {
    fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            title: keep(self.title),
            description: keep(self.description),
            image_url: keep(self.image_url),
        }
    }

    fn is_complete(&self) -> bool {
        self.title.is_some() && self.description.is_some() && self.image_url.is_some()
    }

    /// Caller fields win over extracted ones.
    fn merge(self, extracted: Metadata) -> Metadata {
        Metadata {
            title: self.title.unwrap_or(extracted.title),
            description: self.description.unwrap_or(extracted.description),
            image_url: self.image_url.unwrap_or(extracted.image_url),
        }
    }
}

pub struct LinkService {
    storage: Arc<dyn Storage>,
    issuer: ShortCodeIssuer,
    metadata: Arc<dyn MetadataSource>,
}

impl LinkService {
    pub fn new(
        storage: Arc<dyn Storage>,
        issuer: ShortCodeIssuer,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        Self {
            storage,
            issuer,
            metadata,
        }
    }

    /// Shorten `original_url`. The URL is expected to be validated already.
    pub async fn create_link(&self, original_url: &str, partial: PartialMetadata) -> Result<Link> {
        let mut short_code = self
            .issuer
            .issue()
            .await
            .context("failed to issue short code")?;

        let partial = partial.normalized();
        let metadata = if partial.is_complete() {
            partial.merge(Metadata::default())
        } else {
            let extracted = self.metadata.extract(original_url).await;
            partial.merge(extracted)
        };

        let mut attempt = 1;
        loop {
            let new_link = NewLink {
                short_code: short_code.clone(),
                original_url: original_url.to_string(),
                title: metadata.title.clone(),
                description: metadata.description.clone(),
                image_url: metadata.image_url.clone(),
            };

            match self.storage.create_link(new_link).await {
                Ok(link) => {
                    info!(id = %link.id, short_code = %link.short_code, "created link");
                    return Ok(link);
                }
                Err(StorageError::Conflict) if attempt < MAX_INSERT_ATTEMPTS => {
                    warn!(short_code = %short_code, attempt, "short code taken at insert, reissuing");
                    attempt += 1;
                    short_code = self
                        .issuer
                        .issue()
                        .await
                        .context("failed to issue short code")?;
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("failed to store link for {original_url}")));
                }
            }
        }
    }

    pub async fn get_link_by_short_code(&self, short_code: &str) -> Result<Option<Link>> {
        self.storage
            .find_link_by_short_code(short_code)
            .await
            .with_context(|| format!("failed to look up short code {short_code}"))
    }

    pub async fn get_link_by_id(&self, id: &str) -> Result<Option<LinkWithAnalytics>> {
        let Some(link) = self
            .storage
            .find_link_by_id(id)
            .await
            .with_context(|| format!("failed to look up link {id}"))?
        else {
            return Ok(None);
        };

        let analytics = self
            .storage
            .find_analytics_events(id)
            .await
            .with_context(|| format!("failed to load analytics for link {id}"))?;

        Ok(Some(LinkWithAnalytics { link, analytics }))
    }

    pub async fn get_all_links(&self) -> Result<Vec<Link>> {
        self.storage.list_links().await.context("failed to list links")
    }

    /// Delete a link and its analytics. Returns false if it does not exist.
    pub async fn delete_link(&self, id: &str) -> Result<bool> {
        let deleted = self
            .storage
            .remove_link(id)
            .await
            .with_context(|| format!("failed to delete link {id}"))?;

        if deleted {
            info!(id, "deleted link");
        }
        Ok(deleted)
    }

    /// Count a visit and store its analytics event.
    pub async fn track_click(&self, link_id: &str, user_agent: &str, ip: &str) -> Result<()> {
        let event = NewAnalyticsEvent {
            user_agent: user_agent.to_string(),
            ip: ip.to_string(),
            platform: classify_platform(user_agent).to_string(),
        };

        self.storage
            .record_click(link_id, event)
            .await
            .with_context(|| format!("failed to track click for link {link_id}"))?;

        Ok(())
    }
}
