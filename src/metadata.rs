//! Link metadata extraction
//!
//! Fetches the target page and reads its Open Graph / Twitter Card / SEO tags.
//! Extraction never fails: any fetch or parse problem degrades to a fallback
//! built from the URL's hostname, so link creation does not depend on the
//! target being reachable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str = "Social-SEO-Preview-Bot/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const FALLBACK_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

impl Metadata {
    /// Result used when the page cannot be fetched or parsed.
    pub fn fallback(url: &str) -> Self {
        Self {
            title: hostname(url),
            description: FALLBACK_DESCRIPTION.to_string(),
            image_url: String::new(),
        }
    }
}

/// Anything that can describe a URL. Implemented by [`MetadataExtractor`];
/// tests substitute their own.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn extract(&self, url: &str) -> Metadata;
}

pub struct MetadataExtractor {
    client: Client,
}

impl MetadataExtractor {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build metadata HTTP client")?;

        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Metadata> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("non-success status")?;

        let html = response.text().await.context("failed to read body")?;

        Ok(parse_metadata(url, &html))
    }
}

#[async_trait]
impl MetadataSource for MetadataExtractor {
    async fn extract(&self, url: &str) -> Metadata {
        match self.fetch(url).await {
            Ok(metadata) => {
                debug!(url, title = %metadata.title, "extracted link metadata");
                metadata
            }
            Err(err) => {
                warn!(url, error = %format!("{err:#}"), "metadata extraction failed, using fallback");
                Metadata::fallback(url)
            }
        }
    }
}

/// Read title, description and image from an HTML document.
pub fn parse_metadata(url: &str, html: &str) -> Metadata {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "property", "og:title")
        .or_else(|| meta_content(&document, "name", "twitter:title"))
        .or_else(|| title_text(&document))
        .unwrap_or_else(|| hostname(url));

    let description = meta_content(&document, "property", "og:description")
        .or_else(|| meta_content(&document, "name", "twitter:description"))
        .or_else(|| meta_content(&document, "name", "description"))
        .unwrap_or_default();

    let image_url = meta_content(&document, "property", "og:image")
        .or_else(|| meta_content(&document, "name", "twitter:image"))
        .unwrap_or_default();

    Metadata {
        title,
        description,
        image_url,
    }
}

/// `content` of the first `<meta {attr}="{key}">`, trimmed, if non-empty.
fn meta_content(document: &Html, attr: &str, key: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[{attr}="{key}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .and_then(non_empty)
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Hostname of `url`, or the input itself when it does not parse.
pub fn hostname(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
