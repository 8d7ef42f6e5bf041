use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub short_code: String,
    pub original_url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub clicks: i64,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

/// A single recorded visit to a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    pub link_id: String,
    pub user_agent: String,
    pub ip: String,
    pub platform: String,
    pub created_at: i64,
}

/// Link returned by the detail endpoint, with its events newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkWithAnalytics {
    #[serde(flatten)]
    pub link: Link,
    pub analytics: Vec<AnalyticsEvent>,
}

/// Fields needed to persist a new link. The storage backend assigns
/// `id`, `clicks` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct NewAnalyticsEvent {
    pub user_agent: String,
    pub ip: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub original_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
