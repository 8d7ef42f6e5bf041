use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::links::{LinkService, PartialMetadata};
use crate::models::{CreateLinkRequest, Link, LinkWithAnalytics};

pub struct AppState {
    pub links: Arc<LinkService>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal_error(operation: &str, id: Option<&str>, err: anyhow::Error) -> ApiError {
    tracing::error!(operation, id, error = %format!("{err:#}"), "request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Well-formed absolute http(s) URL with a host.
pub fn is_valid_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Create a new short link. Any body that does not yield a valid
/// `originalUrl` is a 400, including bodies axum itself rejects.
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<Json<Link>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected create_link body");
        api_error(StatusCode::BAD_REQUEST, "Invalid URL")
    })?;

    let original_url = match payload.original_url.as_deref().map(str::trim) {
        Some(url) if is_valid_url(url) => url.to_string(),
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Invalid URL")),
    };

    let partial = PartialMetadata {
        title: payload.title,
        description: payload.description,
        image_url: payload.image_url,
    };

    state
        .links
        .create_link(&original_url, partial)
        .await
        .map(Json)
        .map_err(|e| internal_error("create_link", None, e))
}

/// List all links, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Link>>, ApiError> {
    state
        .links
        .get_all_links()
        .await
        .map(Json)
        .map_err(|e| internal_error("list_links", None, e))
}

/// Get a link with its analytics events
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LinkWithAnalytics>, ApiError> {
    match state.links.get_link_by_id(&id).await {
        Ok(Some(link)) => Ok(Json(link)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Link not found")),
        Err(e) => Err(internal_error("get_link", Some(&id), e)),
    }
}

/// Delete a link and its analytics events
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    match state.links.delete_link(&id).await {
        Ok(true) => Ok(Json(SuccessResponse { success: true })),
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "Link not found")),
        Err(e) => Err(internal_error("delete_link", Some(&id), e)),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
