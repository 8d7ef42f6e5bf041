use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::client_ip::client_ip;
use super::preview::PreviewTemplate;
use crate::links::LinkService;
use crate::useragent::is_crawler;

pub struct RedirectState {
    pub links: Arc<LinkService>,
    pub preview: PreviewTemplate,
    pub trust_proxy_headers: bool,
}

/// Resolve a short code, record the visit, then serve a preview document to
/// crawlers or a 302 redirect to everyone else.
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(short_code): Path<String>,
    request: Request,
) -> Response {
    let link = match state.links.get_link_by_short_code(&short_code).await {
        Ok(Some(link)) => link,
        Ok(None) => return (StatusCode::NOT_FOUND, "Link not found").into_response(),
        Err(err) => {
            tracing::error!(short_code = %short_code, error = %format!("{err:#}"), "failed to resolve short code");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    let (user_agent, ip) = visitor(&request, state.trust_proxy_headers);
    let user_agent = user_agent.as_str();

    // A visit that cannot be recorded is reported as an error.
    if let Err(err) = state.links.track_click(&link.id, user_agent, &ip).await {
        tracing::error!(short_code = %short_code, link_id = %link.id, error = %format!("{err:#}"), "failed to track click");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }

    if is_crawler(user_agent) {
        tracing::debug!(short_code = %short_code, user_agent, "serving preview to crawler");
        return Html(state.preview.render(&link)).into_response();
    }

    match HeaderValue::from_str(&link.original_url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(err) => {
            tracing::error!(short_code = %short_code, error = %err, "original URL is not a valid Location header");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// User agent (empty when absent) and client IP of the request.
fn visitor(request: &Request, trust_proxy_headers: bool) -> (String, String) {
    let headers = request.headers();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let socket_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    (user_agent, client_ip(headers, socket_ip, trust_proxy_headers))
}
