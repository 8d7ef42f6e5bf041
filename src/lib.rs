pub mod api;
pub mod config;
pub mod links;
pub mod metadata;
pub mod models;
pub mod redirect;
pub mod security;
pub mod shortcode;
pub mod storage;
pub mod useragent;

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use links::LinkService;
use redirect::PreviewTemplate;

/// Options for assembling the HTTP application.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub preview: PreviewTemplate,
    pub trust_proxy_headers: bool,
    pub cors_permissive: bool,
}

/// Full router: health probe, `/api/links`, and the short-code catch-all,
/// with security headers on every response.
pub fn create_app(links: Arc<LinkService>, options: AppOptions) -> Router {
    let app = api::create_api_router(Arc::clone(&links)).merge(redirect::create_redirect_router(
        links,
        options.preview,
        options.trust_proxy_headers,
    ));

    let app = if options.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.layer(middleware::from_fn(security::security_headers))
        .layer(TraceLayer::new_for_http())
}
