use axum::{routing::get, Router};
use std::sync::Arc;

use crate::links::LinkService;

use super::handlers::{redirect_link, RedirectState};
use super::preview::PreviewTemplate;

/// Catch-all `/{short_code}` route. Merge it after every other router so
/// static paths keep priority.
pub fn create_redirect_router(
    links: Arc<LinkService>,
    preview: PreviewTemplate,
    trust_proxy_headers: bool,
) -> Router {
    let state = Arc::new(RedirectState {
        links,
        preview,
        trust_proxy_headers,
    });

    Router::new()
        .route("/{short_code}", get(redirect_link))
        .with_state(state)
}
