use axum::{routing::get, Router};
use std::sync::Arc;

use crate::links::LinkService;

use super::handlers::{create_link, delete_link, get_link, health_check, list_links, AppState};

pub fn create_api_router(links: Arc<LinkService>) -> Router {
    let state = Arc::new(AppState { links });

    let link_routes = Router::new()
        .route("/links", get(list_links).post(create_link))
        .route("/links/{id}", get(get_link).delete(delete_link))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", link_routes)
}
