pub mod client_ip;
pub mod handlers;
pub mod preview;
pub mod routes;

pub use preview::PreviewTemplate;
pub use routes::create_redirect_router;
