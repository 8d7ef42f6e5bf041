pub mod service;

pub use service::{LinkService, PartialMetadata};
