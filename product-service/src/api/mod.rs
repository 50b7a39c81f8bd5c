//! HTTP API layer: request handlers and wire models.
//!
//! - [`handlers`]: Axum route handlers for entity sets, navigation properties and `$ref` links
//! - [`models`]: Request and response bodies

pub mod handlers;
pub mod models;
