//! API request and response data models.
//!
//! - Request models: `*Create` (create and replace bodies), `*Update` (patch bodies)
//! - Response models: `*Response`, camelCase on the wire
//! - [`references`]: `$ref` bodies and OData query options
//!
//! The row version never appears in a body; handlers expose it as an `ETag` header.

pub mod products;
pub mod references;
pub mod suppliers;
