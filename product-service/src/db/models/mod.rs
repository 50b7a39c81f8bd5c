//! Database record models matching table schemas.
//!
//! Each model struct matches a table row and derives `sqlx::FromRow`. Create/update request structs
//! carry the writable columns only; the store owns `id` and `version`.
//!
//! - [`products`]: `products` table, including the nullable `supplier_id` foreign key
//! - [`suppliers`]: `suppliers` table
//!
//! Database models are converted to API models in [`crate::api::models`].

pub mod products;
pub mod suppliers;
