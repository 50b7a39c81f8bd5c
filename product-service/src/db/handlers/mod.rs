//! Repository implementations for PostgreSQL.
//!
//! Each repository:
//! - Holds a clone of the connection pool
//! - Provides strongly-typed CRUD operations with runtime-bound queries
//! - Returns records from [`crate::db::models`]
//! - Performs every write as a single statement (supplier deletion uses one transaction)
//!
//! # Available Repositories
//!
//! - [`Products`]: Products, including the supplier foreign key
//! - [`Suppliers`]: Suppliers
//!
//! The [`Repository`] trait defines the operations shared by all repositories; [`ProductRepository`] and
//! [`SupplierRepository`] bind its associated types so handlers can hold `Arc<dyn ...>` and stay
//! independent of the backend.

pub mod products;
pub mod repository;
pub mod suppliers;

pub use products::Products;
pub use repository::{ProductRepository, Repository, SupplierRepository};
pub use suppliers::Suppliers;
