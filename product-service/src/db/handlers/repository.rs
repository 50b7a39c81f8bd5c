//! Base repository traits for store operations.
//!
//! A repository is the data access layer for one table. It provides methods for creating, reading,
//! replacing, patching and deleting entities, plus listing them. Two backends implement these traits:
//! PostgreSQL ([`super::Products`], [`super::Suppliers`]) and the in-process store in
//! [`crate::db::in_memory`].

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::db::errors::Result;
use crate::db::models::{
    products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
    suppliers::{SupplierCreateDBRequest, SupplierDBResponse, SupplierUpdateDBRequest},
};
use crate::types::{ProductId, SupplierId, Version};

/// Base repository trait providing common store operations.
///
/// Writes that take an `expected_version` are optimistic: they only land if the row still carries that
/// version. A write that matches no row fails with [`DbError::ConcurrencyConflict`]; callers resolve it
/// by checking [`Repository::exists`].
///
/// [`DbError::ConcurrencyConflict`]: crate::db::errors::DbError::ConcurrencyConflict
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Full set of writable fields, used by both `create` and `replace`
    type CreateRequest: Send + Sync;

    /// Partial update, only provided fields are written
    type UpdateRequest: Send + Sync;

    /// The record type returned by operations
    type Response: Send;

    /// The identifier type for lookups
    type Id: Send + Sync + Copy + Eq + Hash + Display;

    /// Insert a new entity; the store assigns its key
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Get lots of entities by their IDs, keyed by ID. Missing IDs are left out.
    async fn get_bulk(&self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>>;

    /// List every entity, ordered by ID
    async fn list(&self) -> Result<Vec<Self::Response>>;

    /// Overwrite every writable field of an entity
    async fn replace(&self, id: Self::Id, request: &Self::CreateRequest, expected_version: Option<Version>) -> Result<Self::Response>;

    /// Write only the provided fields of an entity
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest, expected_version: Option<Version>) -> Result<Self::Response>;

    /// Delete an entity by ID, returning whether it existed
    async fn delete(&self, id: Self::Id) -> Result<bool>;

    /// Check whether an entity with this ID exists
    async fn exists(&self, id: Self::Id) -> Result<bool>;
}

/// Product table access, including the supplier foreign key
#[async_trait::async_trait]
pub trait ProductRepository:
    Repository<CreateRequest = ProductCreateDBRequest, UpdateRequest = ProductUpdateDBRequest, Response = ProductDBResponse, Id = ProductId>
{
    /// Products whose `supplier_id` points at the given supplier
    async fn list_by_supplier(&self, supplier_id: SupplierId) -> Result<Vec<ProductDBResponse>>;

    /// Set or clear a product's supplier without touching its other fields
    async fn set_supplier(&self, product_id: ProductId, supplier_id: Option<SupplierId>) -> Result<ProductDBResponse>;

    /// Clear a product's supplier only if it is still `supplier_id`.
    ///
    /// Fails with [`DbError::NotFound`](crate::db::errors::DbError::NotFound) when the product is gone or
    /// currently points elsewhere.
    async fn detach_from(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<ProductDBResponse>;
}

/// Supplier table access.
///
/// `delete` clears `supplier_id` on every dependent product before removing the supplier, atomically.
pub trait SupplierRepository:
    Repository<CreateRequest = SupplierCreateDBRequest, UpdateRequest = SupplierUpdateDBRequest, Response = SupplierDBResponse, Id = SupplierId>
{
}
