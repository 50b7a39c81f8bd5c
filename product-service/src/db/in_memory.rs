//! In-memory store implementation.
//!
//! Keeps both tables behind one lock so that referential checks and the write they guard happen
//! atomically, mirroring what the foreign key constraint does in PostgreSQL. Suitable for tests and
//! single-process deployments (`database.type: memory`). Data is lost on restart.
//!
//! The lock is only held inside synchronous sections; no guard lives across an `.await`.
//!
//! # Example
//! ```ignore
//! let store = InMemoryStore::new();
//! let products = store.products();
//! let created = products.create(&request).await?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::{ProductRepository, Repository, SupplierRepository};
use crate::db::models::{
    products::{Product, ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
    suppliers::{Supplier, SupplierCreateDBRequest, SupplierDBResponse, SupplierUpdateDBRequest},
};
use crate::types::{ProductId, SupplierId, Version};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    last_product_id: ProductId,
    last_supplier_id: SupplierId,
}

impl Tables {
    fn check_supplier(&self, supplier_id: Option<SupplierId>) -> Result<()> {
        match supplier_id {
            Some(id) if !self.suppliers.contains_key(&id) => Err(DbError::ForeignKeyViolation {
                constraint: Some("products_supplier_id_fkey".to_string()),
                table: Some("products".to_string()),
                message: format!("Key (supplier_id)=({id}) is not present in table \"suppliers\"."),
            }),
            _ => Ok(()),
        }
    }
}

fn version_matches(current: Version, expected: Option<Version>) -> bool {
    expected.is_none_or(|expected| expected == current)
}

/// Shared handle to the in-memory tables. Cheap to clone.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> InMemoryProducts {
        InMemoryProducts {
            tables: self.tables.clone(),
        }
    }

    pub fn suppliers(&self) -> InMemorySuppliers {
        InMemorySuppliers {
            tables: self.tables.clone(),
        }
    }
}

/// Product repository over an [`InMemoryStore`]
pub struct InMemoryProducts {
    tables: Arc<RwLock<Tables>>,
}

/// Supplier repository over an [`InMemoryStore`]
pub struct InMemorySuppliers {
    tables: Arc<RwLock<Tables>>,
}

fn product_conflict(id: ProductId) -> DbError {
    DbError::ConcurrencyConflict {
        entity: "Product",
        id: id.to_string(),
    }
}

fn supplier_conflict(id: SupplierId) -> DbError {
    DbError::ConcurrencyConflict {
        entity: "Supplier",
        id: id.to_string(),
    }
}

#[async_trait::async_trait]
impl Repository for InMemoryProducts {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.write();
        tables.check_supplier(request.supplier_id)?;

        tables.last_product_id += 1;
        let product = Product {
            id: tables.last_product_id,
            name: request.name.clone(),
            price: request.price,
            category: request.category.clone(),
            supplier_id: request.supplier_id,
            version: 1,
        };
        tables.products.insert(product.id, product.clone());

        Ok(product)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.read().products.get(&id).cloned())
    }

    async fn get_bulk(&self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let tables = self.tables.read();
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.products.get(&id).map(|p| (id, p.clone())))
            .collect())
    }

    async fn list(&self) -> Result<Vec<Self::Response>> {
        Ok(self.tables.read().products.values().cloned().collect())
    }

    async fn replace(&self, id: Self::Id, request: &Self::CreateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        let mut tables = self.tables.write();
        tables.check_supplier(request.supplier_id)?;

        let product = tables
            .products
            .get_mut(&id)
            .filter(|p| version_matches(p.version, expected_version))
            .ok_or_else(|| product_conflict(id))?;

        product.name = request.name.clone();
        product.price = request.price;
        product.category = request.category.clone();
        product.supplier_id = request.supplier_id;
        product.version += 1;

        Ok(product.clone())
    }

    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        let mut tables = self.tables.write();
        if let Some(supplier_id) = request.supplier_id {
            tables.check_supplier(supplier_id)?;
        }

        let product = tables
            .products
            .get_mut(&id)
            .filter(|p| version_matches(p.version, expected_version))
            .ok_or_else(|| product_conflict(id))?;

        request.apply_to(product);
        product.version += 1;

        Ok(product.clone())
    }

    async fn delete(&self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.write().products.remove(&id).is_some())
    }

    async fn exists(&self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.read().products.contains_key(&id))
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProducts {
    async fn list_by_supplier(&self, supplier_id: SupplierId) -> Result<Vec<ProductDBResponse>> {
        Ok(self
            .tables
            .read()
            .products
            .values()
            .filter(|p| p.supplier_id == Some(supplier_id))
            .cloned()
            .collect())
    }

    async fn set_supplier(&self, product_id: ProductId, supplier_id: Option<SupplierId>) -> Result<ProductDBResponse> {
        let mut tables = self.tables.write();
        tables.check_supplier(supplier_id)?;

        let product = tables.products.get_mut(&product_id).ok_or(DbError::NotFound)?;
        product.supplier_id = supplier_id;
        product.version += 1;

        Ok(product.clone())
    }

    async fn detach_from(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<ProductDBResponse> {
        let mut tables = self.tables.write();
        let product = tables
            .products
            .get_mut(&product_id)
            .filter(|p| p.supplier_id == Some(supplier_id))
            .ok_or(DbError::NotFound)?;
        product.supplier_id = None;
        product.version += 1;

        Ok(product.clone())
    }
}

#[async_trait::async_trait]
impl Repository for InMemorySuppliers {
    type CreateRequest = SupplierCreateDBRequest;
    type UpdateRequest = SupplierUpdateDBRequest;
    type Response = SupplierDBResponse;
    type Id = SupplierId;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.write();

        tables.last_supplier_id += 1;
        let supplier = Supplier {
            id: tables.last_supplier_id,
            name: request.name.clone(),
            version: 1,
        };
        tables.suppliers.insert(supplier.id, supplier.clone());

        Ok(supplier)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.read().suppliers.get(&id).cloned())
    }

    async fn get_bulk(&self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let tables = self.tables.read();
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.suppliers.get(&id).map(|s| (id, s.clone())))
            .collect())
    }

    async fn list(&self) -> Result<Vec<Self::Response>> {
        Ok(self.tables.read().suppliers.values().cloned().collect())
    }

    async fn replace(&self, id: Self::Id, request: &Self::CreateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        let mut tables = self.tables.write();
        let supplier = tables
            .suppliers
            .get_mut(&id)
            .filter(|s| version_matches(s.version, expected_version))
            .ok_or_else(|| supplier_conflict(id))?;

        supplier.name = request.name.clone();
        supplier.version += 1;

        Ok(supplier.clone())
    }

    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        let mut tables = self.tables.write();
        let supplier = tables
            .suppliers
            .get_mut(&id)
            .filter(|s| version_matches(s.version, expected_version))
            .ok_or_else(|| supplier_conflict(id))?;

        request.apply_to(supplier);
        supplier.version += 1;

        Ok(supplier.clone())
    }

    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.suppliers.remove(&id).is_none() {
            return Ok(false);
        }

        for product in tables.products.values_mut().filter(|p| p.supplier_id == Some(id)) {
            product.supplier_id = None;
            product.version += 1;
        }

        Ok(true)
    }

    async fn exists(&self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.read().suppliers.contains_key(&id))
    }
}

impl SupplierRepository for InMemorySuppliers {}
