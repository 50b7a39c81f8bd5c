//! Database models for suppliers.

use crate::types::{SupplierId, Version};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `suppliers` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCreateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierUpdateDBRequest {
    pub name: Option<String>,
}

impl SupplierUpdateDBRequest {
    pub fn apply_to(&self, supplier: &mut Supplier) {
        if let Some(name) = &self.name {
            supplier.name = name.clone();
        }
    }
}

pub type SupplierDBResponse = Supplier;
