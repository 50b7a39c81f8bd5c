//! Database models for products.

use crate::types::{ProductId, SupplierId, Version};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `products` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub supplier_id: Option<SupplierId>,
    pub version: Version,
}

/// Full set of writable product columns. Used for inserts and for full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreateDBRequest {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub supplier_id: Option<SupplierId>,
}

/// Partial product update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdateDBRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    /// None = no change, Some(None) = clear, Some(id) = set
    pub supplier_id: Option<Option<SupplierId>>,
}

impl ProductUpdateDBRequest {
    /// Apply the provided fields to an in-memory row, leaving the rest untouched
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(supplier_id) = self.supplier_id {
            product.supplier_id = supplier_id;
        }
    }
}

pub type ProductDBResponse = Product;
