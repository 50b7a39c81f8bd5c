//! API request/response models for suppliers.

use crate::api::models::products::ProductResponse;
use crate::db::models::suppliers::{SupplierCreateDBRequest, SupplierDBResponse, SupplierUpdateDBRequest};
use crate::errors::Error;
use crate::types::SupplierId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating or fully replacing a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierCreate {
    /// Ignored on create; must equal the URL key on replace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SupplierId>,
    #[schema(example = "Duncan")]
    pub name: String,
}

/// Request body for patching a supplier. Unknown fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SupplierUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SupplierId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Supplier as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierResponse {
    pub id: SupplierId,
    pub name: String,
    /// Products of this supplier, only present with `$expand=Products`
    /// Note: no_recursion stops utoipa following Product -> Supplier -> Product forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub products: Option<Vec<ProductResponse>>,
}

fn require_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "name must not be blank".to_string(),
        });
    }
    Ok(())
}

impl SupplierCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_name(&self.name)
    }
}

impl SupplierUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        self.name.as_deref().map_or(Ok(()), require_name)
    }
}

impl From<SupplierCreate> for SupplierCreateDBRequest {
    fn from(create: SupplierCreate) -> Self {
        Self { name: create.name }
    }
}

impl From<SupplierUpdate> for SupplierUpdateDBRequest {
    fn from(update: SupplierUpdate) -> Self {
        Self { name: update.name }
    }
}

impl From<SupplierDBResponse> for SupplierResponse {
    fn from(db: SupplierDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            products: None,
        }
    }
}

impl SupplierResponse {
    /// Inline the supplier's products
    pub fn with_products(mut self, products: Vec<ProductResponse>) -> Self {
        self.products = Some(products);
        self
    }
}
