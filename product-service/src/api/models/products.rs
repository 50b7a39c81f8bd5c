//! API request/response models for products.

use crate::api::models::suppliers::SupplierResponse;
use crate::db::models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest};
use crate::errors::Error;
use crate::types::{ProductId, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating or fully replacing a product.
///
/// `id` is ignored on create. On replace it must equal the key in the URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[schema(example = "Yo-yo")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 4.95)]
    pub price: Decimal,
    #[schema(example = "Toys")]
    pub category: String,
    /// Key of the owning supplier; null or absent for none
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
}

/// Request body for patching a product. Absent fields are left unchanged; unknown fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Absent keeps the current supplier, null clears it
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i32>)]
    pub supplier_id: Option<Option<SupplierId>>,
}

/// Product as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: String,
    pub supplier_id: Option<SupplierId>,
    /// Owning supplier, only present with `$expand=Supplier`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub supplier: Option<Box<SupplierResponse>>,
}

fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{field} must not be blank"),
        });
    }
    Ok(())
}

/// Prices are stored as `NUMERIC(18,2)`: at most 16 integer digits and 2 decimal places
const PRICE_MAX_SCALE: u32 = 2;
const PRICE_MAX_INTEGER_DIGITS: u32 = 16;

fn require_price(price: Decimal) -> Result<(), Error> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::Validation {
            message: "price must not be negative".to_string(),
        });
    }
    if price.normalize().scale() > PRICE_MAX_SCALE {
        return Err(Error::Validation {
            message: format!("price must have at most {PRICE_MAX_SCALE} decimal places"),
        });
    }
    if price >= Decimal::from(10_i64.pow(PRICE_MAX_INTEGER_DIGITS)) {
        return Err(Error::Validation {
            message: format!("price must be below 10^{PRICE_MAX_INTEGER_DIGITS}"),
        });
    }
    Ok(())
}

impl ProductCreate {
    pub fn validate(&self) -> Result<(), Error> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_price(self.price)
    }
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(price) = self.price {
            require_price(price)?;
        }
        Ok(())
    }
}

impl From<ProductCreate> for ProductCreateDBRequest {
    fn from(create: ProductCreate) -> Self {
        Self {
            name: create.name,
            price: create.price,
            category: create.category,
            supplier_id: create.supplier_id,
        }
    }
}

impl From<ProductUpdate> for ProductUpdateDBRequest {
    fn from(update: ProductUpdate) -> Self {
        Self {
            name: update.name,
            price: update.price,
            category: update.category,
            supplier_id: update.supplier_id,
        }
    }
}

impl From<ProductDBResponse> for ProductResponse {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            price: db.price,
            category: db.category,
            supplier_id: db.supplier_id,
            supplier: None,
        }
    }
}

impl ProductResponse {
    /// Inline the owning supplier
    pub fn with_supplier(mut self, supplier: Option<SupplierResponse>) -> Self {
        self.supplier = supplier.map(Box::new);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let absent: ProductUpdate = serde_json::from_value(json!({ "name": "X" })).unwrap();
        assert_eq!(absent.supplier_id, None);

        let cleared: ProductUpdate = serde_json::from_value(json!({ "supplierId": null })).unwrap();
        assert_eq!(cleared.supplier_id, Some(None));

        let set: ProductUpdate = serde_json::from_value(json!({ "supplierId": 3, "price": 2.5 })).unwrap();
        assert_eq!(set.supplier_id, Some(Some(3)));
        assert_eq!(set.price, Some(Decimal::new(25, 1)));
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let typo = serde_json::from_value::<ProductUpdate>(json!({ "nmae": "X" }));
        assert!(typo.is_err());
    }

    #[test]
    fn test_create_requires_fields() {
        let missing = serde_json::from_value::<ProductCreate>(json!({ "name": "Yo-yo", "category": "Toys" }));
        assert!(missing.is_err());

        let wrong_type = serde_json::from_value::<ProductCreate>(json!({ "name": "Yo-yo", "price": "cheap", "category": "Toys" }));
        assert!(wrong_type.is_err());

        let ok: ProductCreate = serde_json::from_value(json!({ "name": "Yo-yo", "price": 5, "category": "Toys" })).unwrap();
        assert_eq!(ok.price, Decimal::new(5, 0));
        assert_eq!(ok.supplier_id, None);
    }

    #[test]
    fn test_validation_rules() {
        let base = ProductCreate {
            id: None,
            name: "Yo-yo".to_string(),
            price: Decimal::ZERO,
            category: "Toys".to_string(),
            supplier_id: None,
        };
        assert!(base.validate().is_ok());
        assert!(ProductCreate { name: " ".into(), ..base.clone() }.validate().is_err());
        assert!(ProductCreate { category: "".into(), ..base.clone() }.validate().is_err());
        assert!(ProductCreate { price: Decimal::new(-1, 2), ..base.clone() }.validate().is_err());
        assert!(ProductCreate { price: Decimal::new(4955, 3), ..base.clone() }.validate().is_err());
        assert!(ProductCreate { price: Decimal::new(4950, 3), ..base.clone() }.validate().is_ok());
        assert!(ProductCreate { price: Decimal::from(10_i64.pow(16)), ..base.clone() }.validate().is_err());
        assert!(ProductCreate { price: Decimal::new(999_999_999_999_999_999, 2), ..base }.validate().is_ok());

        let patch = ProductUpdate {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_response_wire_shape() {
        let response = ProductResponse {
            id: 1,
            name: "Yo-yo".to_string(),
            price: Decimal::new(495, 2),
            category: "Toys".to_string(),
            supplier_id: None,
            supplier: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "id": 1, "name": "Yo-yo", "price": 4.95, "category": "Toys", "supplierId": null })
        );
    }
}
