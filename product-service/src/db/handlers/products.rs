//! Database repository for products.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{ProductRepository, Repository},
    models::products::{Product, ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
};
use crate::types::{ProductId, SupplierId, Version};
use sqlx::PgPool;
use tracing::instrument;

const PRODUCT_COLUMNS: &str = "id, name, price, category, supplier_id, version";

pub struct Products {
    db: PgPool,
}

impl Products {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn conflict(id: ProductId) -> DbError {
    DbError::ConcurrencyConflict {
        entity: "Product",
        id: id.to_string(),
    }
}

#[async_trait::async_trait]
impl Repository for Products {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, price, category, supplier_id) VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&request.name)
        .bind(request.price)
        .bind(&request.category)
        .bind(request.supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(product)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let products = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&self.db)
            .await?;

        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Self::Response>> {
        let products = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.db)
            .await?;

        tracing::debug!("Retrieved {} products", products.len());

        Ok(products)
    }

    #[instrument(skip(self, request), err)]
    async fn replace(&self, id: Self::Id, request: &Self::CreateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        // Single conditional statement: either the whole row is rewritten or nothing is
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = $2,
                price = $3,
                category = $4,
                supplier_id = $5,
                version = version + 1
            WHERE id = $1 AND ($6::INTEGER IS NULL OR version = $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(request.price)
        .bind(&request.category)
        .bind(request.supplier_id)
        .bind(expected_version)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| conflict(id))
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2::TEXT, name),
                price = COALESCE($3::NUMERIC, price),
                category = COALESCE($4::TEXT, category),
                supplier_id = CASE WHEN $5 THEN $6::INTEGER ELSE supplier_id END,
                version = version + 1
            WHERE id = $1 AND ($7::INTEGER IS NULL OR version = $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.price)
        .bind(request.category.as_deref())
        .bind(request.supplier_id.is_some())
        .bind(request.supplier_id.flatten())
        .bind(expected_version)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| conflict(id))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn exists(&self, id: Self::Id) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        Ok(exists)
    }
}

#[async_trait::async_trait]
impl ProductRepository for Products {
    #[instrument(skip(self), err)]
    async fn list_by_supplier(&self, supplier_id: SupplierId) -> Result<Vec<ProductDBResponse>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE supplier_id = $1 ORDER BY id"
        ))
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    #[instrument(skip(self), err)]
    async fn set_supplier(&self, product_id: ProductId, supplier_id: Option<SupplierId>) -> Result<ProductDBResponse> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET supplier_id = $2, version = version + 1 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product_id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn detach_from(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<ProductDBResponse> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET supplier_id = NULL, version = version + 1 WHERE id = $1 AND supplier_id = $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product_id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)
    }
}
