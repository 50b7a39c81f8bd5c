//! Database repository for suppliers.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Repository, SupplierRepository},
    models::suppliers::{Supplier, SupplierCreateDBRequest, SupplierDBResponse, SupplierUpdateDBRequest},
};
use crate::types::{SupplierId, Version};
use sqlx::PgPool;
use tracing::instrument;

const SUPPLIER_COLUMNS: &str = "id, name, version";

pub struct Suppliers {
    db: PgPool,
}

impl Suppliers {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn conflict(id: SupplierId) -> DbError {
    DbError::ConcurrencyConflict {
        entity: "Supplier",
        id: id.to_string(),
    }
}

#[async_trait::async_trait]
impl Repository for Suppliers {
    type CreateRequest = SupplierCreateDBRequest;
    type UpdateRequest = SupplierUpdateDBRequest;
    type Response = SupplierDBResponse;
    type Id = SupplierId;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("INSERT INTO suppliers (name) VALUES ($1) RETURNING {SUPPLIER_COLUMNS}"))
            .bind(&request.name)
            .fetch_one(&self.db)
            .await?;

        Ok(supplier)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(supplier)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let suppliers = sqlx::query_as::<_, Supplier>(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&self.db)
            .await?;

        Ok(suppliers.into_iter().map(|s| (s.id, s)).collect())
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Self::Response>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY id"))
            .fetch_all(&self.db)
            .await?;

        Ok(suppliers)
    }

    #[instrument(skip(self, request), err)]
    async fn replace(&self, id: Self::Id, request: &Self::CreateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers SET name = $2, version = version + 1
            WHERE id = $1 AND ($3::INTEGER IS NULL OR version = $3)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(expected_version)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| conflict(id))
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest, expected_version: Option<Version>) -> Result<Self::Response> {
        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers SET name = COALESCE($2::TEXT, name), version = version + 1
            WHERE id = $1 AND ($3::INTEGER IS NULL OR version = $3)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name.as_deref())
        .bind(expected_version)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| conflict(id))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        // Row lock blocks concurrent inserts that reference this supplier until the delete commits
        let locked = sqlx::query_scalar::<_, SupplierId>("SELECT id FROM suppliers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        // Suppliers don't own their products: detach dependents instead of cascading
        let detached = sqlx::query("UPDATE products SET supplier_id = NULL, version = version + 1 WHERE supplier_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM suppliers WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        tracing::debug!("Deleted supplier {} and detached {} products", id, detached.rows_affected());

        Ok(true)
    }

    #[instrument(skip(self), err)]
    async fn exists(&self, id: Self::Id) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        Ok(exists)
    }
}

impl SupplierRepository for Suppliers {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{ProductRepository, Products};
    use crate::db::models::products::ProductUpdateDBRequest;
    use crate::db::models::products::ProductCreateDBRequest;
    use rust_decimal::Decimal;

    #[sqlx::test]
    async fn test_delete_supplier_detaches_products(pool: PgPool) {
        let suppliers = Suppliers::new(pool.clone());
        let products = Products::new(pool);

        let duncan = suppliers
            .create(&SupplierCreateDBRequest {
                name: "Duncan".to_string(),
            })
            .await
            .unwrap();
        let yo_yo = products
            .create(&ProductCreateDBRequest {
                name: "Yo-yo".to_string(),
                price: Decimal::new(495, 2),
                category: "Toys".to_string(),
                supplier_id: Some(duncan.id),
            })
            .await
            .unwrap();

        assert!(suppliers.delete(duncan.id).await.unwrap());
        assert!(!suppliers.exists(duncan.id).await.unwrap());

        let detached = products.get_by_id(yo_yo.id).await.unwrap().unwrap();
        assert_eq!(detached.supplier_id, None);
        assert!(products.list_by_supplier(duncan.id).await.unwrap().is_empty());

        assert!(!suppliers.delete(duncan.id).await.unwrap());
    }

    #[sqlx::test]
    async fn test_delete_waits_for_and_detaches_concurrent_links(pool: PgPool) {
        let suppliers = Suppliers::new(pool.clone());
        let products = Products::new(pool.clone());
        let duncan = suppliers
            .create(&SupplierCreateDBRequest {
                name: "Duncan".to_string(),
            })
            .await
            .unwrap();
        let yo_yo = products
            .create(&ProductCreateDBRequest {
                name: "Yo-yo".to_string(),
                price: Decimal::new(495, 2),
                category: "Toys".to_string(),
                supplier_id: None,
            })
            .await
            .unwrap();

        // Either the link lands first and is detached, or it runs after the delete and hits the FK
        let link = ProductUpdateDBRequest {
            supplier_id: Some(Some(duncan.id)),
            ..Default::default()
        };
        let (deleted, linked) = tokio::join!(
            suppliers.delete(duncan.id),
            products.update(yo_yo.id, &link, None),
        );

        assert!(deleted.unwrap());
        if let Err(err) = linked {
            assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        }
        assert_eq!(products.get_by_id(yo_yo.id).await.unwrap().unwrap().supplier_id, None);
    }

    #[sqlx::test]
    async fn test_update_missing_supplier_is_a_conflict(pool: PgPool) {
        let suppliers = Suppliers::new(pool);

        let err = suppliers
            .update(
                42,
                &SupplierUpdateDBRequest {
                    name: Some("Nobody".to_string()),
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrencyConflict { .. }));
    }
}
