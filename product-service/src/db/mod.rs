//! Data persistence and access.
//!
//! The store is the single source of truth for products and suppliers. Access goes through the
//! repository traits in [`handlers`], which have two backends:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │  Arc<dyn ProductRepository> / Arc<dyn SupplierRepository>
//!        ↓
//! ┌─────────────┬──────────────┐
//! │ PostgreSQL  │  In-memory   │  (db::handlers, db::in_memory)
//! └─────────────┴──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository traits and the PostgreSQL implementations
//! - [`in_memory`]: Lock-protected in-process implementation
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Optimistic concurrency
//!
//! Every row carries a `version` that each write increments. `replace` and `update` take the version
//! the caller last saw and only land when it still matches; otherwise they return
//! [`errors::DbError::ConcurrencyConflict`] and leave the row untouched.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{DatabaseConfig, PoolSettings};
use crate::db::handlers::{ProductRepository, Products, SupplierRepository, Suppliers};
use crate::db::in_memory::InMemoryStore;

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Repositories backing one running service
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    /// Set when backed by PostgreSQL, so the pool can be closed on shutdown
    pub pool: Option<sqlx::PgPool>,
}

impl Stores {
    /// Both repositories over a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            products: Arc::new(store.products()),
            suppliers: Arc::new(store.suppliers()),
            pool: None,
        }
    }

    /// Both repositories over one PostgreSQL pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            products: Arc::new(Products::new(pool.clone())),
            suppliers: Arc::new(Suppliers::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Open the configured store, running migrations for PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        match config {
            DatabaseConfig::Memory => {
                info!("Using in-memory store");
                Ok(Self::in_memory())
            }
            DatabaseConfig::External { url, pool } => {
                let pool = create_pool(url, pool).await?;
                migrator().run(&pool).await?;
                info!("Connected to PostgreSQL, migrations applied");
                Ok(Self::postgres(pool))
            }
        }
    }
}

async fn create_pool(url: &str, settings: &PoolSettings) -> anyhow::Result<sqlx::PgPool> {
    // 0 disables the idle and lifetime limits
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
        .connect(url)
        .await?;
    Ok(pool)
}
