//! # product-service: Products and Suppliers over OData-style HTTP
//!
//! A CRUD service for two related entity sets, `Products` and `Suppliers`, addressed the OData way:
//!
//! - `GET /Products`, `GET /Products(1)`, `POST /Products`, `PUT|PATCH|DELETE /Products(1)`
//! - `GET /Products(1)/Supplier`, `GET /Suppliers(1)/Products`
//! - `PUT /Products(1)/Supplier/$ref` with `{"@odata.id": ".../Suppliers(2)"}` to link,
//!   `DELETE /Suppliers(2)/Products(1)/$ref` to unlink
//!
//! ## Architecture
//!
//! - **API layer** ([`api`]): route handlers and wire models
//! - **Addressing** ([`odata`]): segment parsing, reference resolution, the relation registry
//! - **Data layer** ([`db`]): repository traits with PostgreSQL and in-memory backends
//! - **Configuration** ([`config`]): YAML + environment configuration
//! - **Telemetry** ([`telemetry`]): tracing subscriber setup
//! - **Client** ([`client`]): HTTP client used by the `product-client` binary
//!
//! Writes are optimistic: every row carries a version, exposed as an `ETag`, and a replace or patch
//! only lands on the version it was based on.
//!
//! ## Getting Started
//!
//! ```no_run
//! use product_service::{Application, Config, telemetry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     telemetry::init_telemetry(config.log_format)?;
//!     let app = Application::new(config).await?;
//!     app.serve(async { tokio::signal::ctrl_c().await.ok(); }).await
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod odata;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{self, HeaderValue},
    routing::get,
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::handlers::{entity_sets, metadata};
use crate::config::CorsOrigin;
use crate::db::Stores;
use crate::db::handlers::{ProductRepository, SupplierRepository};
use crate::odata::RelationRegistry;
use crate::openapi::ApiDoc;
pub use config::Config;

/// Application state shared across all request handlers.
///
/// Repositories are trait objects so the same handlers run against PostgreSQL or the in-memory store.
///
/// # Example
///
/// ```ignore
/// let stores = Stores::in_memory();
/// let state = AppState::builder()
///     .config(config)
///     .products(stores.products)
///     .suppliers(stores.suppliers)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub products: Arc<dyn ProductRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    #[builder(default = Arc::new(RelationRegistry::standard()))]
    pub relations: Arc<RelationRegistry>,
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins carry no path; Url always renders one
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::IF_MATCH])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers([http::header::LOCATION, http::header::ETAG]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// The entity routes are mounted under `route_prefix` (or at the root when it is empty); `/healthz` and
/// `/docs` always live at the root.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let odata_routes = Router::new()
        .route("/$metadata", get(metadata::metadata))
        .route(
            "/{entity_set}",
            get(entity_sets::get_resource)
                .post(entity_sets::post_resource)
                .put(entity_sets::put_resource)
                .patch(entity_sets::patch_resource)
                .delete(entity_sets::delete_resource),
        )
        .route("/{entity_set}/{navigation}", get(entity_sets::get_navigation))
        .route(
            "/{entity_set}/{navigation}/$ref",
            axum::routing::put(entity_sets::add_reference)
                .post(entity_sets::add_reference)
                .delete(entity_sets::remove_reference),
        )
        .with_state(state.clone());

    let router = Router::new().route("/healthz", get(|| async { "OK" }));
    let router = if state.config.route_prefix.is_empty() {
        router.merge(odata_routes)
    } else {
        router.nest(&state.config.route_prefix, odata_routes)
    };
    let router = router.merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A configured service, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<sqlx::PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting product service with configuration: {:#?}", config);

        let relations = RelationRegistry::standard();
        relations.validate()?;

        let stores = Stores::connect(&config.database).await?;

        let app_state = AppState::builder()
            .config(config.clone())
            .products(stores.products)
            .suppliers(stores.suppliers)
            .relations(Arc::new(relations))
            .build();

        let router = build_router(app_state)?;

        Ok(Self {
            router,
            config,
            pool: stores.pool,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Product service listening on http://{}, available at http://localhost:{}{}/",
            bind_addr, self.config.port, self.config.route_prefix
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
