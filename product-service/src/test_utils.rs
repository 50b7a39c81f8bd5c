//! Test utilities: an in-memory application and helpers that seed it over HTTP.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use url::Url;

use crate::config::{Config, DatabaseConfig};
use crate::db::Stores;
use crate::{AppState, build_router};

/// Service root advertised by test servers
pub const TEST_SERVICE_ROOT: &str = "http://localhost/";

pub fn create_test_config() -> Config {
    Config {
        public_url: Some(Url::parse(TEST_SERVICE_ROOT).expect("valid test root")),
        database: DatabaseConfig::Memory,
        ..Default::default()
    }
}

pub fn create_test_state() -> AppState {
    let stores = Stores::in_memory();
    AppState::builder()
        .config(create_test_config())
        .products(stores.products)
        .suppliers(stores.suppliers)
        .build()
}

/// A server over a fresh in-memory store
pub fn create_test_app() -> TestServer {
    create_test_app_with_state(create_test_state())
}

pub fn create_test_app_with_state(state: AppState) -> TestServer {
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router.into_make_service()).expect("Failed to create test server")
}

pub async fn create_test_supplier(server: &TestServer, name: &str) -> i32 {
    let response = server.post("/Suppliers").json(&json!({ "name": name })).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().expect("supplier id") as i32
}

pub async fn create_test_product(server: &TestServer, name: &str, supplier_id: Option<i32>) -> i32 {
    let response = server
        .post("/Products")
        .json(&json!({ "name": name, "price": 4.95, "category": "Toys", "supplierId": supplier_id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().expect("product id") as i32
}

/// `ETag` header of a response, as sent
pub fn etag_of(response: &axum_test::TestResponse) -> String {
    response
        .header("etag")
        .to_str()
        .expect("ASCII etag")
        .to_string()
}
