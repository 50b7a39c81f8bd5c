//! Product operations, reached through the generic entity-set routes.

use std::collections::HashSet;

use axum::{
    Json,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{Precondition, entity_response, not_found, parse_body, settle_write};
use crate::AppState;
use crate::api::models::{
    products::{ProductCreate, ProductResponse, ProductUpdate},
    suppliers::SupplierResponse,
};
use crate::db::models::products::{ProductCreateDBRequest, ProductUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::odata::{Relation, RelationKind, RequestContext};
use crate::types::{EntitySet, ProductId, SupplierId};

fn wants_supplier(expand: &[&Relation]) -> bool {
    expand.iter().any(|relation| relation.kind == RelationKind::ProductSupplier)
}

fn check_body_key(body_id: Option<ProductId>, key: ProductId) -> Result<()> {
    match body_id {
        Some(body_id) if body_id != key => Err(Error::BadRequest {
            message: format!("Body id {body_id} does not match key {key}"),
        }),
        _ => Ok(()),
    }
}

#[tracing::instrument(skip_all)]
pub async fn list(state: &AppState, expand: &[&Relation]) -> Result<Response> {
    let products = state.products.list().await?;

    let suppliers = if wants_supplier(expand) {
        let ids: HashSet<SupplierId> = products.iter().filter_map(|p| p.supplier_id).collect();
        state.suppliers.get_bulk(ids.into_iter().collect()).await?
    } else {
        Default::default()
    };

    let body: Vec<ProductResponse> = products
        .into_iter()
        .map(|product| {
            let supplier = product
                .supplier_id
                .and_then(|id| suppliers.get(&id))
                .cloned()
                .map(SupplierResponse::from);
            ProductResponse::from(product).with_supplier(supplier)
        })
        .collect();

    Ok(Json(body).into_response())
}

#[tracing::instrument(skip(state, expand))]
pub async fn get(state: &AppState, id: ProductId, expand: &[&Relation]) -> Result<Response> {
    let product = state
        .products
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Products, id))?;

    let supplier = match product.supplier_id {
        Some(supplier_id) if wants_supplier(expand) => state.suppliers.get_by_id(supplier_id).await?.map(SupplierResponse::from),
        _ => None,
    };

    let version = product.version;
    Ok(entity_response(
        StatusCode::OK,
        version,
        ProductResponse::from(product).with_supplier(supplier),
        None,
    ))
}

#[tracing::instrument(skip_all)]
pub async fn create(state: &AppState, ctx: &RequestContext, body: &Bytes) -> Result<Response> {
    let request: ProductCreate = parse_body(body)?;
    request.validate()?;

    let product = state.products.create(&ProductCreateDBRequest::from(request)).await?;
    tracing::info!(product_id = product.id, "Created product");

    let location = ctx.entity_url(EntitySet::Products, product.id);
    Ok(entity_response(
        StatusCode::CREATED,
        product.version,
        ProductResponse::from(product),
        Some(location),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn replace(state: &AppState, id: ProductId, precondition: Precondition, body: &Bytes) -> Result<Response> {
    let request: ProductCreate = parse_body(body)?;
    if request.id.is_none() {
        return Err(Error::BadRequest {
            message: format!("Body id is required and must match key {id}"),
        });
    }
    check_body_key(request.id, id)?;
    request.validate()?;

    let outcome = state
        .products
        .replace(id, &ProductCreateDBRequest::from(request), precondition.for_replace())
        .await;
    let product = settle_write(state.products.as_ref(), EntitySet::Products, id, outcome).await?;

    Ok(entity_response(StatusCode::OK, product.version, ProductResponse::from(product), None))
}

#[tracing::instrument(skip(state, body))]
pub async fn patch(state: &AppState, id: ProductId, precondition: Precondition, body: &Bytes) -> Result<Response> {
    let request: ProductUpdate = parse_body(body)?;
    check_body_key(request.id, id)?;
    request.validate()?;

    let current = state
        .products
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Products, id))?;

    let outcome = state
        .products
        .update(id, &ProductUpdateDBRequest::from(request), precondition.for_patch(current.version))
        .await;
    let product = settle_write(state.products.as_ref(), EntitySet::Products, id, outcome).await?;

    Ok(entity_response(StatusCode::OK, product.version, ProductResponse::from(product), None))
}

#[tracing::instrument(skip(state))]
pub async fn delete(state: &AppState, id: ProductId) -> Result<Response> {
    if !state.products.delete(id).await? {
        return Err(not_found(EntitySet::Products, id));
    }
    tracing::info!(product_id = id, "Deleted product");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `Products(k)/Supplier`: the owning supplier, or 204 when the product has none
#[tracing::instrument(skip(state))]
pub async fn supplier_of(state: &AppState, id: ProductId) -> Result<Response> {
    let product = state
        .products
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Products, id))?;

    let Some(supplier_id) = product.supplier_id else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let supplier = state
        .suppliers
        .get_by_id(supplier_id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Suppliers, supplier_id))?;

    Ok(entity_response(StatusCode::OK, supplier.version, SupplierResponse::from(supplier), None))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, create_test_product, create_test_supplier, etag_of};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[test_log::test(tokio::test)]
    async fn test_create_returns_location_and_etag() {
        let server = create_test_app();

        let response = server
            .post("/Products")
            .json(&json!({ "id": 99, "name": "Yo-yo", "price": 4.95, "category": "Toys" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.header("location"), "http://localhost/Products(1)");
        assert_eq!(etag_of(&response), "W/\"1\"");
        let body: Value = response.json();
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Yo-yo");
        assert_eq!(body["supplierId"], Value::Null);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let server = create_test_app();
        let id = create_test_product(&server, "Yo-yo", None).await;

        let response = server.get(&format!("/Products({id})")).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["category"], "Toys");

        server.delete(&format!("/Products({id})")).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&format!("/Products({id})")).await.assert_status_not_found();
        server.delete(&format!("/Products({id})")).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_keys_are_not_reused_after_delete() {
        let server = create_test_app();
        let first = create_test_product(&server, "Yo-yo", None).await;
        server.delete(&format!("/Products({first})")).await.assert_status(StatusCode::NO_CONTENT);

        let second = create_test_product(&server, "Kite", None).await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_validation_errors() {
        let server = create_test_app();

        let response = server.post("/Products").json(&json!({ "name": "Yo-yo" })).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "ValidationError");

        let response = server
            .post("/Products")
            .json(&json!({ "name": " ", "price": 1.0, "category": "Toys" }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "ValidationError");
    }

    #[tokio::test]
    async fn test_prices_outside_storage_precision_are_rejected() {
        let server = create_test_app();

        for price in [json!(4.955), json!(1e17)] {
            let response = server
                .post("/Products")
                .json(&json!({ "name": "Yo-yo", "price": price, "category": "Toys" }))
                .await;
            response.assert_status_bad_request();
            assert_eq!(response.json::<Value>()["error"]["code"], "ValidationError", "price {price}");
        }
        server.get("/Products").await.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn test_patch_with_unknown_field_changes_nothing() {
        let server = create_test_app();
        let id = create_test_product(&server, "Yo-yo", None).await;

        let response = server.patch(&format!("/Products({id})")).json(&json!({ "nmae": "Kite" })).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "ValidationError");

        let current = server.get(&format!("/Products({id})")).await;
        assert_eq!(etag_of(&current), "W/\"1\"");
    }

    #[tokio::test]
    async fn test_unknown_supplier_on_create_is_rejected() {
        let server = create_test_app();

        server
            .post("/Products")
            .json(&json!({ "name": "Yo-yo", "price": 4.95, "category": "Toys", "supplierId": 7 }))
            .await
            .assert_status_bad_request();
        server.get("/Products").await.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn test_patch_changes_only_given_fields() {
        let server = create_test_app();
        let supplier = create_test_supplier(&server, "Duncan").await;
        let id = create_test_product(&server, "Yo-yo", Some(supplier)).await;

        let response = server.patch(&format!("/Products({id})")).json(&json!({ "name": "Super Yo-yo" })).await;
        response.assert_status_ok();
        assert_eq!(etag_of(&response), "W/\"2\"");
        let body: Value = response.json();
        assert_eq!(body["name"], "Super Yo-yo");
        assert_eq!(body["category"], "Toys");
        assert_eq!(body["supplierId"], supplier);

        // Same patch again leaves the same state
        let again: Value = server
            .patch(&format!("/Products({id})"))
            .json(&json!({ "name": "Super Yo-yo" }))
            .await
            .json();
        assert_eq!(again["name"], "Super Yo-yo");
        assert_eq!(again["supplierId"], supplier);
    }

    #[tokio::test]
    async fn test_patch_null_supplier_clears_link() {
        let server = create_test_app();
        let supplier = create_test_supplier(&server, "Duncan").await;
        let id = create_test_product(&server, "Yo-yo", Some(supplier)).await;

        let body: Value = server
            .patch(&format!("/Products({id})"))
            .json(&json!({ "supplierId": null }))
            .await
            .json();
        assert_eq!(body["supplierId"], Value::Null);

        server.get(&format!("/Products({id})/Supplier")).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&format!("/Suppliers({supplier})")).await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_patch_missing_product_is_not_found() {
        let server = create_test_app();
        server
            .patch("/Products(5)")
            .json(&json!({ "name": "Kite" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_stale_if_match_is_a_concurrency_conflict() {
        let server = create_test_app();
        let id = create_test_product(&server, "Yo-yo", None).await;

        let first = server.get(&format!("/Products({id})")).await;
        let stale = etag_of(&first);

        server
            .patch(&format!("/Products({id})"))
            .add_header("If-Match", stale.as_str())
            .json(&json!({ "price": 5.25 }))
            .await
            .assert_status_ok();

        let response = server
            .patch(&format!("/Products({id})"))
            .add_header("If-Match", stale.as_str())
            .json(&json!({ "price": 6.0 }))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"]["code"], "ConcurrencyConflict");

        let current: Value = server.get(&format!("/Products({id})")).await.json();
        assert_eq!(current["price"], 5.25);
    }

    #[tokio::test]
    async fn test_replace_overwrites_and_checks_key() {
        let server = create_test_app();
        let id = create_test_product(&server, "Yo-yo", None).await;

        let response = server
            .put(&format!("/Products({id})"))
            .json(&json!({ "id": id, "name": "Kite", "price": 12.5, "category": "Outdoor" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["name"], "Kite");
        assert_eq!(body["category"], "Outdoor");

        server
            .put(&format!("/Products({id})"))
            .json(&json!({ "id": id + 1, "name": "Kite", "price": 12.5, "category": "Outdoor" }))
            .await
            .assert_status_bad_request();

        server
            .put("/Products(40)")
            .json(&json!({ "id": 40, "name": "Kite", "price": 12.5, "category": "Outdoor" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_expand_supplier() {
        let server = create_test_app();
        let supplier = create_test_supplier(&server, "Duncan").await;
        let linked = create_test_product(&server, "Yo-yo", Some(supplier)).await;
        create_test_product(&server, "Kite", None).await;

        let plain: Value = server.get("/Products").await.json();
        assert!(plain[0].get("supplier").is_none());

        let expanded: Value = server.get("/Products").add_query_param("$expand", "Supplier").await.json();
        assert_eq!(expanded[0]["supplier"]["name"], "Duncan");
        assert!(expanded[1].get("supplier").is_none());

        let one: Value = server
            .get(&format!("/Products({linked})"))
            .add_query_param("$expand", "supplier")
            .await
            .json();
        assert_eq!(one["supplier"]["id"], supplier);

        server
            .get("/Products")
            .add_query_param("$expand", "Manufacturer")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_supplier_navigation() {
        let server = create_test_app();
        let supplier = create_test_supplier(&server, "Duncan").await;
        let id = create_test_product(&server, "Yo-yo", Some(supplier)).await;

        let response = server.get(&format!("/Products({id})/Supplier")).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["name"], "Duncan");

        server.get("/Products(9)/Supplier").await.assert_status_not_found();
        server.get(&format!("/Products({id})/Warehouse")).await.assert_status_bad_request();
    }
}
