//! Supplier operations, reached through the generic entity-set routes.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{Precondition, entity_response, not_found, parse_body, settle_write};
use crate::AppState;
use crate::api::models::{
    products::ProductResponse,
    suppliers::{SupplierCreate, SupplierResponse, SupplierUpdate},
};
use crate::db::models::suppliers::{SupplierCreateDBRequest, SupplierUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::odata::{Relation, RelationKind, RequestContext};
use crate::types::{EntitySet, ProductId, SupplierId};

fn wants_products(expand: &[&Relation]) -> bool {
    expand.iter().any(|relation| relation.kind == RelationKind::SupplierProducts)
}

fn check_body_key(body_id: Option<SupplierId>, key: SupplierId) -> Result<()> {
    match body_id {
        Some(body_id) if body_id != key => Err(Error::BadRequest {
            message: format!("Body id {body_id} does not match key {key}"),
        }),
        _ => Ok(()),
    }
}

#[tracing::instrument(skip_all)]
pub async fn list(state: &AppState, expand: &[&Relation]) -> Result<Response> {
    let suppliers = state.suppliers.list().await?;

    if !wants_products(expand) {
        let body: Vec<SupplierResponse> = suppliers.into_iter().map(SupplierResponse::from).collect();
        return Ok(Json(body).into_response());
    }

    // One pass over products instead of one query per supplier
    let mut by_supplier: HashMap<SupplierId, Vec<ProductResponse>> = HashMap::new();
    for product in state.products.list().await? {
        if let Some(supplier_id) = product.supplier_id {
            by_supplier.entry(supplier_id).or_default().push(product.into());
        }
    }

    let body: Vec<SupplierResponse> = suppliers
        .into_iter()
        .map(|supplier| {
            let products = by_supplier.remove(&supplier.id).unwrap_or_default();
            SupplierResponse::from(supplier).with_products(products)
        })
        .collect();

    Ok(Json(body).into_response())
}

#[tracing::instrument(skip(state, expand))]
pub async fn get(state: &AppState, id: SupplierId, expand: &[&Relation]) -> Result<Response> {
    let supplier = state
        .suppliers
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Suppliers, id))?;

    let version = supplier.version;
    let mut body = SupplierResponse::from(supplier);
    if wants_products(expand) {
        let products = state.products.list_by_supplier(id).await?;
        body = body.with_products(products.into_iter().map(ProductResponse::from).collect());
    }

    Ok(entity_response(StatusCode::OK, version, body, None))
}

#[tracing::instrument(skip_all)]
pub async fn create(state: &AppState, ctx: &RequestContext, body: &Bytes) -> Result<Response> {
    let request: SupplierCreate = parse_body(body)?;
    request.validate()?;

    let supplier = state.suppliers.create(&SupplierCreateDBRequest::from(request)).await?;
    tracing::info!(supplier_id = supplier.id, "Created supplier");

    let location = ctx.entity_url(EntitySet::Suppliers, supplier.id);
    Ok(entity_response(
        StatusCode::CREATED,
        supplier.version,
        SupplierResponse::from(supplier),
        Some(location),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn replace(state: &AppState, id: SupplierId, precondition: Precondition, body: &Bytes) -> Result<Response> {
    let request: SupplierCreate = parse_body(body)?;
    if request.id.is_none() {
        return Err(Error::BadRequest {
            message: format!("Body id is required and must match key {id}"),
        });
    }
    check_body_key(request.id, id)?;
    request.validate()?;

    let outcome = state
        .suppliers
        .replace(id, &SupplierCreateDBRequest::from(request), precondition.for_replace())
        .await;
    let supplier = settle_write(state.suppliers.as_ref(), EntitySet::Suppliers, id, outcome).await?;

    Ok(entity_response(StatusCode::OK, supplier.version, SupplierResponse::from(supplier), None))
}

#[tracing::instrument(skip(state, body))]
pub async fn patch(state: &AppState, id: SupplierId, precondition: Precondition, body: &Bytes) -> Result<Response> {
    let request: SupplierUpdate = parse_body(body)?;
    check_body_key(request.id, id)?;
    request.validate()?;

    let current = state
        .suppliers
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(EntitySet::Suppliers, id))?;

    let outcome = state
        .suppliers
        .update(id, &SupplierUpdateDBRequest::from(request), precondition.for_patch(current.version))
        .await;
    let supplier = settle_write(state.suppliers.as_ref(), EntitySet::Suppliers, id, outcome).await?;

    Ok(entity_response(StatusCode::OK, supplier.version, SupplierResponse::from(supplier), None))
}

/// Deletes the supplier and detaches its products; the products themselves are kept
#[tracing::instrument(skip(state))]
pub async fn delete(state: &AppState, id: SupplierId) -> Result<Response> {
    if !state.suppliers.delete(id).await? {
        return Err(not_found(EntitySet::Suppliers, id));
    }
    tracing::info!(supplier_id = id, "Deleted supplier");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `Suppliers(k)/Products`, or `Suppliers(k)/Products(p)` for one member of the collection
#[tracing::instrument(skip(state))]
pub async fn products_of(state: &AppState, id: SupplierId, member: Option<ProductId>) -> Result<Response> {
    if !state.suppliers.exists(id).await? {
        return Err(not_found(EntitySet::Suppliers, id));
    }

    match member {
        None => {
            let products = state.products.list_by_supplier(id).await?;
            let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(body).into_response())
        }
        Some(product_id) => {
            let product = state
                .products
                .get_by_id(product_id)
                .await?
                .filter(|product| product.supplier_id == Some(id))
                .ok_or_else(|| not_found(EntitySet::Products, product_id))?;
            Ok(entity_response(StatusCode::OK, product.version, ProductResponse::from(product), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, create_test_product, create_test_supplier, etag_of};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_supplier_crud() {
        let server = create_test_app();

        let response = server.post("/Suppliers").json(&json!({ "name": "Duncan" })).await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.header("location"), "http://localhost/Suppliers(1)");

        let patched = server.patch("/Suppliers(1)").json(&json!({ "name": "Duncan Toys" })).await;
        patched.assert_status_ok();
        assert_eq!(etag_of(&patched), "W/\"2\"");

        let replaced: Value = server
            .put("/Suppliers(1)")
            .json(&json!({ "id": 1, "name": "Duncan Ltd" }))
            .await
            .json();
        assert_eq!(replaced["name"], "Duncan Ltd");

        server.delete("/Suppliers(1)").await.assert_status(StatusCode::NO_CONTENT);
        server.get("/Suppliers(1)").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_blank_supplier_name_rejected() {
        let server = create_test_app();
        let response = server.post("/Suppliers").json(&json!({ "name": "" })).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], "ValidationError");
    }

    #[tokio::test]
    async fn test_delete_supplier_detaches_products() {
        let server = create_test_app();
        let supplier = create_test_supplier(&server, "Duncan").await;
        let id = create_test_product(&server, "Yo-yo", Some(supplier)).await;

        server.delete(&format!("/Suppliers({supplier})")).await.assert_status(StatusCode::NO_CONTENT);

        let product: Value = server.get(&format!("/Products({id})")).await.json();
        assert_eq!(product["name"], "Yo-yo");
        assert_eq!(product["supplierId"], Value::Null);
    }

    #[tokio::test]
    async fn test_products_navigation_and_expand() {
        let server = create_test_app();
        let duncan = create_test_supplier(&server, "Duncan").await;
        let other = create_test_supplier(&server, "Acme").await;
        let yoyo = create_test_product(&server, "Yo-yo", Some(duncan)).await;
        let kite = create_test_product(&server, "Kite", Some(other)).await;

        let products: Value = server.get(&format!("/Suppliers({duncan})/Products")).await.json();
        assert_eq!(products.as_array().unwrap().len(), 1);
        assert_eq!(products[0]["id"], yoyo);

        server
            .get(&format!("/Suppliers({duncan})/Products({yoyo})"))
            .await
            .assert_status_ok();
        server
            .get(&format!("/Suppliers({duncan})/Products({kite})"))
            .await
            .assert_status_not_found();
        server.get("/Suppliers(77)/Products").await.assert_status_not_found();

        let expanded: Value = server.get("/Suppliers").add_query_param("$expand", "Products").await.json();
        assert_eq!(expanded[0]["products"][0]["name"], "Yo-yo");
        assert_eq!(expanded[1]["products"][0]["name"], "Kite");

        let one: Value = server
            .get(&format!("/Suppliers({other})"))
            .add_query_param("$expand", "Products")
            .await
            .json();
        assert_eq!(one["products"].as_array().unwrap().len(), 1);
    }
}
