//! `$ref` link maintenance.
//!
//! Adding or removing a link never creates or deletes entities; it only writes the foreign key that
//! stores the relation. Which key that is comes from the [`RelationRegistry`](crate::odata::RelationRegistry).

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{not_found, parse_body, settle_write};
use crate::AppState;
use crate::api::models::references::EntityReference;
use crate::errors::{Error, Result};
use crate::odata::{Relation, RelationKind, RequestContext, path::Segment, resolve_key};
use crate::types::{EntitySet, ProductId, SupplierId};

fn not_implemented(set: EntitySet, name: &str) -> Error {
    Error::NotImplemented {
        resource: set.name().to_string(),
        relation: name.to_string(),
    }
}

async fn ensure_exists(state: &AppState, set: EntitySet, id: i32) -> Result<()> {
    let exists = match set {
        EntitySet::Products => state.products.exists(id).await?,
        EntitySet::Suppliers => state.suppliers.exists(id).await?,
    };
    if exists { Ok(()) } else { Err(not_found(set, id)) }
}

/// Find a navigation property that supports the requested `$ref` operation
fn supported_relation<'a>(state: &'a AppState, set: EntitySet, name: &str, supports: impl Fn(&Relation) -> bool) -> Result<&'a Relation> {
    state
        .relations
        .lookup(set, name)
        .filter(|relation| supports(*relation))
        .ok_or_else(|| not_implemented(set, name))
}

/// `PUT|POST /{set}(k)/{navigation}/$ref` with an `@odata.id` body
#[tracing::instrument(skip(state, ctx, navigation, body), fields(relation = %navigation.name))]
pub async fn add(state: &AppState, ctx: &RequestContext, set: EntitySet, id: i32, navigation: &Segment, body: &Bytes) -> Result<Response> {
    ensure_exists(state, set, id).await?;
    let relation = supported_relation(state, set, &navigation.name, |relation| relation.ref_add)?;

    if navigation.key.is_some() {
        return Err(Error::BadRequest {
            message: "The entity to link is given in the request body, not the path".to_string(),
        });
    }
    let reference: EntityReference = parse_body(body)?;

    match relation.kind {
        RelationKind::ProductSupplier => {
            let supplier_id: SupplierId = resolve_key(ctx, &reference.odata_id)?;
            if !state.suppliers.exists(supplier_id).await? {
                return Err(not_found(EntitySet::Suppliers, supplier_id));
            }
            let outcome = state.products.set_supplier(id, Some(supplier_id)).await;
            settle_write(state.products.as_ref(), EntitySet::Products, id, outcome).await?;
            tracing::info!(product_id = id, supplier_id, "Linked product to supplier");
        }
        RelationKind::SupplierProducts => return Err(not_implemented(set, relation.name)),
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `DELETE /{set}(k)/{navigation}/$ref`, `DELETE /{set}(k)/{navigation}(r)/$ref` or
/// `DELETE /{set}(k)/{navigation}/$ref?$id=<uri>`
#[tracing::instrument(skip(state, ctx, navigation), fields(relation = %navigation.name))]
pub async fn remove(
    state: &AppState,
    ctx: &RequestContext,
    set: EntitySet,
    id: i32,
    navigation: &Segment,
    related: Option<&str>,
) -> Result<Response> {
    ensure_exists(state, set, id).await?;
    let relation = supported_relation(state, set, &navigation.name, |relation| relation.ref_remove)?;

    match relation.kind {
        RelationKind::ProductSupplier => {
            if navigation.key.is_some() {
                return Err(Error::BadRequest {
                    message: format!("{} is single-valued and takes no key", relation.name),
                });
            }
            let outcome = state.products.set_supplier(id, None).await;
            settle_write(state.products.as_ref(), EntitySet::Products, id, outcome).await?;
            tracing::info!(product_id = id, "Cleared product supplier");
        }
        RelationKind::SupplierProducts => {
            let product_id: ProductId = match (&navigation.key, related) {
                (Some(key), _) => key.parse().map_err(|_| Error::BadRequest {
                    message: format!("'{key}' is not a valid key for {}", relation.target),
                })?,
                (None, Some(reference)) => resolve_key(ctx, reference)?,
                (None, None) => {
                    return Err(Error::BadRequest {
                        message: format!("Name the {} to unlink in the path or with $id", relation.target.resource()),
                    });
                }
            };

            // Conditional on the product still pointing at this supplier; a concurrent relink wins
            let outcome = state.products.detach_from(product_id, id).await;
            settle_write(state.products.as_ref(), EntitySet::Products, product_id, outcome).await?;
            tracing::info!(product_id, supplier_id = id, "Unlinked product from supplier");
        }
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
