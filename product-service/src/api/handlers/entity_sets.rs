//! Route handlers for the entity-set routes.
//!
//! Each handler parses the OData segment (`Products`, `Products(1)`), then hands off to the typed
//! operation in [`super::products`], [`super::suppliers`] or [`super::references`].

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};

use super::{Precondition, products, references, suppliers};
use crate::AppState;
use crate::api::models::{
    products::{ProductCreate, ProductResponse, ProductUpdate},
    references::{EntityReference, ODataQuery},
};
use crate::errors::{Error, ErrorBody, Result};
use crate::odata::{RelationKind, RequestContext, path::Segment};
use crate::types::EntitySet;

/// An entity set, optionally narrowed to one entity by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addressed {
    pub set: EntitySet,
    pub key: Option<i32>,
}

impl Addressed {
    pub fn parse(raw: &str) -> Result<Self> {
        let segment = parse_segment(raw)?;
        let set: EntitySet = segment.name.parse().map_err(|_| Error::NotFound {
            resource: "Entity set".to_string(),
            id: segment.name.clone(),
        })?;
        let key = segment.key.as_deref().map(|key| parse_key(set, key)).transpose()?;
        Ok(Self { set, key })
    }

    fn entity(self) -> Result<i32> {
        self.key.ok_or_else(|| Error::BadRequest {
            message: format!("This operation addresses a single {}; add a key, e.g. {}(1)", self.set.resource(), self.set),
        })
    }

    fn collection(self) -> Result<EntitySet> {
        match self.key {
            None => Ok(self.set),
            Some(_) => Err(Error::BadRequest {
                message: format!("This operation addresses the {} collection and takes no key", self.set),
            }),
        }
    }
}

fn parse_segment(raw: &str) -> Result<Segment> {
    Segment::parse(raw).map_err(|e| Error::BadRequest { message: e.to_string() })
}

fn parse_key(set: EntitySet, key: &str) -> Result<i32> {
    key.parse().map_err(|_| Error::BadRequest {
        message: format!("'{key}' is not a valid key for {set}"),
    })
}

#[utoipa::path(
    get,
    path = "/{entitySet}",
    tag = "entities",
    summary = "Read a collection or one entity",
    description = "`/Products` and `/Suppliers` return arrays; `/Products(1)` returns one entity with an `ETag`.",
    params(
        ("entitySet" = String, Path, description = "Entity set, optionally keyed: `Products`, `Products(1)`, `Suppliers(Id=2)`"),
        ODataQuery,
    ),
    responses(
        (status = 200, description = "Entities", body = Vec<ProductResponse>),
        (status = 400, description = "Malformed key or unknown $expand property", body = ErrorBody),
        (status = 404, description = "Entity not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(entity_set): Path<String>,
    Query(query): Query<ODataQuery>,
) -> Result<Response> {
    let target = Addressed::parse(&entity_set)?;
    let expand = state.relations.parse_expand(target.set, query.expand.as_deref())?;

    match (target.set, target.key) {
        (EntitySet::Products, None) => products::list(&state, &expand).await,
        (EntitySet::Products, Some(id)) => products::get(&state, id, &expand).await,
        (EntitySet::Suppliers, None) => suppliers::list(&state, &expand).await,
        (EntitySet::Suppliers, Some(id)) => suppliers::get(&state, id, &expand).await,
    }
}

#[utoipa::path(
    post,
    path = "/{entitySet}",
    tag = "entities",
    summary = "Create an entity",
    description = "The store assigns the key; any `id` in the body is ignored.",
    params(("entitySet" = String, Path, description = "`Products` or `Suppliers`")),
    request_body = ProductCreate,
    responses(
        (status = 201, description = "Created; `Location` names the new entity", body = ProductResponse),
        (status = 400, description = "Invalid body or unknown supplierId", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn post_resource(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(entity_set): Path<String>,
    body: Bytes,
) -> Result<Response> {
    match Addressed::parse(&entity_set)?.collection()? {
        EntitySet::Products => products::create(&state, &ctx, &body).await,
        EntitySet::Suppliers => suppliers::create(&state, &ctx, &body).await,
    }
}

#[utoipa::path(
    put,
    path = "/{entitySet}",
    tag = "entities",
    summary = "Replace an entity",
    description = "Overwrites every field. The body `id` must equal the key. `If-Match: W/\"<version>\"` makes the write conditional.",
    params(
        ("entitySet" = String, Path, description = "Keyed entity, e.g. `Products(1)`"),
        ("If-Match" = Option<String>, Header, description = "Entity tag from an earlier read"),
    ),
    request_body = ProductCreate,
    responses(
        (status = 200, description = "Replaced", body = ProductResponse),
        (status = 400, description = "Invalid body or key mismatch", body = ErrorBody),
        (status = 404, description = "Entity not found", body = ErrorBody),
        (status = 500, description = "Concurrent modification", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn put_resource(
    State(state): State<AppState>,
    Path(entity_set): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let target = Addressed::parse(&entity_set)?;
    let id = target.entity()?;
    let precondition = Precondition::from_headers(&headers)?;

    match target.set {
        EntitySet::Products => products::replace(&state, id, precondition, &body).await,
        EntitySet::Suppliers => suppliers::replace(&state, id, precondition, &body).await,
    }
}

#[utoipa::path(
    patch,
    path = "/{entitySet}",
    tag = "entities",
    summary = "Patch an entity",
    description = "Writes only the provided fields; `\"supplierId\": null` clears the supplier. The write is conditional on the \
                   `If-Match` version, or on the version read just before writing.",
    params(
        ("entitySet" = String, Path, description = "Keyed entity, e.g. `Products(1)`"),
        ("If-Match" = Option<String>, Header, description = "Entity tag from an earlier read"),
    ),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Patched", body = ProductResponse),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 404, description = "Entity not found", body = ErrorBody),
        (status = 500, description = "Concurrent modification", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn patch_resource(
    State(state): State<AppState>,
    Path(entity_set): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let target = Addressed::parse(&entity_set)?;
    let id = target.entity()?;
    let precondition = Precondition::from_headers(&headers)?;

    match target.set {
        EntitySet::Products => products::patch(&state, id, precondition, &body).await,
        EntitySet::Suppliers => suppliers::patch(&state, id, precondition, &body).await,
    }
}

#[utoipa::path(
    delete,
    path = "/{entitySet}",
    tag = "entities",
    summary = "Delete an entity",
    description = "Deleting a supplier detaches its products; they are not deleted.",
    params(("entitySet" = String, Path, description = "Keyed entity, e.g. `Suppliers(1)`")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Entity not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_resource(State(state): State<AppState>, Path(entity_set): Path<String>) -> Result<Response> {
    let target = Addressed::parse(&entity_set)?;
    let id = target.entity()?;

    match target.set {
        EntitySet::Products => products::delete(&state, id).await,
        EntitySet::Suppliers => suppliers::delete(&state, id).await,
    }
}

#[utoipa::path(
    get,
    path = "/{entitySet}/{navigation}",
    tag = "navigation",
    summary = "Follow a navigation property",
    description = "`Products(1)/Supplier` returns the supplier, or 204 when unset. `Suppliers(1)/Products` returns an array.",
    params(
        ("entitySet" = String, Path, description = "Keyed owner, e.g. `Products(1)`"),
        ("navigation" = String, Path, description = "`Supplier` or `Products`, optionally keyed for collections"),
    ),
    responses(
        (status = 200, description = "Related entity or entities"),
        (status = 204, description = "Single-valued relation is unset"),
        (status = 400, description = "Unknown navigation property", body = ErrorBody),
        (status = 404, description = "Owner not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_navigation(State(state): State<AppState>, Path((entity_set, navigation)): Path<(String, String)>) -> Result<Response> {
    let owner = Addressed::parse(&entity_set)?;
    let id = owner.entity()?;
    let navigation = parse_segment(&navigation)?;

    let relation = state.relations.lookup(owner.set, &navigation.name).ok_or_else(|| Error::BadRequest {
        message: format!("'{}' is not a navigation property of {}", navigation.name, owner.set),
    })?;

    match relation.kind {
        RelationKind::ProductSupplier => {
            if navigation.key.is_some() {
                return Err(Error::BadRequest {
                    message: format!("{} is single-valued and takes no key", relation.name),
                });
            }
            products::supplier_of(&state, id).await
        }
        RelationKind::SupplierProducts => {
            let member = navigation
                .key
                .as_deref()
                .map(|key| parse_key(relation.target, key))
                .transpose()?;
            suppliers::products_of(&state, id, member).await
        }
    }
}

#[utoipa::path(
    method(put, post),
    path = "/{entitySet}/{navigation}/$ref",
    tag = "references",
    summary = "Link an entity",
    description = "Sets a single-valued relation to the entity named by `@odata.id`. Collection relations are not supported.",
    params(
        ("entitySet" = String, Path, description = "Keyed owner, e.g. `Products(1)`"),
        ("navigation" = String, Path, description = "Navigation property, e.g. `Supplier`"),
    ),
    request_body = EntityReference,
    responses(
        (status = 204, description = "Linked"),
        (status = 400, description = "Invalid reference", body = ErrorBody),
        (status = 404, description = "Owner or target not found", body = ErrorBody),
        (status = 501, description = "Relation cannot be linked this way", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_reference(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((entity_set, navigation)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response> {
    let owner = Addressed::parse(&entity_set)?;
    let id = owner.entity()?;
    let navigation = parse_segment(&navigation)?;

    references::add(&state, &ctx, owner.set, id, &navigation, &body).await
}

#[utoipa::path(
    delete,
    path = "/{entitySet}/{navigation}/$ref",
    tag = "references",
    summary = "Unlink an entity",
    description = "Clears the foreign key that stores the link; no entity is deleted. For collections, name the member \
                   in the path (`Suppliers(1)/Products(3)/$ref`) or with `$id`.",
    params(
        ("entitySet" = String, Path, description = "Keyed owner, e.g. `Suppliers(1)`"),
        ("navigation" = String, Path, description = "Navigation property, optionally keyed"),
        ODataQuery,
    ),
    responses(
        (status = 204, description = "Unlinked"),
        (status = 400, description = "Invalid reference", body = ErrorBody),
        (status = 404, description = "Owner or linked entity not found", body = ErrorBody),
        (status = 501, description = "Relation cannot be unlinked", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_reference(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((entity_set, navigation)): Path<(String, String)>,
    Query(query): Query<ODataQuery>,
) -> Result<Response> {
    let owner = Addressed::parse(&entity_set)?;
    let id = owner.entity()?;
    let navigation = parse_segment(&navigation)?;

    references::remove(&state, &ctx, owner.set, id, &navigation, query.id.as_deref()).await
}
