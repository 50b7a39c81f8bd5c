//! OpenAPI documentation, served at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers::{entity_sets, metadata};
use crate::api::models::{
    products::{ProductCreate, ProductResponse, ProductUpdate},
    references::EntityReference,
    suppliers::{SupplierCreate, SupplierResponse, SupplierUpdate},
};
use crate::errors::{ErrorBody, ErrorDetail};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Service",
        description = "Products and Suppliers with OData-style addressing. Entities are addressed as `Products(1)`; \
                       navigation properties as `Products(1)/Supplier`; links are changed through `$ref`. \
                       Every operation on `Products` has a `Suppliers` counterpart with `SupplierCreate`/`SupplierUpdate` bodies."
    ),
    paths(
        entity_sets::get_resource,
        entity_sets::post_resource,
        entity_sets::put_resource,
        entity_sets::patch_resource,
        entity_sets::delete_resource,
        entity_sets::get_navigation,
        entity_sets::add_reference,
        entity_sets::remove_reference,
        metadata::metadata,
    ),
    components(schemas(
        ProductCreate,
        ProductUpdate,
        ProductResponse,
        SupplierCreate,
        SupplierUpdate,
        SupplierResponse,
        EntityReference,
        ErrorBody,
        ErrorDetail,
    )),
    tags(
        (name = "entities", description = "Entity set CRUD"),
        (name = "navigation", description = "Navigation properties"),
        (name = "references", description = "Entity links ($ref)"),
        (name = "service", description = "Service description"),
    )
)]
pub struct ApiDoc;
