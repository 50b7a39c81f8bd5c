//! Entity reference bodies and the OData system query options the service understands.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of a `$ref` request: `{"@odata.id": "http://host/Suppliers(1)"}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntityReference {
    /// Absolute URI, or one relative to the service root, of the entity to link
    #[serde(rename = "@odata.id")]
    #[schema(example = "http://localhost:18003/Suppliers(1)")]
    pub odata_id: String,
}

/// System query options accepted on entity routes
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ODataQuery {
    /// Navigation properties to inline, comma-separated (e.g. `Supplier`)
    #[serde(rename = "$expand")]
    pub expand: Option<String>,

    /// Reference of the related entity when removing a collection `$ref`
    #[serde(rename = "$id")]
    pub id: Option<String>,
}
