//! `$metadata`: a JSON description of the entity sets and their navigation properties.

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;
use crate::odata::{Relation, RelationRegistry};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub entity_sets: Vec<EntitySetMetadata>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntitySetMetadata {
    pub name: &'static str,
    pub entity_type: &'static str,
    pub key: &'static str,
    #[schema(value_type = Vec<Object>)]
    pub navigation_properties: Vec<Relation>,
}

impl From<&RelationRegistry> for ServiceMetadata {
    fn from(registry: &RelationRegistry) -> Self {
        let entity_sets = registry
            .sets()
            .iter()
            .map(|set| EntitySetMetadata {
                name: set.name(),
                entity_type: set.resource(),
                key: "id",
                navigation_properties: registry.relations_of(*set).cloned().collect(),
            })
            .collect();
        Self { entity_sets }
    }
}

#[utoipa::path(
    get,
    path = "/$metadata",
    tag = "service",
    summary = "Describe the service",
    responses((status = 200, description = "Entity sets and navigation properties", body = ServiceMetadata))
)]
#[tracing::instrument(skip_all)]
pub async fn metadata(State(state): State<AppState>) -> Json<ServiceMetadata> {
    Json(ServiceMetadata::from(state.relations.as_ref()))
}
