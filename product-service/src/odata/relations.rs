//! Navigation properties between entity sets.
//!
//! Every relation the handlers can follow is declared here, keyed by `(source set, name)`. Handlers
//! never infer relations from type shapes; they look them up, so an unknown name is a clean 501 or 400
//! rather than a silent miss. [`RelationRegistry::validate`] runs at startup.

use serde::Serialize;
use thiserror::Error;

use crate::errors::Error;
use crate::types::EntitySet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Collection,
}

/// Which storage path implements a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationKind {
    /// `Products(k)/Supplier`, stored as `products.supplier_id`
    ProductSupplier,
    /// `Suppliers(k)/Products`, the inverse of [`RelationKind::ProductSupplier`]
    SupplierProducts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(skip)]
    pub source: EntitySet,
    pub name: &'static str,
    pub target: EntitySet,
    pub cardinality: Cardinality,
    #[serde(skip)]
    pub kind: RelationKind,
    /// `$ref` PUT/POST is supported
    pub ref_add: bool,
    /// `$ref` DELETE is supported
    pub ref_remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("relation {set}/{name} is registered twice")]
    Duplicate { set: EntitySet, name: &'static str },

    #[error("relation {set}/{name} starts from an unregistered entity set")]
    UnknownSource { set: EntitySet, name: &'static str },

    #[error("relation {set}/{name} targets unregistered entity set {target}")]
    UnknownTarget {
        set: EntitySet,
        name: &'static str,
        target: EntitySet,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    sets: Vec<EntitySet>,
    relations: Vec<Relation>,
}

impl RelationRegistry {
    pub fn new(sets: impl IntoIterator<Item = EntitySet>) -> Self {
        Self {
            sets: sets.into_iter().collect(),
            relations: Vec::new(),
        }
    }

    pub fn register(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// The Products/Suppliers model
    pub fn standard() -> Self {
        Self::new(EntitySet::ALL)
            .register(Relation {
                source: EntitySet::Products,
                name: "Supplier",
                target: EntitySet::Suppliers,
                cardinality: Cardinality::Single,
                kind: RelationKind::ProductSupplier,
                ref_add: true,
                ref_remove: true,
            })
            .register(Relation {
                source: EntitySet::Suppliers,
                name: "Products",
                target: EntitySet::Products,
                cardinality: Cardinality::Collection,
                kind: RelationKind::SupplierProducts,
                ref_add: false,
                ref_remove: true,
            })
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        for (i, relation) in self.relations.iter().enumerate() {
            let (set, name) = (relation.source, relation.name);
            if !self.sets.contains(&set) {
                return Err(RegistryError::UnknownSource { set, name });
            }
            if !self.sets.contains(&relation.target) {
                return Err(RegistryError::UnknownTarget {
                    set,
                    name,
                    target: relation.target,
                });
            }
            if self.relations[..i]
                .iter()
                .any(|other| other.source == set && other.name.eq_ignore_ascii_case(name))
            {
                return Err(RegistryError::Duplicate { set, name });
            }
        }
        Ok(())
    }

    pub fn sets(&self) -> &[EntitySet] {
        &self.sets
    }

    /// Case-insensitive lookup of a navigation property
    pub fn lookup(&self, source: EntitySet, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| relation.source == source && relation.name.eq_ignore_ascii_case(name))
    }

    pub fn relations_of(&self, source: EntitySet) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(move |relation| relation.source == source)
    }

    /// Parse a `$expand` value: a comma-separated list of navigation property names
    pub fn parse_expand(&self, source: EntitySet, expand: Option<&str>) -> Result<Vec<&Relation>, Error> {
        let Some(expand) = expand else {
            return Ok(Vec::new());
        };

        let mut relations: Vec<&Relation> = Vec::new();
        for name in expand.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let relation = self.lookup(source, name).ok_or_else(|| Error::BadRequest {
                message: format!("'{name}' is not a navigation property of {source}"),
            })?;
            if !relations.iter().any(|seen| seen.kind == relation.kind) {
                relations.push(relation);
            }
        }
        Ok(relations)
    }
}
