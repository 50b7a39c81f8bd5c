//! HTTP request handlers for all API endpoints.
//!
//! Routes are generic over the entity set (`/{entitySet}`, `/{entitySet}/{navigation}`,
//! `/{entitySet}/{navigation}/$ref`), so the axum handlers in [`entity_sets`] parse the OData segment and
//! dispatch to the per-entity operations.
//!
//! # Handler Modules
//!
//! - [`entity_sets`]: Route handlers and segment dispatch
//! - [`products`]: Product operations, including the `Supplier` navigation property
//! - [`suppliers`]: Supplier operations, including the `Products` navigation property
//! - [`references`]: Adding and removing `$ref` links through the relation registry
//! - [`metadata`]: `$metadata` service description
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the JSON error body and status code.

use std::fmt::Display;

use axum::{
    Json,
    body::Bytes,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::db::errors::DbError;
use crate::db::handlers::Repository;
use crate::errors::{Error, Result};
use crate::types::{EntitySet, Version, format_etag, parse_etag};

pub mod entity_sets;
pub mod metadata;
pub mod products;
pub mod references;
pub mod suppliers;

/// What the client asserted about the row version with `If-Match`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No `If-Match` header
    Absent,
    /// `If-Match: *`
    Any,
    /// `If-Match: W/"<version>"`
    Version(Version),
}

impl Precondition {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let Some(value) = headers.get(header::IF_MATCH) else {
            return Ok(Precondition::Absent);
        };
        let value = value.to_str().map_err(|_| Error::BadRequest {
            message: "If-Match header is not valid text".to_string(),
        })?;
        match parse_etag(value) {
            Ok(Some(version)) => Ok(Precondition::Version(version)),
            Ok(None) => Ok(Precondition::Any),
            Err(message) => Err(Error::BadRequest { message }),
        }
    }

    /// Version a patch is conditional on: the asserted one, or the one just read
    pub fn for_patch(self, current: Version) -> Option<Version> {
        match self {
            Precondition::Absent => Some(current),
            Precondition::Any => None,
            Precondition::Version(version) => Some(version),
        }
    }

    /// Version a replace is conditional on; without an assertion only existence is required
    pub fn for_replace(self) -> Option<Version> {
        match self {
            Precondition::Version(version) => Some(version),
            Precondition::Absent | Precondition::Any => None,
        }
    }
}

pub(crate) fn not_found(set: EntitySet, id: impl Display) -> Error {
    Error::NotFound {
        resource: set.resource().to_string(),
        id: id.to_string(),
    }
}

/// Turn the outcome of a conditional write into a response error.
///
/// A conflict on a row that no longer exists is a plain 404; on a row that still exists it is fatal.
pub(crate) async fn settle_write<R>(repo: &R, set: EntitySet, id: R::Id, outcome: crate::db::errors::Result<R::Response>) -> Result<R::Response>
where
    R: Repository + ?Sized,
{
    match outcome {
        Ok(response) => Ok(response),
        Err(DbError::ConcurrencyConflict { .. }) => {
            if repo.exists(id).await? {
                Err(Error::ConcurrencyConflict {
                    resource: set.resource().to_string(),
                    id: id.to_string(),
                })
            } else {
                Err(not_found(set, id))
            }
        }
        Err(DbError::NotFound) => Err(not_found(set, id)),
        Err(err) => Err(err.into()),
    }
}

/// Deserialize a JSON request body; any failure is a validation error
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::Validation {
        message: format!("Invalid request body: {e}"),
    })
}

/// Response carrying one entity and its version as an `ETag`
pub(crate) fn entity_response<T: Serialize>(status: StatusCode, version: Version, body: T, location: Option<String>) -> Response {
    let mut response = (status, Json(body)).into_response();
    let headers = response.headers_mut();
    if let Ok(etag) = HeaderValue::from_str(&format_etag(version)) {
        headers.insert(header::ETAG, etag);
    }
    if let Some(location) = location.and_then(|location| HeaderValue::from_str(&location).ok()) {
        headers.insert(header::LOCATION, location);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(Precondition::from_headers(&headers).unwrap(), Precondition::Absent);

        headers.insert(header::IF_MATCH, HeaderValue::from_static("*"));
        assert_eq!(Precondition::from_headers(&headers).unwrap(), Precondition::Any);

        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"4\""));
        assert_eq!(Precondition::from_headers(&headers).unwrap(), Precondition::Version(4));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("garbage"));
        assert!(Precondition::from_headers(&headers).is_err());
    }

    #[test]
    fn test_expected_versions() {
        assert_eq!(Precondition::Absent.for_patch(3), Some(3));
        assert_eq!(Precondition::Any.for_patch(3), None);
        assert_eq!(Precondition::Version(2).for_patch(3), Some(2));
        assert_eq!(Precondition::Absent.for_replace(), None);
        assert_eq!(Precondition::Version(2).for_replace(), Some(2));
    }
}
