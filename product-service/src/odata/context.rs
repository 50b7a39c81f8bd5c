//! Per-request service root, passed explicitly to anything that builds or resolves entity URLs.

use axum::{
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};
use url::Url;

use crate::AppState;
use crate::errors::Error;
use crate::types::EntitySet;

/// The root URL entity addresses are relative to, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub service_root: Url,
}

impl RequestContext {
    pub fn new(mut service_root: Url) -> Self {
        if !service_root.path().ends_with('/') {
            let path = format!("{}/", service_root.path());
            service_root.set_path(&path);
        }
        service_root.set_query(None);
        service_root.set_fragment(None);
        Self { service_root }
    }

    /// Canonical URL of one entity, e.g. `http://host/Products(1)`
    pub fn entity_url(&self, set: EntitySet, id: impl std::fmt::Display) -> String {
        format!("{}{}({})", self.service_root, set.name(), id)
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(public_url) = &state.config.public_url {
            return Ok(Self::new(public_url.clone()));
        }

        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.authority().map(|authority| authority.as_str()))
            .ok_or_else(|| Error::BadRequest {
                message: "Missing Host header".to_string(),
            })?;
        let scheme = parts.uri.scheme_str().unwrap_or("http");

        let root = Url::parse(&format!("{scheme}://{host}{}/", state.config.route_prefix)).map_err(|_| Error::BadRequest {
            message: format!("Invalid Host header '{host}'"),
        })?;

        Ok(Self::new(root))
    }
}
