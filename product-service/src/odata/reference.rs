//! Resolution of entity references (`@odata.id` values) to typed keys.
//!
//! A reference is an absolute URI or one relative to the service root, e.g.
//! `http://host/Suppliers(1)` or `Suppliers(1)`. The key of the last keyed segment is converted to the
//! caller's key type. Resolution is purely syntactic; whether the entity exists is the caller's concern.

use std::any::type_name;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::context::RequestContext;
use super::path::Segment;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("reference URI is empty")]
    Empty,

    #[error("reference '{reference}' is not a valid URI: {reason}")]
    Malformed { reference: String, reason: String },

    #[error("reference '{reference}' is not under the service root '{root}'")]
    OutsideServiceRoot { reference: String, root: String },

    #[error("reference '{reference}' does not contain a key")]
    MissingKey { reference: String },

    #[error("key '{key}' in reference '{reference}' is not a valid {expected}")]
    InvalidKey {
        reference: String,
        key: String,
        expected: &'static str,
    },
}

/// Resolve a reference URI to the key it addresses.
pub fn resolve_key<K: FromStr>(ctx: &RequestContext, reference: &str) -> Result<K, ReferenceError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ReferenceError::Empty);
    }

    let malformed = |reason: String| ReferenceError::Malformed {
        reference: reference.to_string(),
        reason,
    };

    // Absolute references replace the base entirely; relative ones resolve against it
    let url = ctx.service_root.join(reference).map_err(|e| malformed(e.to_string()))?;

    let root_path = ctx.service_root.path();
    let remainder = url.path().strip_prefix(root_path).ok_or_else(|| ReferenceError::OutsideServiceRoot {
        reference: reference.to_string(),
        root: ctx.service_root.to_string(),
    })?;

    let mut key = None;
    for raw in remainder.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|e| malformed(e.to_string()))?;
        let segment = Segment::parse(&decoded).map_err(|e| malformed(e.to_string()))?;
        if segment.key.is_some() {
            key = segment.key;
        }
    }

    let key = key.ok_or_else(|| ReferenceError::MissingKey {
        reference: reference.to_string(),
    })?;

    key.parse::<K>().map_err(|_| ReferenceError::InvalidKey {
        reference: reference.to_string(),
        key,
        expected: type_name::<K>(),
    })
}
