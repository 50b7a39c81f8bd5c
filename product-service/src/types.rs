//! Common type definitions shared by the database and API layers.
//!
//! # ID Types
//!
//! Keys are plain integers assigned by the store:
//!
//! - [`ProductId`]: Product primary key
//! - [`SupplierId`]: Supplier primary key
//!
//! # Entity sets
//!
//! [`EntitySet`] names the addressable collections (`Products`, `Suppliers`). Names are matched
//! case-insensitively when parsed from a request path.
//!
//! # Row versions
//!
//! Every row carries a [`Version`] that the store bumps on each write. It is exposed to clients as a
//! weak entity tag, see [`format_etag`] and [`parse_etag`].

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub type ProductId = i32;
pub type SupplierId = i32;
pub type Version = i32;

/// The addressable collections of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntitySet {
    Products,
    Suppliers,
}

impl EntitySet {
    pub const ALL: [EntitySet; 2] = [EntitySet::Products, EntitySet::Suppliers];

    /// Collection name as it appears in URLs
    pub fn name(&self) -> &'static str {
        match self {
            EntitySet::Products => "Products",
            EntitySet::Suppliers => "Suppliers",
        }
    }

    /// Singular resource name used in error messages
    pub fn resource(&self) -> &'static str {
        match self {
            EntitySet::Products => "Product",
            EntitySet::Suppliers => "Supplier",
        }
    }
}

impl fmt::Display for EntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntitySet(pub String);

impl fmt::Display for UnknownEntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity set '{}'", self.0)
    }
}

impl std::error::Error for UnknownEntitySet {}

impl FromStr for EntitySet {
    type Err = UnknownEntitySet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntitySet::ALL
            .into_iter()
            .find(|set| set.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEntitySet(s.to_string()))
    }
}

/// Render a row version as a weak entity tag: `W/"3"`
pub fn format_etag(version: Version) -> String {
    format!("W/\"{version}\"")
}

/// Parse an `If-Match` value back into a row version.
///
/// Accepts weak (`W/"3"`) and strong (`"3"`) tags. Returns `None` for `*`, which matches any version.
pub fn parse_etag(value: &str) -> Result<Option<Version>, String> {
    let value = value.trim();
    if value == "*" {
        return Ok(None);
    }
    let tag = value.strip_prefix("W/").unwrap_or(value);
    tag.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .and_then(|t| t.parse::<Version>().ok())
        .map(Some)
        .ok_or_else(|| format!("invalid entity tag '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_set_parse_is_case_insensitive() {
        assert_eq!("Products".parse::<EntitySet>().unwrap(), EntitySet::Products);
        assert_eq!("suppliers".parse::<EntitySet>().unwrap(), EntitySet::Suppliers);
        assert!("Orders".parse::<EntitySet>().is_err());
    }

    #[test]
    fn test_etag_roundtrip_and_wildcard() {
        assert_eq!(format_etag(7), "W/\"7\"");
        assert_eq!(parse_etag("W/\"7\"").unwrap(), Some(7));
        assert_eq!(parse_etag("\"12\"").unwrap(), Some(12));
        assert_eq!(parse_etag("*").unwrap(), None);
        assert!(parse_etag("seven").is_err());
        assert!(parse_etag("W/\"x\"").is_err());
    }
}
