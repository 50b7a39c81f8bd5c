//! OData addressing: path segments, entity references and navigation properties.
//!
//! - [`path`]: `Products(1)` style segments and key literals
//! - [`reference`]: resolving `@odata.id` URIs to typed keys
//! - [`relations`]: the registry of navigation properties the handlers dispatch through
//! - [`context`]: the per-request service root

pub mod context;
pub mod path;
pub mod reference;
pub mod relations;

pub use context::RequestContext;
pub use reference::{ReferenceError, resolve_key};
pub use relations::{Cardinality, Relation, RelationKind, RelationRegistry};
