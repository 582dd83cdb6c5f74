//! Structured document handling
//!
//! This module converts reference documents into placeholder lookups and back:
//! - flatten: nested document <-> flat path map
//! - reverse_map: concrete value -> placeholder tokens for the active phase
//! - reconstruct: placeholder map -> nested output document

pub mod flatten;
pub mod reconstruct;
pub mod reverse_map;

pub use flatten::{FLATTEN_SEPARATOR, FlatMap, flatten, unflatten};
pub use reconstruct::{ReconstructedDocument, placeholder_flat_map, reconstruct_document};
pub use reverse_map::{PLACEHOLDER_SIGIL, PlaceholderToken, ReverseValueMap, ValueEntry, scalar_key};
