//! DOM inspection and element identity module
//!
//! This module provides the page model the capture engine works against:
//! - DomNode: Representation of DOM elements with computed style and geometry
//! - StructuralPath: Sibling-indexed tag path used as an element identity key
//! - ScanGeneration: Mapping of short-lived uids to structural paths
//! - InteractableDescriptor: Metadata captured for each visible interactable
//! - Page: Access to the live document

pub mod descriptor;
pub mod element;
pub mod page;
pub mod path;
pub mod scan;

pub use descriptor::{InteractableDescriptor, infer_field_name, label_text, sanitize_key};
pub use element::{BoundingBox, ComputedStyle, DomNode, ScrollMetrics, Viewport};
pub use page::{MutationKind, Page, PageEvent, PageSnapshot, SnapshotPage};
pub use path::{NodeHandle, StructuralPath, lineage, locate, structural_path, within_subtree};
pub use scan::{Scan, ScanGeneration, Uid, scan_page};
