use crate::document::flatten::{FlatMap, unflatten};
use crate::document::reverse_map::ReverseValueMap;
use crate::error::Result;
use crate::phase::Phase;
use serde_json::Value;

/// Nested document rebuilt from a reverse value map, ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedDocument {
    pub phase: Phase,
    pub file_name: String,
    pub document: Value,
}

/// Invert the reverse map into path/value pairs.
///
/// When two values claim the same path the one iterated last wins.
pub fn placeholder_flat_map(map: &ReverseValueMap) -> FlatMap {
    let mut flat = FlatMap::new();
    for (_, entry) in map.iter() {
        for token in &entry.placeholders {
            if let Some(path) = token.path() {
                flat.insert(path.to_string(), entry.value.clone());
            }
        }
    }
    flat
}

/// Rebuild the phase's output document from the placeholders seen during capture
pub fn reconstruct_document(phase: &str, map: &ReverseValueMap) -> Result<ReconstructedDocument> {
    let phase: Phase = phase.parse()?;
    let document = unflatten(&placeholder_flat_map(map))?;
    Ok(ReconstructedDocument {
        phase,
        file_name: phase.output_file(),
        document,
    })
}
