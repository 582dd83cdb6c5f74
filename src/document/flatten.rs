use crate::error::{CaptureError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Token joining nested keys and array indices in a flat path
pub const FLATTEN_SEPARATOR: &str = "->>";

/// Flat path to scalar value, in traversal order
pub type FlatMap = IndexMap<String, Value>;

/// Flatten a nested document into path/scalar pairs.
///
/// Object members become `parent->>key`, array elements `parent->>index`.
/// Nulls are kept as scalars; empty containers produce no entries.
pub fn flatten(doc: &Value) -> FlatMap {
    let mut flat = FlatMap::new();
    flatten_into(doc, None, &mut flat);
    flat
}

fn flatten_into(value: &Value, path: Option<String>, out: &mut FlatMap) {
    match value {
        Value::Object(members) => {
            for (key, child) in members {
                flatten_into(child, Some(join(path.as_deref(), key)), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, Some(join(path.as_deref(), &index.to_string())), out);
            }
        }
        scalar => {
            if let Some(path) = path {
                out.insert(path, scalar.clone());
            }
        }
    }
}

fn join(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{}{}{}", parent, FLATTEN_SEPARATOR, key),
        None => key.to_string(),
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Rebuild a nested document from a flat map.
///
/// An intermediate container is an array when the following segment is purely
/// numeric, otherwise an object. Arrays are padded with nulls so keys may arrive
/// in any order. Numeric-looking object keys below the root come back as array
/// indices, and a path that needs a container where a scalar already sits (or
/// the reverse) is rejected with [`CaptureError::StructuralConflict`].
pub fn unflatten(flat: &FlatMap) -> Result<Value> {
    let mut root = Value::Object(Map::new());
    for (flat_key, value) in flat {
        let segments: Vec<&str> = flat_key.split(FLATTEN_SEPARATOR).collect();
        insert_path(&mut root, &segments, value.clone(), flat_key)?;
    }
    Ok(root)
}

fn insert_path(root: &mut Value, segments: &[&str], value: Value, flat_key: &str) -> Result<()> {
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let slot = child_slot(current, segment, flat_key)?;

        if i + 1 == segments.len() {
            if slot.is_object() || slot.is_array() {
                return Err(conflict(flat_key, "expected a scalar, found a container"));
            }
            *slot = value;
            return Ok(());
        }

        if slot.is_null() {
            *slot = if is_index(segments[i + 1]) {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        } else if !slot.is_object() && !slot.is_array() {
            return Err(conflict(flat_key, "expected a container, found a scalar"));
        }
        current = slot;
    }
    Ok(())
}

fn child_slot<'a>(container: &'a mut Value, segment: &str, flat_key: &str) -> Result<&'a mut Value> {
    match container {
        Value::Object(members) => Ok(members.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index: usize = segment
                .parse()
                .map_err(|_| conflict(flat_key, &format!("'{}' is not an array index", segment)))?;
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        _ => Err(conflict(flat_key, "expected a container, found a scalar")),
    }
}

fn conflict(path: &str, reason: &str) -> CaptureError {
    CaptureError::StructuralConflict {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
