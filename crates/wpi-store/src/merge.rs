//! Recursive merge of nested mappings.

use std::collections::btree_map::Entry;

use crate::{Map, Value};

/// Merge `source` into `target`.
///
/// Mappings merge recursively; any other pairing overwrites the target value
/// with the source value. Keys absent from `source` are never touched.
///
/// # Example
///
/// ```
/// use wpi_store::{Value, deep_merge};
///
/// let Value::Map(mut target) = Value::from_json_str(r#"{"a": {"x": 1, "y": 2}}"#).unwrap() else {
///     unreachable!()
/// };
/// let Value::Map(source) = Value::from_json_str(r#"{"a": {"y": 3}}"#).unwrap() else {
///     unreachable!()
/// };
/// deep_merge(&mut target, source);
///
/// assert_eq!(Value::Map(target).to_json_string(), r#"{"a":{"x":1,"y":3}}"#);
/// ```
pub fn deep_merge(target: &mut Map, source: Map) {
    for (key, incoming) in source {
        match target.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (Value::Map(existing), Value::Map(incoming)) => deep_merge(existing, incoming),
                (existing, incoming) => *existing = incoming,
            },
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }
}

/// Return `overlay` deep-merged over a copy of `base`.
#[must_use]
pub fn merged(base: &Map, overlay: Map) -> Map {
    let mut result = base.clone();
    deep_merge(&mut result, overlay);
    result
}
