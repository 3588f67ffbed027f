//! Process-wide scoped store.
//!
//! The store is a single nested mapping whose top-level keys are namespaces
//! (for example `state` or `selectors`, or a plugin namespace such as
//! `myPlugin`). Application setup code merges partial mappings into it; the
//! directive processor reads it through cheap [`StoreSnapshot`]s.

use std::ops::Deref;
use std::sync::{Arc, LazyLock, RwLock};

use crate::{Map, Value, deep_merge};

static GLOBAL: LazyLock<Store> = LazyLock::new(Store::new);

/// Error raised when seeding the store from external data.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The input was not valid JSON.
    #[error("invalid store JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The input was valid but not a mapping.
    #[error("store data must be a mapping, got {0}")]
    NotAMap(&'static str),
}

/// Append-merged, namespace-keyed global state.
///
/// # Thread Safety
///
/// The data lives behind an `RwLock<Arc<Map>>`. Merges copy on write, so
/// snapshots taken before a merge keep observing the old data and readers
/// never hold the lock while evaluating references.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<Arc<Map>>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by the whole process.
    ///
    /// It starts empty and is never reset.
    pub fn global() -> &'static Store {
        &GLOBAL
    }

    /// Deep-merge a partial mapping into the store.
    ///
    /// Later merges at the same path overwrite; siblings are preserved.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_store::{Store, Value};
    ///
    /// let store = Store::new();
    /// store.merge_json(r#"{"state": {"core": {"number": 1}}}"#).unwrap();
    /// store.merge_json(r#"{"state": {"core": {"bool": true}}}"#).unwrap();
    ///
    /// let state = store.namespace("state");
    /// let core = state.get("core").unwrap();
    /// assert_eq!(core.get("number"), Some(&Value::from(1_i64)));
    /// assert_eq!(core.get("bool"), Some(&Value::Bool(true)));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn merge(&self, partial: Map) {
        let namespaces: Vec<String> = partial.keys().cloned().collect();
        let mut data = self.data.write().unwrap();
        deep_merge(Arc::make_mut(&mut data), partial);
        tracing::debug!(?namespaces, "Merged into store");
    }

    /// Merge an arbitrary value, which must be a mapping.
    pub fn merge_value(&self, partial: Value) -> Result<(), StoreError> {
        match partial {
            Value::Map(map) => {
                self.merge(map);
                Ok(())
            }
            other => Err(StoreError::NotAMap(other.kind())),
        }
    }

    /// Parse a JSON object and merge it.
    pub fn merge_json(&self, json: &str) -> Result<(), StoreError> {
        self.merge_value(Value::from_json_str(json)?)
    }

    /// Copy of one namespace's mapping (empty if absent or not a mapping).
    #[must_use]
    pub fn namespace(&self, name: &str) -> Map {
        self.snapshot().namespace(name).cloned().unwrap_or_default()
    }

    /// Current contents, detached from later merges.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot(Arc::clone(&self.data.read().unwrap()))
    }
}

/// Immutable view of the store at one point in time.
#[derive(Clone, Debug, Default)]
pub struct StoreSnapshot(Arc<Map>);

impl StoreSnapshot {
    /// Build a snapshot directly from a mapping.
    #[must_use]
    pub fn from_map(map: Map) -> Self {
        Self(Arc::new(map))
    }

    /// The mapping stored under `name`, if it is a mapping.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Map> {
        self.0.get(name).and_then(Value::as_map)
    }
}

impl Deref for StoreSnapshot {
    type Target = Map;

    fn deref(&self) -> &Map {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_store_is_empty() {
        let store = Store::new();
        assert!(store.snapshot().is_empty());
        assert!(store.namespace("state").is_empty());
    }

    #[test]
    fn test_merge_is_additive() {
        let store = Store::new();
        store.merge_json(r#"{"state": {"count": 3}}"#).unwrap();
        store
            .merge_json(r#"{"selectors": {"label": "x"}}"#)
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.namespace("state").and_then(|s| s.get("count")),
            Some(&Value::from(3_i64))
        );
    }

    #[test]
    fn test_snapshot_is_detached_from_later_merges() {
        let store = Store::new();
        store.merge_json(r#"{"state": {"count": 1}}"#).unwrap();
        let before = store.snapshot();

        store.merge_json(r#"{"state": {"count": 2}}"#).unwrap();

        assert_eq!(
            before.namespace("state").and_then(|s| s.get("count")),
            Some(&Value::from(1_i64))
        );
        assert_eq!(
            store.namespace("state").get("count"),
            Some(&Value::from(2_i64))
        );
    }

    #[test]
    fn test_namespace_that_is_not_a_map() {
        let store = Store::new();
        store.merge_json(r#"{"flag": true}"#).unwrap();
        assert!(store.namespace("flag").is_empty());
        assert!(store.snapshot().namespace("flag").is_none());
    }

    #[test]
    fn test_merge_value_rejects_non_map() {
        let store = Store::new();
        let err = store.merge_value(Value::from("nope")).unwrap_err();
        assert!(matches!(err, StoreError::NotAMap("string")));
    }

    #[test]
    fn test_merge_json_rejects_invalid_json() {
        let store = Store::new();
        let err = store.merge_json("{").unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(Store::global(), Store::global()));
    }
}
