//! Value model and scoped store for interactivity directives.
//!
//! This crate provides:
//! - [`Value`]: tagged value type (JSON plus [`Callable`]s)
//! - [`deep_merge`]: the recursive merge rule shared by the store and contexts
//! - [`Store`]: the process-wide, namespace-keyed store that `state.*`
//!   references resolve against
//!
//! # Example
//!
//! ```
//! use wpi_store::{Callable, Map, Store, Value};
//!
//! let store = Store::new();
//! store.merge_json(r#"{"state": {"count": 3}}"#).unwrap();
//! store.merge(Map::from([(
//!     "selectors".to_owned(),
//!     Value::Map(Map::from([(
//!         "double".to_owned(),
//!         Value::from(Callable::closure(|_| Value::from(6_i64))),
//!     )])),
//! )]));
//!
//! assert_eq!(store.snapshot().len(), 2);
//! ```

mod callable;
mod merge;
mod store;
mod value;

pub use callable::{Callable, Closure, ClosureFn, MethodBinding};
pub use merge::{deep_merge, merged};
pub use store::{Store, StoreError, StoreSnapshot};
pub use value::{Map, Value};
