//! Function references stored in values.
//!
//! Only [`Callable::Closure`] is ever invoked by reference evaluation. Named
//! functions and method references are opaque identifiers: a directive
//! string can never use them to call into arbitrary named code.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::Value;

/// Signature of an inline closure.
///
/// The argument is a mapping exposing `state` and `context`.
pub type ClosureFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Inline closure stored in the store, invoked during evaluation.
#[derive(Clone)]
pub struct Closure(Arc<ClosureFn>);

impl Closure {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the closure with the given argument.
    #[must_use]
    pub fn call(&self, args: &Value) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closure(..)")
    }
}

impl PartialEq for Closure {
    /// Two closures are equal when they share the same allocation.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// How a method reference is bound to its receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodBinding {
    /// Method on an object instance.
    Instance,
    /// Associated (static) function on a type.
    Static,
}

/// A callable value.
#[derive(Clone, Debug, PartialEq)]
pub enum Callable {
    /// Inline closure. Invoked when a reference resolves to it.
    Closure(Closure),
    /// Reference to a named function. Never invoked.
    Named(String),
    /// Reference to a method on a receiver. Never invoked.
    Method {
        receiver: String,
        method: String,
        binding: MethodBinding,
    },
}

impl Callable {
    /// Wrap an inline closure.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_store::{Callable, Value};
    ///
    /// let double = Callable::closure(|args| {
    ///     let n = args.get("state").and_then(|s| s.get("n")).cloned();
    ///     n.unwrap_or_default()
    /// });
    /// assert!(double.is_invocable());
    /// ```
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Closure(Closure::new(f))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn method(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            receiver: receiver.into(),
            method: method.into(),
            binding: MethodBinding::Instance,
        }
    }

    pub fn static_method(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            receiver: receiver.into(),
            method: method.into(),
            binding: MethodBinding::Static,
        }
    }

    /// Whether reference evaluation may invoke this callable.
    #[must_use]
    pub fn is_invocable(&self) -> bool {
        matches!(self, Self::Closure(_))
    }
}

impl Serialize for Callable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Closure(_) => serializer.serialize_unit(),
            Self::Named(name) => serializer.serialize_str(name),
            Self::Method {
                receiver, method, ..
            } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(receiver)?;
                seq.serialize_element(method)?;
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_call() {
        let closure = Closure::new(|args| args.get("n").cloned().unwrap_or_default());
        let args = Value::from_json_str(r#"{"n": 5}"#).unwrap();
        assert_eq!(closure.call(&args), Value::from(5_i64));
    }

    #[test]
    fn test_closure_identity_equality() {
        let a = Callable::closure(|_| Value::Null);
        let b = Callable::closure(|_| Value::Null);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_only_closures_are_invocable() {
        assert!(Callable::closure(|_| Value::Null).is_invocable());
        assert!(!Callable::named("increment").is_invocable());
        assert!(!Callable::method("counter", "increment").is_invocable());
        assert!(!Callable::static_method("Counter", "increment").is_invocable());
    }

    #[test]
    fn test_method_binding() {
        let Callable::Method { binding, .. } = Callable::static_method("Counter", "increment")
        else {
            panic!("expected method reference");
        };
        assert_eq!(binding, MethodBinding::Static);
    }
}
