//! Reference expression evaluation.
//!
//! A reference is a dotted path such as `state.core.number` or
//! `!context.isOpen`. The first segment selects the root: `context` walks the
//! effective context of the current tag, any other root walks the store.
//! Evaluation never fails; a path that cannot be followed yields
//! [`Value::Null`].

use wpi_store::{Callable, Map, Store, StoreSnapshot, Value};

/// How `state.*` (and any other non-`context`) references find their root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StateResolution {
    /// Walk the whole store starting from its top-level keys, so
    /// `state.count` reads `store["state"]["count"]`.
    #[default]
    Global,
    /// Walk the store entry of the active namespace, so `state.count` inside
    /// `data-wp-interactive='{"namespace": "shop"}'` reads
    /// `store["shop"]["state"]["count"]`.
    ///
    /// Outside any interactive scope `default_namespace` is used; without
    /// one, such references resolve to null.
    Namespaced { default_namespace: Option<String> },
}

/// A parsed reference expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference<'a> {
    negated: bool,
    root: &'a str,
    path: Vec<&'a str>,
}

impl<'a> Reference<'a> {
    /// Parse `[!]root.key[.key...]`.
    ///
    /// Returns `None` when there is no key after the root or a segment is
    /// empty.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_directives::Reference;
    ///
    /// let reference = Reference::parse("!context.isOpen").unwrap();
    /// assert!(reference.is_negated());
    /// assert_eq!(reference.root(), "context");
    /// assert_eq!(reference.path(), ["isOpen"]);
    ///
    /// assert!(Reference::parse("state").is_none());
    /// ```
    #[must_use]
    pub fn parse(expression: &'a str) -> Option<Self> {
        let expression = expression.trim();
        let (negated, body) = match expression.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, expression),
        };
        let mut segments = body.split('.');
        let root = segments.next().filter(|s| !s.is_empty())?;
        let path: Vec<&str> = segments.collect();
        if path.is_empty() || path.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self {
            negated,
            root,
            path,
        })
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    #[must_use]
    pub fn root(&self) -> &'a str {
        self.root
    }

    #[must_use]
    pub fn path(&self) -> &[&'a str] {
        &self.path
    }
}

/// Resolves reference expressions against a store snapshot and a context.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    store: StoreSnapshot,
    resolution: StateResolution,
}

impl Evaluator {
    #[must_use]
    pub fn new(store: StoreSnapshot) -> Self {
        Self {
            store,
            resolution: StateResolution::default(),
        }
    }

    /// Set how non-`context` roots are resolved.
    #[must_use]
    pub fn with_resolution(mut self, resolution: StateResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Evaluate outside of any interactive namespace.
    #[must_use]
    pub fn evaluate(&self, expression: &str, context: &Map) -> Value {
        self.evaluate_in(expression, context, None)
    }

    /// Evaluate with `namespace` as the nearest interactive namespace.
    ///
    /// The result is, in order:
    /// - null if the expression does not parse or the path is unresolved
    /// - the return value of an anonymous closure found at the end of the
    ///   path, called with `{"state": ..., "context": ...}`
    /// - the value found at the end of the path (other callables included,
    ///   unexecuted)
    ///
    /// A leading `!` replaces the result with its negated truthiness.
    #[must_use]
    pub fn evaluate_in(&self, expression: &str, context: &Map, namespace: Option<&str>) -> Value {
        let Some(reference) = Reference::parse(expression) else {
            return Value::Null;
        };

        let lookup_root = self.lookup_root(namespace);
        let start = if reference.root == "context" {
            Some(context)
        } else {
            lookup_root.and_then(|root| root.get(reference.root)?.as_map())
        };

        let resolved = start.and_then(|map| walk(map, &reference.path));
        let value = match resolved {
            Some(Value::Callable(Callable::Closure(closure))) => {
                let state = lookup_root
                    .and_then(|root| root.get("state"))
                    .cloned()
                    .unwrap_or_default();
                let args = Map::from([
                    ("state".to_owned(), state),
                    ("context".to_owned(), Value::Map(context.clone())),
                ]);
                closure.call(&Value::Map(args))
            }
            Some(value) => value.clone(),
            None => Value::Null,
        };

        if reference.negated {
            Value::Bool(!value.is_truthy())
        } else {
            value
        }
    }

    /// The mapping non-`context` roots are looked up in.
    fn lookup_root(&self, namespace: Option<&str>) -> Option<&Map> {
        match &self.resolution {
            StateResolution::Global => Some(&*self.store),
            StateResolution::Namespaced { default_namespace } => {
                let namespace = namespace.or(default_namespace.as_deref())?;
                self.store.namespace(namespace)
            }
        }
    }
}

/// Follow `path` through nested mappings.
fn walk<'v>(map: &'v Map, path: &[&str]) -> Option<&'v Value> {
    let (last, intermediate) = path.split_last()?;
    let mut current = map;
    for key in intermediate {
        current = current.get(*key)?.as_map()?;
    }
    current.get(*last)
}

/// Evaluate a reference against the current contents of `store`.
///
/// Uses global state resolution.
///
/// # Example
///
/// ```
/// use wpi_directives::evaluate_reference;
/// use wpi_store::{Map, Store, Value};
///
/// let store = Store::new();
/// store.merge_json(r#"{"state": {"core": {"number": 1}}}"#).unwrap();
///
/// assert_eq!(evaluate_reference("state.core.number", &store, &Map::new()), Value::from(1_i64));
/// assert_eq!(evaluate_reference("this.property.doesnt.exist", &store, &Map::new()), Value::Null);
/// ```
#[must_use]
pub fn evaluate_reference(expression: &str, store: &Store, context: &Map) -> Value {
    Evaluator::new(store.snapshot()).evaluate(expression, context)
}
