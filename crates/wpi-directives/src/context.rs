//! Stack of effective contexts for one directive pass.

use wpi_store::{Map, merged};

static EMPTY: Map = Map::new();

/// Effective contexts of the enclosing interactive elements.
///
/// Each frame holds the full effective context (the declared mapping
/// deep-merged over its parent's), so lookups never walk the stack.
///
/// # Example
///
/// ```
/// use wpi_directives::ContextStack;
/// use wpi_store::{Map, Value};
///
/// let mut stack = ContextStack::new();
/// stack.push(Map::from([("myText".to_owned(), Value::from("level-1"))]));
/// stack.push(Map::from([("myText".to_owned(), Value::from("level-2"))]));
/// assert_eq!(stack.current().get("myText"), Some(&Value::from("level-2")));
///
/// stack.pop();
/// assert_eq!(stack.current().get("myText"), Some(&Value::from("level-1")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ContextStack {
    frames: Vec<Map>,
}

impl ContextStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `declared` merged over the current effective context.
    pub fn push(&mut self, declared: Map) {
        let effective = merged(self.current(), declared);
        self.frames.push(effective);
    }

    /// Drop the innermost frame, returning it.
    pub fn pop(&mut self) -> Option<Map> {
        self.frames.pop()
    }

    /// Innermost effective context; empty when the stack is empty.
    #[must_use]
    pub fn current(&self) -> &Map {
        self.frames.last().unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
