//! Interactivity directive processing.
//!
//! This crate rewrites the rendered HTML of a root block according to the
//! `data-wp-*` directives found on its tags:
//!
//! - [`html`]: lossless tag scanner used to find and rewrite tags
//! - [`Evaluator`]: resolves reference expressions such as `context.myText`
//! - [`ContextStack`]: effective contexts of the enclosing elements
//! - [`DirectiveProcessor`]: the single streaming pass over a root block
//!
//! # Example
//!
//! ```
//! use wpi_directives::{BlockInfo, DirectiveProcessor};
//! use wpi_store::Store;
//!
//! struct Root;
//!
//! impl BlockInfo for Root {
//!     fn name(&self) -> &str { "test/root" }
//!     fn supports_interactivity(&self) -> bool { true }
//! }
//!
//! let store = Store::new();
//! store.merge_json(r#"{"state": {"display": "none"}}"#).unwrap();
//!
//! let mut processor = DirectiveProcessor::new(store.snapshot());
//! let html = processor.process(r#"<p data-wp-style--display="state.display"></p>"#, &Root);
//! assert_eq!(html, r#"<p data-wp-style--display="state.display" style="display: none;"></p>"#);
//! ```

mod boundary;
mod context;
mod directive;
pub mod html;
mod processor;
mod reference;

pub use boundary::{Boundary, BoundaryKey, Eligibility};
pub use context::ContextStack;
pub use directive::{Directive, DirectiveKind, collect_directives};
pub use processor::{BlockInfo, DirectiveProcessor, ProcessorConfig};
pub use reference::{Evaluator, Reference, StateResolution, evaluate_reference};
