//! Streaming directive processor.
//!
//! One pass walks the tag stream of a root block's rendered HTML, evaluates
//! the directives on every eligible start tag and writes the tag back with
//! the resulting attribute changes. Everything else is copied verbatim,
//! except block boundary markers, which are consumed.

use wpi_store::{Callable, Map, StoreSnapshot, Value};

use crate::boundary::{Boundary, BoundaryKey, Eligibility};
use crate::context::ContextStack;
use crate::directive::{Directive, DirectiveKind, collect_directives};
use crate::html::{Scanner, Tag, Token};
use crate::reference::{Evaluator, StateResolution};

/// The block whose rendered output a pass runs over.
pub trait BlockInfo {
    /// Block type name, e.g. `core/group`.
    fn name(&self) -> &str;

    /// Whether the block type declared interactivity support.
    fn supports_interactivity(&self) -> bool;
}

/// Configuration for the directive processor.
#[derive(Clone, Debug, Default)]
pub struct ProcessorConfig {
    /// How `state.*` references are resolved.
    ///
    /// Default: [`StateResolution::Global`]
    pub state_resolution: StateResolution,
    /// Key of the boundary markers to honour. Without one, every comment is
    /// copied through unchanged.
    pub boundary_key: Option<BoundaryKey>,
}

impl ProcessorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state resolution mode.
    #[must_use]
    pub fn with_state_resolution(mut self, resolution: StateResolution) -> Self {
        self.state_resolution = resolution;
        self
    }

    /// Honour boundary markers written with `key`.
    #[must_use]
    pub fn with_boundary_key(mut self, key: BoundaryKey) -> Self {
        self.boundary_key = Some(key);
        self
    }
}

/// Rewrites directive-bearing tags in rendered block HTML.
///
/// # Example
///
/// ```
/// use wpi_directives::{BlockInfo, DirectiveProcessor};
/// use wpi_store::StoreSnapshot;
///
/// struct Root;
///
/// impl BlockInfo for Root {
///     fn name(&self) -> &str { "test/root" }
///     fn supports_interactivity(&self) -> bool { true }
/// }
///
/// let mut processor = DirectiveProcessor::new(StoreSnapshot::default());
/// let html = processor.process(
///     r#"<div data-wp-context='{"open": true}'><p data-wp-class--open="context.open"></p></div>"#,
///     &Root,
/// );
/// assert!(html.contains(r#"<p data-wp-class--open="context.open" class="open">"#));
/// ```
#[derive(Debug)]
pub struct DirectiveProcessor {
    evaluator: Evaluator,
    boundary_key: Option<BoundaryKey>,
    warnings: Vec<String>,
}

impl DirectiveProcessor {
    /// Create a processor over a store snapshot with default configuration.
    #[must_use]
    pub fn new(store: StoreSnapshot) -> Self {
        Self::with_config(store, ProcessorConfig::default())
    }

    /// Create a processor with custom configuration.
    #[must_use]
    pub fn with_config(store: StoreSnapshot, config: ProcessorConfig) -> Self {
        Self {
            evaluator: Evaluator::new(store).with_resolution(config.state_resolution),
            boundary_key: config.boundary_key,
            warnings: Vec::new(),
        }
    }

    /// Run one pass over `html`, the full rendered output of `root`.
    ///
    /// Tags outside interactive block segments are copied unchanged, their
    /// directives never evaluated. Never fails: malformed payloads and
    /// unbalanced tags are recorded in [`warnings`](Self::warnings).
    #[must_use]
    pub fn process(&mut self, html: &str, root: &dyn BlockInfo) -> String {
        let mut pass = Pass::new(
            &self.evaluator,
            Eligibility::from_support(root.supports_interactivity()),
        );
        let mut output = String::with_capacity(html.len());

        for token in Scanner::new(html) {
            match token {
                Token::StartTag { raw, mut tag } => {
                    pass.start_tag(&mut tag);
                    if tag.is_modified() {
                        tag.write_to(&mut output);
                    } else {
                        output.push_str(raw);
                    }
                }
                Token::EndTag { raw, name } => {
                    pass.end_tag(&name);
                    output.push_str(raw);
                }
                Token::Comment { raw, body } => match self
                    .boundary_key
                    .as_ref()
                    .and_then(|key| key.parse(body))
                {
                    Some(boundary) => pass.boundary(boundary),
                    None => output.push_str(raw),
                },
                Token::Text(raw) | Token::Declaration(raw) => output.push_str(raw),
            }
        }

        tracing::debug!(
            block = root.name(),
            rewritten = pass.rewritten,
            warnings = pass.warnings.len(),
            "Processed directives"
        );
        self.warnings.append(&mut pass.warnings);
        output
    }

    /// Warnings from all passes run by this processor.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// An element whose closing tag has not been seen yet.
#[derive(Debug)]
struct OpenElement {
    name: String,
    pushed_contexts: usize,
    pushed_namespace: bool,
}

/// State of one pass.
struct Pass<'e> {
    evaluator: &'e Evaluator,
    contexts: ContextStack,
    namespaces: Vec<String>,
    elements: Vec<OpenElement>,
    /// Eligibility of the enclosing block segments; never empty.
    segments: Vec<Eligibility>,
    rewritten: usize,
    warnings: Vec<String>,
}

impl<'e> Pass<'e> {
    fn new(evaluator: &'e Evaluator, root: Eligibility) -> Self {
        Self {
            evaluator,
            contexts: ContextStack::new(),
            namespaces: Vec::new(),
            elements: Vec::new(),
            segments: vec![root],
            rewritten: 0,
            warnings: Vec::new(),
        }
    }

    fn eligibility(&self) -> Eligibility {
        self.segments
            .last()
            .copied()
            .unwrap_or(Eligibility::Static)
    }

    fn boundary(&mut self, boundary: Boundary) {
        match boundary {
            Boundary::Open(inner) => {
                let nested = self.eligibility().nest(inner);
                self.segments.push(nested);
            }
            Boundary::Close if self.segments.len() > 1 => {
                self.segments.pop();
            }
            Boundary::Close => self.warn("Unbalanced block boundary marker".to_owned()),
        }
    }

    fn start_tag(&mut self, tag: &mut Tag) {
        let mut element = OpenElement {
            name: tag.name().to_owned(),
            pushed_contexts: 0,
            pushed_namespace: false,
        };

        if self.eligibility().is_interactive() {
            let directives = collect_directives(tag);
            let has_context = directives
                .iter()
                .any(|d| d.kind == DirectiveKind::Context);
            for directive in &directives {
                self.apply(directive, tag, &mut element, has_context);
            }
            if tag.is_modified() {
                self.rewritten += 1;
            }
        }

        if tag.closes_immediately() {
            self.unwind(element);
        } else {
            self.elements.push(element);
        }
    }

    /// Close the innermost open element named `name` and everything opened
    /// after it.
    fn end_tag(&mut self, name: &str) {
        let Some(index) = self.elements.iter().rposition(|e| e.name == name) else {
            self.warn(format!("Ignoring stray closing tag </{name}>"));
            return;
        };
        while self.elements.len() > index {
            if let Some(element) = self.elements.pop() {
                self.unwind(element);
            }
        }
    }

    fn unwind(&mut self, element: OpenElement) {
        for _ in 0..element.pushed_contexts {
            self.contexts.pop();
        }
        if element.pushed_namespace {
            self.namespaces.pop();
        }
    }

    fn apply(
        &mut self,
        directive: &Directive,
        tag: &mut Tag,
        element: &mut OpenElement,
        has_context: bool,
    ) {
        match (directive.kind, directive.suffix.as_deref()) {
            (DirectiveKind::Interactive, _) => {
                let payload = self.payload(directive);
                if let Some(namespace) = payload.get("namespace").and_then(Value::as_str) {
                    self.namespaces.push(namespace.to_owned());
                    element.pushed_namespace = true;
                }
                if !has_context {
                    self.contexts.push(Map::new());
                    element.pushed_contexts += 1;
                }
            }
            (DirectiveKind::Context, _) => {
                let declared = self.payload(directive);
                self.contexts.push(declared);
                element.pushed_contexts += 1;
            }
            (DirectiveKind::Bind, Some(attribute)) => {
                bind_attribute(tag, attribute, self.evaluate(&directive.value));
            }
            (DirectiveKind::Class, Some(class)) => {
                if self.evaluate(&directive.value).is_truthy() {
                    tag.add_class(class);
                } else {
                    tag.remove_class(class);
                }
            }
            (DirectiveKind::Style, Some(property)) => {
                style_property(tag, property, &self.evaluate(&directive.value));
            }
            // Suffix rules are enforced when directives are parsed.
            (DirectiveKind::Bind | DirectiveKind::Class | DirectiveKind::Style, None) => {}
        }
    }

    fn evaluate(&self, expression: &str) -> Value {
        self.evaluator.evaluate_in(
            expression,
            self.contexts.current(),
            self.namespaces.last().map(String::as_str),
        )
    }

    /// Decode a JSON object payload; anything else counts as empty.
    fn payload(&mut self, directive: &Directive) -> Map {
        let attribute = match directive.kind {
            DirectiveKind::Interactive => "data-wp-interactive",
            _ => "data-wp-context",
        };
        match Value::from_json_str(&directive.value) {
            Ok(Value::Map(map)) => map,
            Ok(other) => {
                self.warn(format!(
                    "{attribute} expects a JSON object, got {}",
                    other.kind()
                ));
                Map::new()
            }
            Err(err) => {
                tracing::warn!(attribute, error = %err, "Malformed directive payload");
                self.warnings
                    .push(format!("Malformed JSON in {attribute}: {err}"));
                Map::new()
            }
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Apply a `bind` result to `attribute`.
///
/// Null and closures leave the tag alone, `true` sets a boolean attribute,
/// `false` removes it. A named function is written as its name; compound
/// values and method references are written as JSON.
fn bind_attribute(tag: &mut Tag, attribute: &str, value: Value) {
    match value {
        Value::Null | Value::Callable(Callable::Closure(_)) => {}
        Value::Bool(true) => tag.set_boolean_attribute(attribute),
        Value::Bool(false) => {
            tag.remove_attribute(attribute);
        }
        Value::String(s) | Value::Callable(Callable::Named(s)) => tag.set_attribute(attribute, s),
        Value::Number(n) => tag.set_attribute(attribute, n.to_string()),
        compound @ (Value::Array(_) | Value::Map(_) | Value::Callable(Callable::Method { .. })) => {
            tag.set_attribute(attribute, compound.to_json_string());
        }
    }
}

/// Apply a `style` result to `property`.
fn style_property(tag: &mut Tag, property: &str, value: &Value) {
    let text = match value {
        Value::Null | Value::Callable(_) => return,
        _ if !value.is_truthy() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(_) | Value::Array(_) | Value::Map(_) => return,
    };

    let current = tag.get_attribute("style").unwrap_or_default();
    let updated = set_style_property(current, property, text.as_deref());
    if updated == current {
        return;
    }
    if updated.is_empty() {
        tag.remove_attribute("style");
    } else {
        tag.set_attribute("style", updated);
    }
}

/// Replace (or with `None`, remove) one property in a style declaration
/// list. The property moves to the end when set.
fn set_style_property(style: &str, property: &str, value: Option<&str>) -> String {
    let mut declarations: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .filter(|declaration| {
            declaration
                .split_once(':')
                .is_none_or(|(name, _)| !name.trim().eq_ignore_ascii_case(property))
        })
        .map(|declaration| format!("{declaration};"))
        .collect();
    if let Some(value) = value {
        declarations.push(format!("{property}: {value};"));
    }
    declarations.join(" ")
}
