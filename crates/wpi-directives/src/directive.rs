//! Directive attribute recognition.

use std::sync::LazyLock;

use regex::Regex;

use crate::html::Tag;

/// `data-wp-<kind>` with an optional `--<suffix>`.
static DIRECTIVE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^data-wp-([a-z]+)(?:--(.+))?$").unwrap());

/// Recognized directive kinds, in application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveKind {
    /// `data-wp-interactive='{"namespace": "..."}'`
    Interactive,
    /// `data-wp-context='{...}'`
    Context,
    /// `data-wp-bind--<attr>="<reference>"`
    Bind,
    /// `data-wp-class--<name>="<reference>"`
    Class,
    /// `data-wp-style--<prop>="<reference>"`
    Style,
}

impl DirectiveKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "interactive" => Some(Self::Interactive),
            "context" => Some(Self::Context),
            "bind" => Some(Self::Bind),
            "class" => Some(Self::Class),
            "style" => Some(Self::Style),
            _ => None,
        }
    }

    /// Whether the kind takes a `--suffix`.
    fn takes_suffix(self) -> bool {
        matches!(self, Self::Bind | Self::Class | Self::Style)
    }
}

/// A directive read from one attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Target attribute, class or style property.
    pub suffix: Option<String>,
    /// Attribute value (JSON payload or reference expression).
    pub value: String,
}

impl Directive {
    /// Recognize a directive attribute.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_directives::{Directive, DirectiveKind};
    ///
    /// let directive = Directive::parse("data-wp-bind--value", "context.myText").unwrap();
    /// assert_eq!(directive.kind, DirectiveKind::Bind);
    /// assert_eq!(directive.suffix.as_deref(), Some("value"));
    ///
    /// assert!(Directive::parse("data-wp-bind", "context.myText").is_none());
    /// assert!(Directive::parse("data-wp-on--click", "actions.go").is_none());
    /// ```
    #[must_use]
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        let captures = DIRECTIVE_NAME.captures(name)?;
        let kind = DirectiveKind::from_name(&captures[1])?;
        let suffix = captures.get(2).map(|m| m.as_str().to_owned());
        if kind.takes_suffix() != suffix.is_some() {
            return None;
        }
        Some(Self {
            kind,
            suffix,
            value: value.to_owned(),
        })
    }
}

/// All directives on a tag, ordered by kind then source position.
#[must_use]
pub fn collect_directives(tag: &Tag) -> Vec<Directive> {
    let mut directives: Vec<Directive> = tag
        .attributes()
        .iter()
        .filter_map(|attr| Directive::parse(attr.name(), attr.value().unwrap_or("")))
        .collect();
    directives.sort_by_key(|directive| directive.kind);
    directives
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::html::{Scanner, Token};

    fn tag(html: &str) -> Tag {
        match Scanner::new(html).next() {
            Some(Token::StartTag { tag, .. }) => tag,
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn test_suffix_rules() {
        assert!(Directive::parse("data-wp-interactive", "{}").is_some());
        assert!(Directive::parse("data-wp-interactive--x", "{}").is_none());
        assert!(Directive::parse("data-wp-context", "{}").is_some());
        assert!(Directive::parse("data-wp-class", "context.a").is_none());
        assert!(Directive::parse("data-wp-style--display", "context.a").is_some());
    }

    #[test]
    fn test_case_insensitive_names() {
        let directive = Directive::parse("DATA-WP-Class--Is-Open", "context.a").unwrap();
        assert_eq!(directive.kind, DirectiveKind::Class);
        assert_eq!(directive.suffix.as_deref(), Some("Is-Open"));
    }

    #[test]
    fn test_unrelated_attributes_ignored() {
        assert!(Directive::parse("data-wp", "x").is_none());
        assert!(Directive::parse("data-foo--bar", "x").is_none());
        assert!(Directive::parse("class", "x").is_none());
    }

    #[test]
    fn test_collect_orders_by_kind() {
        let tag = tag(
            r#"<input data-wp-style--display="context.display" data-wp-class--a="context.a" data-wp-bind--value="context.value" data-wp-context='{}' data-wp-interactive='{}' data-wp-bind--title="context.t">"#,
        );
        let directives = collect_directives(&tag);
        let order: Vec<(DirectiveKind, Option<&str>)> = directives
            .iter()
            .map(|d| (d.kind, d.suffix.as_deref()))
            .collect();
        assert_eq!(
            order,
            vec![
                (DirectiveKind::Interactive, None),
                (DirectiveKind::Context, None),
                (DirectiveKind::Bind, Some("value")),
                (DirectiveKind::Bind, Some("title")),
                (DirectiveKind::Class, Some("a")),
                (DirectiveKind::Style, Some("display")),
            ]
        );
    }
}
