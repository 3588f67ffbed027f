//! Start tags with editable attributes.
//!
//! A [`Tag`] remembers the source text of every attribute so that writing it
//! back only regenerates what was actually changed.

use super::{escape_html, is_void_element};

/// One attribute of a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    /// Decoded value; `None` for a boolean attribute.
    value: Option<String>,
    /// Whitespace preceding the attribute in the source.
    leading: String,
    /// Original source text, dropped once the attribute is rewritten.
    source: Option<String>,
}

impl Attribute {
    pub(crate) fn parsed(name: &str, value: Option<String>, leading: &str, source: &str) -> Self {
        Self {
            name: name.to_owned(),
            value,
            leading: leading.to_owned(),
            source: Some(source.to_owned()),
        }
    }

    fn generated(name: &str, value: Option<String>) -> Self {
        Self {
            name: name.to_owned(),
            value,
            leading: " ".to_owned(),
            source: None,
        }
    }

    /// Attribute name as written in the source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value, or `None` for a boolean attribute.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.value.is_none()
    }

    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.leading);
        if let Some(source) = &self.source {
            out.push_str(source);
            return;
        }
        out.push_str(&self.name);
        if let Some(value) = &self.value {
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
    }
}

/// A start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Lower-cased tag name.
    name: String,
    /// Tag name as written.
    raw_name: String,
    attributes: Vec<Attribute>,
    /// Whitespace and `/` between the last attribute and `>`.
    tail: String,
    self_closing: bool,
    modified: bool,
}

impl Tag {
    pub(crate) fn parsed(
        raw_name: &str,
        attributes: Vec<Attribute>,
        tail: &str,
        self_closing: bool,
    ) -> Self {
        Self {
            name: raw_name.to_ascii_lowercase(),
            raw_name: raw_name.to_owned(),
            attributes,
            tail: tail.to_owned(),
            self_closing,
            modified: false,
        }
    }

    /// Lower-cased tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the tag was written with a trailing `/>`.
    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// Whether no closing tag will follow (void element or `/>`).
    #[must_use]
    pub fn closes_immediately(&self) -> bool {
        self.self_closing || is_void_element(&self.name)
    }

    /// Whether any attribute was changed since parsing.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute with the given name (ASCII case-insensitive).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.matches(name))
    }

    /// Attribute value; boolean attributes read as the empty string.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_directives::html::{Scanner, Token};
    ///
    /// let Some(Token::StartTag { tag, .. }) = Scanner::new("<input disabled value='a&amp;b'>").next()
    /// else {
    ///     unreachable!()
    /// };
    /// assert_eq!(tag.get_attribute("value"), Some("a&b"));
    /// assert_eq!(tag.get_attribute("disabled"), Some(""));
    /// assert_eq!(tag.get_attribute("missing"), None);
    /// ```
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|attr| attr.value().unwrap_or(""))
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute to a string value, adding it if absent.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.replace_attribute(name, Some(value.into()));
    }

    /// Set a boolean (value-less) attribute, adding it if absent.
    pub fn set_boolean_attribute(&mut self, name: &str) {
        self.replace_attribute(name, None);
    }

    /// Remove every attribute with the given name.
    ///
    /// Returns `true` if something was removed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attr| !attr.matches(name));
        let removed = self.attributes.len() != before;
        self.modified |= removed;
        removed
    }

    fn replace_attribute(&mut self, name: &str, value: Option<String>) {
        if let Some(attr) = self.attributes.iter_mut().find(|attr| attr.matches(name)) {
            if attr.value == value {
                return;
            }
            attr.value = value;
            attr.source = None;
        } else {
            self.attributes.push(Attribute::generated(name, value));
        }
        self.modified = true;
    }

    /// Class names from the `class` attribute.
    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.get_attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    /// Append a class name unless already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.class_list().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute("class", joined);
    }

    /// Remove a class name; drops the `class` attribute once it is empty.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<&str> = self.class_list().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attribute("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attribute("class", joined);
        }
    }

    /// Serialize the tag, preserving untouched attributes verbatim.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.raw_name);
        for attr in &self.attributes {
            attr.write_to(out);
        }
        out.push_str(&self.tail);
        out.push('>');
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}
