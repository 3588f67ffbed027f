//! Block boundary markers.
//!
//! The render pipeline wraps the output of every nested block in a pair of
//! comments recording whether directives inside it may be evaluated:
//!
//! ```text
//! <!--wpi:block:<key> interactive-->...<!--/wpi:block:<key>-->
//! ```
//!
//! `<key>` is a [`BoundaryKey`] generated for one render cycle. The directive
//! processor only honours (and strips) markers carrying the key it was
//! configured with; any other comment, including a marker copied into block
//! content, is ordinary markup.

use uuid::Uuid;

/// Whether tags in a block segment are processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eligibility {
    /// Produced by a block type that supports interactivity.
    Interactive,
    /// Produced by a block type without interactivity support.
    Static,
    /// Rendered outside the standard pipeline; nothing inside is processed,
    /// whatever nested markers say.
    Inert,
}

impl Eligibility {
    #[must_use]
    pub fn from_support(supports_interactivity: bool) -> Self {
        if supports_interactivity {
            Self::Interactive
        } else {
            Self::Static
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Static => "static",
            Self::Inert => "inert",
        }
    }

    /// Eligibility of a nested segment opened inside `self`.
    #[must_use]
    pub fn nest(self, inner: Self) -> Self {
        if self == Self::Inert { self } else { inner }
    }

    #[must_use]
    pub fn is_interactive(self) -> bool {
        self == Self::Interactive
    }
}

/// A parsed boundary comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Open(Eligibility),
    Close,
}

/// Unguessable token tying boundary markers to the render cycle that wrote
/// them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryKey(String);

impl BoundaryKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Recognize a boundary from a comment body (the text between `<!--`
    /// and `-->`). Markers written with another key are not boundaries.
    #[must_use]
    pub fn parse(&self, body: &str) -> Option<Boundary> {
        if let Some(key) = body.strip_prefix("/wpi:block:") {
            return (key == self.0).then_some(Boundary::Close);
        }
        let (key, eligibility) = body.strip_prefix("wpi:block:")?.split_once(' ')?;
        if key != self.0 {
            return None;
        }
        let eligibility = match eligibility {
            "interactive" => Eligibility::Interactive,
            "static" => Eligibility::Static,
            "inert" => Eligibility::Inert,
            _ => return None,
        };
        Some(Boundary::Open(eligibility))
    }

    #[must_use]
    pub fn markup(&self, boundary: Boundary) -> String {
        match boundary {
            Boundary::Open(eligibility) => {
                format!("<!--wpi:block:{} {}-->", self.0, eligibility.as_str())
            }
            Boundary::Close => format!("<!--/wpi:block:{}-->", self.0),
        }
    }

    /// Wrap `html` in boundary markers.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_directives::{BoundaryKey, Eligibility};
    ///
    /// let key = BoundaryKey::generate();
    /// let fenced = key.fence("<p>hi</p>", Eligibility::Static);
    /// assert!(fenced.starts_with("<!--wpi:block:"));
    /// assert!(fenced.contains("<p>hi</p>"));
    /// ```
    #[must_use]
    pub fn fence(&self, html: &str, eligibility: Eligibility) -> String {
        let open = self.markup(Boundary::Open(eligibility));
        let close = self.markup(Boundary::Close);
        let mut out = String::with_capacity(open.len() + html.len() + close.len());
        out.push_str(&open);
        out.push_str(html);
        out.push_str(&close);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(markup: &str) -> &str {
        &markup[4..markup.len() - 3]
    }

    #[test]
    fn test_markup_parses_back() {
        let key = BoundaryKey::generate();
        for boundary in [
            Boundary::Open(Eligibility::Interactive),
            Boundary::Open(Eligibility::Static),
            Boundary::Open(Eligibility::Inert),
            Boundary::Close,
        ] {
            let markup = key.markup(boundary);
            assert_eq!(key.parse(body(&markup)), Some(boundary));
        }
    }

    #[test]
    fn test_markers_from_another_key_are_ignored() {
        let key = BoundaryKey::generate();
        let other = BoundaryKey::generate();
        assert_ne!(key, other);

        let open = other.markup(Boundary::Open(Eligibility::Interactive));
        let close = other.markup(Boundary::Close);
        assert_eq!(key.parse(body(&open)), None);
        assert_eq!(key.parse(body(&close)), None);
    }

    #[test]
    fn test_other_comments_are_not_boundaries() {
        let key = BoundaryKey::generate();
        assert_eq!(key.parse(" wp:paragraph "), None);
        assert_eq!(key.parse("wpi:block interactive"), None);
        assert_eq!(key.parse("/wpi:block"), None);
        assert_eq!(key.parse("wpi:block:"), None);
    }

    #[test]
    fn test_inert_is_sticky() {
        assert_eq!(
            Eligibility::Inert.nest(Eligibility::Interactive),
            Eligibility::Inert
        );
        assert_eq!(
            Eligibility::Static.nest(Eligibility::Interactive),
            Eligibility::Interactive
        );
        assert_eq!(
            Eligibility::Interactive.nest(Eligibility::Static),
            Eligibility::Static
        );
    }
}
