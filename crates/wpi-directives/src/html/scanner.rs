//! Streaming HTML tokenizer.

use super::{Attribute, Tag, decode_entities, is_raw_text_element};

/// One token of the input.
///
/// Every token carries the exact source slice it was read from, so
/// concatenating `raw()` over all tokens reproduces the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Character data (including raw-text element content).
    Text(&'a str),
    /// `<!-- body -->`
    Comment { raw: &'a str, body: &'a str },
    /// `<!DOCTYPE ...>`, `<![CDATA[...]]>` or `<?...>`.
    Declaration(&'a str),
    /// Start tag with parsed attributes.
    StartTag { raw: &'a str, tag: Tag },
    /// End tag; `name` is lower-cased.
    EndTag { raw: &'a str, name: String },
}

impl<'a> Token<'a> {
    /// Source text of the token.
    #[must_use]
    pub fn raw(&self) -> &'a str {
        match self {
            Self::Text(raw)
            | Self::Declaration(raw)
            | Self::Comment { raw, .. }
            | Self::StartTag { raw, .. }
            | Self::EndTag { raw, .. } => raw,
        }
    }
}

/// Iterator over the tokens of an HTML string.
///
/// # Example
///
/// ```
/// use wpi_directives::html::{Scanner, Token};
///
/// let tokens: Vec<_> = Scanner::new("<p class=a>Hi</p>").collect();
/// assert_eq!(tokens.len(), 3);
/// assert!(matches!(&tokens[0], Token::StartTag { tag, .. } if tag.name() == "p"));
/// assert_eq!(tokens[1], Token::Text("Hi"));
/// ```
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    /// Raw-text element whose content comes next.
    raw_text: Option<String>,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text: None,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = self.input.get(self.pos..).filter(|r| !r.is_empty())?;

        if let Some(element) = self.raw_text.take() {
            let end = find_end_tag(rest, &element).unwrap_or(rest.len());
            if end > 0 {
                self.pos += end;
                return Some(Token::Text(&rest[..end]));
            }
        }

        if rest.starts_with('<')
            && let Some((token, len)) = markup(rest)
        {
            self.pos += len;
            if let Token::StartTag { tag, .. } = &token
                && !tag.is_self_closing()
                && is_raw_text_element(tag.name())
            {
                self.raw_text = Some(tag.name().to_owned());
            }
            return Some(token);
        }

        // Text runs until the next `<` that is not the current position.
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        self.pos += end;
        Some(Token::Text(&rest[..end]))
    }
}

/// Offset of `</name` (case-insensitive) that closes a raw-text element.
fn find_end_tag(rest: &str, name: &str) -> Option<usize> {
    rest.match_indices("</").map(|(i, _)| i).find(|&i| {
        let after = i + 2;
        let matches_name = rest
            .get(after..after + name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
        let boundary = rest
            .as_bytes()
            .get(after + name.len())
            .is_none_or(|b| b.is_ascii_whitespace() || *b == b'/' || *b == b'>');
        matches_name && boundary
    })
}

/// Parse the markup construct starting at `rest[0] == '<'`.
///
/// Returns `None` when the construct is not markup or is unterminated.
fn markup(rest: &str) -> Option<(Token<'_>, usize)> {
    if let Some(after) = rest.strip_prefix("<!--") {
        let end = after.find("-->")?;
        let len = 4 + end + 3;
        return Some((
            Token::Comment {
                raw: &rest[..len],
                body: &after[..end],
            },
            len,
        ));
    }

    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>')?;
        return Some((Token::Declaration(&rest[..=end]), end + 1));
    }

    let bytes = rest.as_bytes();
    if let Some(after) = rest.strip_prefix("</") {
        if !bytes.get(2)?.is_ascii_alphabetic() {
            return None;
        }
        let end = after.find('>')?;
        let name = after[..end]
            .split(|c: char| c.is_ascii_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let len = 2 + end + 1;
        return Some((
            Token::EndTag {
                raw: &rest[..len],
                name,
            },
            len,
        ));
    }

    if bytes.get(1)?.is_ascii_alphabetic() {
        let (tag, len) = start_tag(rest)?;
        return Some((
            Token::StartTag {
                raw: &rest[..len],
                tag,
            },
            len,
        ));
    }

    None
}

/// Parse a start tag; returns the tag and its length in bytes.
fn start_tag(rest: &str) -> Option<(Tag, usize)> {
    let bytes = rest.as_bytes();
    let is_space = |b: u8| b.is_ascii_whitespace();

    let mut pos = 1;
    while pos < bytes.len() && !is_space(bytes[pos]) && bytes[pos] != b'/' && bytes[pos] != b'>' {
        pos += 1;
    }
    let raw_name = &rest[1..pos];
    let mut attributes = Vec::new();

    loop {
        let gap_start = pos;
        // A `/` that does not end the tag is treated like whitespace.
        while pos < bytes.len()
            && (is_space(bytes[pos]) || (bytes[pos] == b'/' && bytes.get(pos + 1) != Some(&b'>')))
        {
            pos += 1;
        }

        match bytes.get(pos)? {
            b'>' => {
                let tag = Tag::parsed(raw_name, attributes, &rest[gap_start..pos], false);
                return Some((tag, pos + 1));
            }
            b'/' => {
                // `/>`: the loop above guarantees the next byte is `>`.
                let tag = Tag::parsed(raw_name, attributes, &rest[gap_start..=pos], true);
                return Some((tag, pos + 2));
            }
            _ => {}
        }

        let attr_start = pos;
        // The first character of a name may be `=`.
        pos += 1;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !is_space(bytes[pos])
        {
            pos += 1;
        }
        let name = &rest[attr_start..pos];

        let mut lookahead = pos;
        while lookahead < bytes.len() && is_space(bytes[lookahead]) {
            lookahead += 1;
        }

        let value = if bytes.get(lookahead) == Some(&b'=') {
            pos = lookahead + 1;
            while pos < bytes.len() && is_space(bytes[pos]) {
                pos += 1;
            }
            let value_raw = match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let close = rest[pos + 1..].find(char::from(*quote))?;
                    let value = &rest[pos + 1..pos + 1 + close];
                    pos += close + 2;
                    value
                }
                _ => {
                    let start = pos;
                    while pos < bytes.len() && !is_space(bytes[pos]) && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    &rest[start..pos]
                }
            };
            Some(decode_entities(value_raw).into_owned())
        } else {
            None
        };

        attributes.push(Attribute::parsed(
            name,
            value,
            &rest[gap_start..attr_start],
            &rest[attr_start..pos],
        ));
    }
}
