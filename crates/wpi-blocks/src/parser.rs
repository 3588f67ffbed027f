//! Serialized block markup parser.
//!
//! Blocks are delimited by HTML comments:
//!
//! ```text
//! <!-- wp:group {"tagName":"section"} --><div>...</div><!-- /wp:group -->
//! <!-- wp:test/context-level-1 /-->
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};
use wpi_store::{Map, Value};

use crate::registry::BlockAttributes;

/// Opener, closer or void block delimiter.
static BLOCK_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--\s+(/)?wp:([a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?)\s+(?:(\{.*?\})\s+)?(/)?-->",
    )
    .unwrap()
});

/// Piece of a block's inner content.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPiece {
    /// Markup owned by the block itself.
    Html(String),
    /// Position of the inner block with this index.
    Block(usize),
}

/// A block parsed from serialized markup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedBlock {
    /// Fully qualified block name; `None` for freeform HTML.
    pub name: Option<String>,
    pub attributes: BlockAttributes,
    pub inner_blocks: Vec<ParsedBlock>,
    /// Inner markup interleaved with inner block positions.
    pub inner_content: Vec<ContentPiece>,
}

impl ParsedBlock {
    fn named(name: String, attributes: BlockAttributes) -> Self {
        Self {
            name: Some(name),
            attributes,
            ..Self::default()
        }
    }

    fn freeform(html: &str) -> Self {
        Self {
            inner_content: vec![ContentPiece::Html(html.to_owned())],
            ..Self::default()
        }
    }

    fn push_html(&mut self, html: &str) {
        if html.is_empty() {
            return;
        }
        if let Some(ContentPiece::Html(last)) = self.inner_content.last_mut() {
            last.push_str(html);
        } else {
            self.inner_content.push(ContentPiece::Html(html.to_owned()));
        }
    }

    fn push_block(&mut self, block: ParsedBlock) {
        self.inner_content
            .push(ContentPiece::Block(self.inner_blocks.len()));
        self.inner_blocks.push(block);
    }

    /// The block's own markup, without inner blocks.
    #[must_use]
    pub fn inner_html(&self) -> String {
        self.inner_content
            .iter()
            .filter_map(|piece| match piece {
                ContentPiece::Html(html) => Some(html.as_str()),
                ContentPiece::Block(_) => None,
            })
            .collect()
    }
}

/// Collects finished top-level blocks and the stack of open ones.
#[derive(Default)]
struct BlockParser {
    output: Vec<ParsedBlock>,
    stack: Vec<ParsedBlock>,
}

impl BlockParser {
    fn add_html(&mut self, html: &str) {
        if html.is_empty() {
            return;
        }
        match self.stack.last_mut() {
            Some(open) => open.push_html(html),
            None => self.output.push(ParsedBlock::freeform(html)),
        }
    }

    fn add_block(&mut self, block: ParsedBlock) {
        match self.stack.last_mut() {
            Some(open) => open.push_block(block),
            None => self.output.push(block),
        }
    }

    /// Close the innermost open block named `name` and everything inside
    /// it. Returns `false` if no such block is open.
    fn close(&mut self, name: &str) -> bool {
        let Some(index) = self
            .stack
            .iter()
            .rposition(|open| open.name.as_deref() == Some(name))
        else {
            return false;
        };
        while self.stack.len() > index {
            if let Some(block) = self.stack.pop() {
                self.add_block(block);
            }
        }
        true
    }

    fn finish(mut self) -> Vec<ParsedBlock> {
        while let Some(block) = self.stack.pop() {
            tracing::debug!(name = ?block.name, "Closing unterminated block at end of input");
            self.add_block(block);
        }
        self.output
    }
}

/// Parse serialized block markup into top-level blocks.
///
/// Names without a namespace get the `core/` prefix. Markup outside any
/// block becomes freeform blocks (`name == None`). Attribute JSON that does
/// not parse as an object yields empty attributes.
///
/// # Example
///
/// ```
/// use wpi_blocks::parse_blocks;
///
/// let blocks = parse_blocks(
///     "<!-- wp:paragraph --><p>Hi</p><!-- /wp:paragraph --><!-- wp:test/a {\"n\":1} /-->",
/// );
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].name.as_deref(), Some("core/paragraph"));
/// assert_eq!(blocks[0].inner_html(), "<p>Hi</p>");
/// assert_eq!(blocks[1].name.as_deref(), Some("test/a"));
/// ```
#[must_use]
pub fn parse_blocks(document: &str) -> Vec<ParsedBlock> {
    let mut parser = BlockParser::default();
    let mut offset = 0;

    for captures in BLOCK_DELIMITER.captures_iter(document) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        parser.add_html(&document[offset..whole.start()]);
        offset = whole.end();

        let name = qualified_name(&captures[2]);
        let is_closer = captures.get(1).is_some();
        let is_void = captures.get(4).is_some();

        if is_closer {
            if !parser.close(&name) {
                tracing::debug!(%name, "Ignoring closer without matching opener");
                parser.add_html(whole.as_str());
            }
        } else {
            let block = ParsedBlock::named(name, attributes(&captures));
            if is_void {
                parser.add_block(block);
            } else {
                parser.stack.push(block);
            }
        }
    }

    parser.add_html(&document[offset..]);
    parser.finish()
}

fn qualified_name(name: &str) -> String {
    if name.contains('/') {
        name.to_owned()
    } else {
        format!("core/{name}")
    }
}

fn attributes(captures: &Captures<'_>) -> BlockAttributes {
    let Some(json) = captures.get(3) else {
        return Map::new();
    };
    match Value::from_json_str(json.as_str()) {
        Ok(Value::Map(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!(json = json.as_str(), "Ignoring invalid block attributes");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_void_block() {
        let blocks = parse_blocks("<!-- wp:test/context-level-1 /-->");
        assert_eq!(
            blocks,
            vec![ParsedBlock::named("test/context-level-1".to_owned(), Map::new())]
        );
    }

    #[test]
    fn test_nested_blocks_keep_positions() {
        let blocks = parse_blocks(
            r#"<!-- wp:group --><div class="wp-block-group"><!-- wp:test/a /--><!-- wp:test/b /--></div><!-- /wp:group -->"#,
        );
        assert_eq!(blocks.len(), 1);
        let group = &blocks[0];
        assert_eq!(group.name.as_deref(), Some("core/group"));
        assert_eq!(
            group.inner_content,
            vec![
                ContentPiece::Html(r#"<div class="wp-block-group">"#.to_owned()),
                ContentPiece::Block(0),
                ContentPiece::Block(1),
                ContentPiece::Html("</div>".to_owned()),
            ]
        );
        assert_eq!(group.inner_blocks[1].name.as_deref(), Some("test/b"));
    }

    #[test]
    fn test_attributes() {
        let blocks = parse_blocks(r#"<!-- wp:test/a {"label":"x","nested":{"n":1}} /-->"#);
        assert_eq!(
            blocks[0].attributes.get("label"),
            Some(&Value::from("x"))
        );
        assert_eq!(
            blocks[0].attributes.get("nested").and_then(|n| n.get("n")),
            Some(&Value::from(1_i64))
        );
    }

    #[test]
    fn test_invalid_attributes_are_empty() {
        let blocks = parse_blocks(r#"<!-- wp:test/a {"broken": } /-->"#);
        assert_eq!(blocks[0].name.as_deref(), Some("test/a"));
        assert!(blocks[0].attributes.is_empty());
    }

    #[test]
    fn test_freeform_segments() {
        let blocks = parse_blocks("<p>before</p><!-- wp:test/a /--><p>after</p>");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].name, None);
        assert_eq!(blocks[0].inner_html(), "<p>before</p>");
        assert_eq!(blocks[2].inner_html(), "<p>after</p>");
    }

    #[test]
    fn test_unclosed_block_closes_at_end() {
        let blocks = parse_blocks("<!-- wp:group --><div><!-- wp:test/a /-->");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].inner_blocks.len(), 1);
        assert_eq!(blocks[0].inner_html(), "<div>");
    }

    #[test]
    fn test_stray_closer_is_html() {
        let blocks = parse_blocks("<!-- /wp:group -->");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, None);
        assert_eq!(blocks[0].inner_html(), "<!-- /wp:group -->");
    }

    #[test]
    fn test_other_comments_are_html() {
        let blocks = parse_blocks("<!-- wp:paragraph --><p>a<!-- note --></p><!-- /wp:paragraph -->");
        assert_eq!(blocks[0].inner_html(), "<p>a<!-- note --></p>");
    }
}
