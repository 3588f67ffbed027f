//! Block render pipeline.
//!
//! Renders parsed blocks bottom-up, records every rendered block in a
//! [`BlockTree`], and runs exactly one directive pass per top-level render
//! over the root block's assembled HTML.
//!
//! # Eligibility
//!
//! The output of every nested block is fenced with boundary markers (see
//! [`wpi_directives::BoundaryKey`]) telling the directive pass whether its
//! block type supports interactivity. Each top-level render uses a fresh
//! key, so markers that appear in block content are never mistaken for the
//! renderer's own. Blocks rendered manually from inside a parent's render
//! callback through [`InnerBlock::render`] are fenced as inert, so
//! directives in their output are never evaluated.

use std::cell::{Ref, RefCell};

use wpi_directives::{BlockInfo, BoundaryKey, DirectiveProcessor, Eligibility, ProcessorConfig};
use wpi_store::Store;

use crate::parser::{ContentPiece, ParsedBlock, parse_blocks};
use crate::registry::{BlockAttributes, BlockRegistry};
use crate::root::RootTracker;
use crate::tree::{BlockId, BlockTree};

/// Renders block markup and runs directive passes over root blocks.
///
/// # Example
///
/// ```
/// use wpi_blocks::{BlockRegistry, BlockRenderer, BlockType};
/// use wpi_store::Store;
///
/// let registry = BlockRegistry::new().with(
///     BlockType::new("test/greeting")
///         .with_interactivity(true)
///         .with_render(|_, _, _| {
///             r#"<p data-wp-context='{"who": "world"}' data-wp-bind--title="context.who">Hi</p>"#.to_owned()
///         }),
/// );
/// let store = Store::new();
/// let renderer = BlockRenderer::new(registry).with_store(&store);
///
/// let html = renderer.render_blocks("<!-- wp:test/greeting /-->");
/// assert!(html.contains(r#"title="world""#));
/// ```
pub struct BlockRenderer<'s> {
    registry: BlockRegistry,
    store: &'s Store,
    config: ProcessorConfig,
    tracker: RootTracker,
    tree: RefCell<BlockTree>,
    warnings: RefCell<Vec<String>>,
}

impl BlockRenderer<'static> {
    /// Create a renderer reading the process-wide store.
    #[must_use]
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            registry,
            store: Store::global(),
            config: ProcessorConfig::default(),
            tracker: RootTracker::new(),
            tree: RefCell::new(BlockTree::new()),
            warnings: RefCell::new(Vec::new()),
        }
    }
}

impl<'s> BlockRenderer<'s> {
    /// Read `state` from `store` instead.
    #[must_use]
    pub fn with_store<'t>(self, store: &'t Store) -> BlockRenderer<'t> {
        BlockRenderer {
            registry: self.registry,
            store,
            config: self.config,
            tracker: self.tracker,
            tree: self.tree,
            warnings: self.warnings,
        }
    }

    /// Set the directive processor configuration.
    #[must_use]
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    #[must_use]
    pub fn root_tracker(&self) -> &RootTracker {
        &self.tracker
    }

    /// Descriptors of every block rendered since the last
    /// [`render_blocks`](Self::render_blocks) call began.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a render callback while the tree is
    /// being updated, which the renderer never does.
    #[must_use]
    pub fn tree(&self) -> Ref<'_, BlockTree> {
        self.tree.borrow()
    }

    /// Warnings from the directive passes run since the last
    /// [`render_blocks`](Self::render_blocks) call began.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    /// Parse and render a document of serialized blocks.
    ///
    /// Starts a fresh [`tree`](Self::tree) and [`warnings`](Self::warnings)
    /// list, so a long-lived renderer only keeps the latest document's.
    #[must_use]
    pub fn render_blocks(&self, document: &str) -> String {
        *self.tree.borrow_mut() = BlockTree::new();
        self.warnings.borrow_mut().clear();
        parse_blocks(document)
            .iter()
            .map(|block| self.render_block(block))
            .collect()
    }

    /// Render one top-level block.
    #[must_use]
    pub fn render_block(&self, block: &ParsedBlock) -> String {
        self.render_in_tree(block, None, &BoundaryKey::generate())
    }

    fn render_in_tree(
        &self,
        block: &ParsedBlock,
        parent: Option<BlockId>,
        key: &BoundaryKey,
    ) -> String {
        let Some(name) = block.name.as_deref() else {
            return block.inner_html();
        };
        let block_type = self.registry.get(name);
        let supports = block_type.is_some_and(|t| t.supports_interactivity());
        let id = self.tree.borrow_mut().add(name, supports, parent);

        let guard = if parent.is_none() {
            self.tracker.acquire(&self.tree.borrow(), id)
        } else {
            None
        };
        if guard.is_some() {
            tracing::debug!(block = name, id = id.index(), "Acquired root block");
        }

        let mut content = String::new();
        for piece in &block.inner_content {
            match piece {
                ContentPiece::Html(html) => content.push_str(html),
                ContentPiece::Block(index) => {
                    if let Some(inner) = block.inner_blocks.get(*index) {
                        content.push_str(&self.render_in_tree(inner, Some(id), key));
                    }
                }
            }
        }

        let handle = BlockHandle {
            renderer: self,
            block,
            id,
            key,
        };
        let html = match block_type.and_then(|t| t.render_fn()) {
            Some(render) => render(&block.attributes, &content, &handle),
            None => content,
        };

        if parent.is_some() {
            return key.fence(&html, Eligibility::from_support(supports));
        }
        match guard {
            Some(_guard) => self.process_root(&html, id, key),
            None => html,
        }
    }

    /// Run the single directive pass over a root block's output.
    fn process_root(&self, html: &str, id: BlockId, key: &BoundaryKey) -> String {
        let tree = self.tree.borrow();
        let Some(root) = tree.get(id) else {
            return html.to_owned();
        };
        let config = self.config.clone().with_boundary_key(key.clone());
        let mut processor = DirectiveProcessor::with_config(self.store.snapshot(), config);
        let processed = processor.process(html, root);
        self.warnings
            .borrow_mut()
            .extend(processor.warnings().iter().cloned());
        tracing::debug!(block = root.name(), id = id.index(), "Released root block");
        processed
    }
}

/// Rendering entry point available to render callbacks.
trait InnerRender {
    fn render_manually(&self, block: &ParsedBlock, parent: BlockId, key: &BoundaryKey) -> String;
    fn current_root(&self) -> Option<BlockId>;
}

impl InnerRender for BlockRenderer<'_> {
    fn render_manually(&self, block: &ParsedBlock, parent: BlockId, key: &BoundaryKey) -> String {
        key.fence(&self.render_in_tree(block, Some(parent), key), Eligibility::Inert)
    }

    fn current_root(&self) -> Option<BlockId> {
        self.tracker.current()
    }
}

/// The block being rendered, as seen by its render callback.
pub struct BlockHandle<'r> {
    renderer: &'r dyn InnerRender,
    block: &'r ParsedBlock,
    id: BlockId,
    key: &'r BoundaryKey,
}

impl<'r> BlockHandle<'r> {
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&'r str> {
        self.block.name.as_deref()
    }

    #[must_use]
    pub fn attributes(&self) -> &'r BlockAttributes {
        &self.block.attributes
    }

    /// Root block of the render cycle in flight.
    #[must_use]
    pub fn root(&self) -> Option<BlockId> {
        self.renderer.current_root()
    }

    /// Inner blocks, for callbacks that render them by hand.
    #[must_use]
    pub fn inner_blocks(&self) -> Vec<InnerBlock<'r>> {
        self.block
            .inner_blocks
            .iter()
            .map(|block| InnerBlock {
                renderer: self.renderer,
                block,
                parent: self.id,
                key: self.key,
            })
            .collect()
    }
}

/// An inner block rendered outside the standard pipeline.
pub struct InnerBlock<'r> {
    renderer: &'r dyn InnerRender,
    block: &'r ParsedBlock,
    parent: BlockId,
    key: &'r BoundaryKey,
}

impl<'r> InnerBlock<'r> {
    #[must_use]
    pub fn name(&self) -> Option<&'r str> {
        self.block.name.as_deref()
    }

    /// Render the block and its descendants.
    ///
    /// The output is inert to the directive pass.
    #[must_use]
    pub fn render(&self) -> String {
        self.renderer.render_manually(self.block, self.parent, self.key)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::registry::BlockType;

    fn renderer(registry: BlockRegistry, store: &Store) -> BlockRenderer<'_> {
        BlockRenderer::new(registry).with_store(store)
    }

    #[test]
    fn test_unregistered_blocks_render_content() {
        let store = Store::new();
        let renderer = renderer(BlockRegistry::new(), &store);
        let html = renderer.render_blocks(
            "<p>intro</p><!-- wp:paragraph --><p>Welcome</p><!-- /wp:paragraph -->",
        );
        assert_eq!(html, "<p>intro</p><p>Welcome</p>");
    }

    #[test]
    fn test_boundaries_do_not_leak_into_output() {
        let store = Store::new();
        let renderer = renderer(BlockRegistry::new(), &store);
        let html = renderer.render_blocks(
            r#"<!-- wp:group --><div><!-- wp:paragraph --><p>a</p><!-- /wp:paragraph --></div><!-- /wp:group -->"#,
        );
        assert_eq!(html, "<div><p>a</p></div>");
    }

    #[test]
    fn test_tree_records_rendered_blocks() {
        let store = Store::new();
        let renderer = renderer(BlockRegistry::new(), &store);
        let _ = renderer.render_blocks(
            "<!-- wp:group --><!-- wp:paragraph /--><!-- wp:paragraph /--><!-- /wp:group --><!-- wp:paragraph /-->",
        );

        let tree = renderer.tree();
        let roots: Vec<BlockId> = tree.roots().collect();
        assert_eq!(roots.len(), 2);
        assert_eq!(tree.get(roots[0]).unwrap().children().len(), 2);
        assert_eq!(tree.get(roots[0]).unwrap().name(), "core/group");
    }

    #[test]
    fn test_each_document_starts_a_fresh_tree_and_warnings() {
        let store = Store::new();
        let registry = BlockRegistry::new().with(
            BlockType::new("test/broken")
                .with_interactivity(true)
                .with_render(|_, _, _| "<div data-wp-context='{ oops'></div>".to_owned()),
        );
        let renderer = renderer(registry, &store);

        let _ = renderer.render_blocks("<!-- wp:test/broken /--><!-- wp:test/broken /-->");
        assert_eq!(renderer.tree().len(), 2);
        assert_eq!(renderer.warnings().len(), 2);

        let _ = renderer.render_blocks("<!-- wp:test/broken /-->");
        assert_eq!(renderer.tree().len(), 1);
        assert_eq!(renderer.warnings().len(), 1);

        let _ = renderer.render_blocks("<!-- wp:paragraph /-->");
        assert_eq!(renderer.tree().len(), 1);
        assert!(renderer.warnings().is_empty());
    }

    #[test]
    fn test_root_is_held_during_render_and_released_after() {
        let store = Store::new();
        let registry = BlockRegistry::new().with(BlockType::new("test/probe").with_render(
            |_, _, block| match block.root() {
                Some(root) if root == block.id() => "root".to_owned(),
                Some(_) => "nested".to_owned(),
                None => "none".to_owned(),
            },
        ));
        let renderer = renderer(registry, &store);

        assert_eq!(
            renderer.render_blocks("<!-- wp:test/probe /--><!-- wp:test/probe /-->"),
            "rootroot"
        );
        assert!(!renderer.root_tracker().is_held());
    }

    #[test]
    fn test_children_see_the_root_in_flight() {
        let store = Store::new();
        let registry = BlockRegistry::new()
            .with(BlockType::new("test/probe").with_render(|_, _, block| {
                format!("[{}]", block.root().map(BlockId::index).unwrap_or(usize::MAX))
            }))
            .with(BlockType::new("test/outer").with_render(|_, content, _| {
                format!("<div>{content}</div>")
            }));
        let renderer = renderer(registry, &store);

        let html = renderer.render_blocks("<!-- wp:test/outer --><!-- wp:test/probe /--><!-- /wp:test/outer -->");
        assert_eq!(html, "<div>[0]</div>");
    }

    #[test]
    fn test_manual_inner_render_is_inert() {
        let store = Store::new();
        let registry = BlockRegistry::new()
            .with(
                BlockType::new("test/manual")
                    .with_interactivity(true)
                    .with_render(|_, _, block| {
                        let inner: String =
                            block.inner_blocks().iter().map(InnerBlock::render).collect();
                        format!(r#"<div data-wp-context='{{"v": "x"}}'>{inner}</div>"#)
                    }),
            )
            .with(
                BlockType::new("test/input")
                    .with_interactivity(true)
                    .with_render(|_, _, _| {
                        r#"<input data-wp-bind--value="context.v">"#.to_owned()
                    }),
            );
        let renderer = renderer(registry, &store);

        let html = renderer.render_blocks("<!-- wp:test/manual --><!-- wp:test/input /--><!-- /wp:test/manual -->");
        assert_eq!(
            html,
            r#"<div data-wp-context='{"v": "x"}'><input data-wp-bind--value="context.v"></div>"#
        );
    }
}
