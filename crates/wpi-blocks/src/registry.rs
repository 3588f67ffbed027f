//! Block type registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use wpi_store::Map;

use crate::renderer::BlockHandle;

/// Parsed block attributes.
pub type BlockAttributes = Map;

/// Render callback: `(attributes, rendered inner content, block) -> html`.
pub type RenderFn = dyn Fn(&BlockAttributes, &str, &BlockHandle<'_>) -> String + Send + Sync;

/// A registered block type.
#[derive(Clone)]
pub struct BlockType {
    name: String,
    supports_interactivity: bool,
    render: Option<Arc<RenderFn>>,
}

impl BlockType {
    /// Create a block type without interactivity support or render callback.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_interactivity: false,
            render: None,
        }
    }

    /// Set the `supports.interactivity` flag.
    #[must_use]
    pub fn with_interactivity(mut self, supports: bool) -> Self {
        self.supports_interactivity = supports;
        self
    }

    /// Set the render callback.
    #[must_use]
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&BlockAttributes, &str, &BlockHandle<'_>) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn supports_interactivity(&self) -> bool {
        self.supports_interactivity
    }

    pub(crate) fn render_fn(&self) -> Option<&RenderFn> {
        self.render.as_deref()
    }
}

impl fmt::Debug for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockType")
            .field("name", &self.name)
            .field("supports_interactivity", &self.supports_interactivity)
            .field("render", &self.render.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Block types by name.
#[derive(Clone, Debug, Default)]
pub struct BlockRegistry {
    types: HashMap<String, BlockType>,
}

impl BlockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type, returning the type it replaced.
    pub fn register(&mut self, block_type: BlockType) -> Option<BlockType> {
        tracing::debug!(
            name = %block_type.name,
            interactivity = block_type.supports_interactivity,
            "Registered block type"
        );
        self.types.insert(block_type.name.clone(), block_type)
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, block_type: BlockType) -> Self {
        self.register(block_type);
        self
    }

    pub fn unregister(&mut self, name: &str) -> Option<BlockType> {
        self.types.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}
