//! Descriptors of rendered blocks.
//!
//! Blocks are stored in a flat `Vec` with parent/children relationships
//! tracked by [`BlockId`] indices.

use wpi_directives::BlockInfo;

/// Index of a block in a [`BlockTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the rendered content tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    name: String,
    supports_interactivity: bool,
    parent: Option<BlockId>,
    children: Vec<BlockId>,
}

impl BlockDescriptor {
    /// Parent block, `None` for a top-level block.
    #[must_use]
    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[BlockId] {
        &self.children
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

impl BlockInfo for BlockDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_interactivity(&self) -> bool {
        self.supports_interactivity
    }
}

/// Flat, index-linked tree of block descriptors.
#[derive(Clone, Debug, Default)]
pub struct BlockTree {
    blocks: Vec<BlockDescriptor>,
}

impl BlockTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, linking it under `parent` when given.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_blocks::BlockTree;
    /// use wpi_directives::BlockInfo;
    ///
    /// let mut tree = BlockTree::new();
    /// let group = tree.add("core/group", false, None);
    /// let child = tree.add("test/context-level-1", true, Some(group));
    ///
    /// assert_eq!(tree.get(group).unwrap().children(), [child]);
    /// assert_eq!(tree.get(child).unwrap().parent(), Some(group));
    /// assert!(tree.get(child).unwrap().supports_interactivity());
    /// ```
    pub fn add(
        &mut self,
        name: impl Into<String>,
        supports_interactivity: bool,
        parent: Option<BlockId>,
    ) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BlockDescriptor {
            name: name.into(),
            supports_interactivity,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.blocks.get_mut(p.0)) {
            parent.children.push(id);
        }
        id
    }

    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&BlockDescriptor> {
        self.blocks.get(id.0)
    }

    /// Top-level blocks in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_top_level())
            .map(|(index, _)| BlockId(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_and_children() {
        let mut tree = BlockTree::new();
        let first = tree.add("core/paragraph", false, None);
        let group = tree.add("core/group", false, None);
        let a = tree.add("test/a", true, Some(group));
        let b = tree.add("test/b", false, Some(group));

        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![first, group]);
        assert_eq!(tree.get(group).unwrap().children(), [a, b]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_unknown_parent_is_not_linked() {
        let mut other = BlockTree::new();
        other.add("x", false, None);
        other.add("y", false, None);
        let foreign = other.add("z", false, None);

        let mut tree = BlockTree::new();
        let id = tree.add("core/paragraph", false, Some(foreign));
        assert_eq!(tree.get(id).unwrap().parent(), Some(foreign));
        assert!(tree.get(foreign).is_none());
    }

    #[test]
    fn test_descriptor_block_info() {
        let mut tree = BlockTree::new();
        let id = tree.add("test/interactive", true, None);
        let block = tree.get(id).unwrap();
        assert_eq!(block.name(), "test/interactive");
        assert!(block.supports_interactivity());
        assert!(block.is_top_level());
    }
}
