//! Root block tracking.
//!
//! Exactly one top-level block per render cycle gets a directive pass over
//! its assembled HTML. The tracker holds that block from the moment it
//! starts rendering until the pass completes.
//!
//! # Thread Safety
//!
//! The tracker is deliberately `!Sync`: every thread rendering blocks owns
//! its own tracker (usually through its own renderer).

use std::cell::Cell;

use crate::tree::{BlockId, BlockTree};

/// Single-occupant slot for the current root block.
#[derive(Debug, Default)]
pub struct RootTracker {
    current: Cell<Option<BlockId>>,
}

impl RootTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as the root if it is top-level and no root is held.
    ///
    /// Returns `false` and leaves the tracker untouched otherwise.
    pub fn try_acquire(&self, tree: &BlockTree, id: BlockId) -> bool {
        let top_level = tree.get(id).is_some_and(|block| block.is_top_level());
        if !top_level || self.current.get().is_some() {
            return false;
        }
        self.current.set(Some(id));
        true
    }

    /// Like [`try_acquire`](Self::try_acquire), returning a guard that
    /// releases the root when dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use wpi_blocks::{BlockTree, RootTracker};
    ///
    /// let mut tree = BlockTree::new();
    /// let first = tree.add("core/paragraph", false, None);
    /// let second = tree.add("core/paragraph", false, None);
    /// let tracker = RootTracker::new();
    ///
    /// {
    ///     let guard = tracker.acquire(&tree, first).unwrap();
    ///     assert_eq!(guard.id(), first);
    ///     assert!(tracker.acquire(&tree, second).is_none());
    /// }
    /// assert!(!tracker.is_held());
    /// ```
    #[must_use]
    pub fn acquire(&self, tree: &BlockTree, id: BlockId) -> Option<RootGuard<'_>> {
        self.try_acquire(tree, id)
            .then_some(RootGuard { tracker: self, id })
    }

    /// Clear the slot unconditionally.
    pub fn release(&self) {
        self.current.set(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<BlockId> {
        self.current.get()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.current.get().is_some()
    }
}

/// Releases the root block on drop, including during unwinding.
#[derive(Debug)]
pub struct RootGuard<'t> {
    tracker: &'t RootTracker,
    id: BlockId,
}

impl RootGuard<'_> {
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
