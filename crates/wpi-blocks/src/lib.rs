//! Block tree and render pipeline for interactivity directive passes.
//!
//! This crate drives [`wpi_directives`] the way a block-based CMS does:
//! - [`parse_blocks`]: serialized block markup to [`ParsedBlock`]s
//! - [`BlockRegistry`]: block types with their interactivity support and
//!   render callbacks
//! - [`RootTracker`]: picks the single root block of each render cycle
//! - [`BlockRenderer`]: renders blocks bottom-up and runs one directive pass
//!   over each root block's HTML

mod parser;
mod registry;
mod renderer;
mod root;
mod tree;

pub use parser::{ContentPiece, ParsedBlock, parse_blocks};
pub use registry::{BlockAttributes, BlockRegistry, BlockType, RenderFn};
pub use renderer::{BlockHandle, BlockRenderer, InnerBlock};
pub use root::{RootGuard, RootTracker};
pub use tree::{BlockDescriptor, BlockId, BlockTree};
