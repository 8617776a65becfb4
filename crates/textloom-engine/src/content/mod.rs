//! Document data model: tokens, regions, typed blocks, and the chain-ordered
//! document that owns them.

pub mod block;
pub mod document;
pub mod region;
pub mod token;

pub use block::{
    BackspacePlan, BehaviorRegistry, Block, BlockBehavior, BlockId, JoinMode, SerializedBlock,
};
pub use document::{Caret, Direction, Document, RegionAddr, Selection, Side};
pub use region::{EditableInterval, Interval, Region};
pub use token::{InlineWidget, Mark, Token};
