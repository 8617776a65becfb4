use crate::content::block::BlockId;
use crate::order::chain::ChainError;
use crate::order::key::OrderError;

/// Crate-wide error type for the editing core.
///
/// Every variant here is a precondition violation: the calling handler
/// reasoned incorrectly about document state, so the error propagates
/// uncaught rather than being silently recovered. Benign conditions (undo on
/// an empty stack, a position query past the region end, a step with nothing
/// to do) are expressed as `bool`/`Option` returns instead and never appear
/// here.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("block {0} is not in the document")]
    BlockNotFound(BlockId),
    #[error("no editable region {region} in block {block}")]
    EditableNotFound { block: BlockId, region: usize },
    #[error("no active selection range")]
    NoRange,
    #[error("bias {bias} is outside the region (token count {count})")]
    BiasOutOfRange { bias: isize, count: usize },
    #[error("undo called before execute populated the command buffer")]
    MissingBuffer,
    #[error("no behavior registered for block type {0:?}")]
    UnknownKind(String),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}
