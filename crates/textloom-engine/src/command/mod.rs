/*!
 * # Editing Transaction Engine
 *
 * Every user action (a keystroke, a paste, a formatting toggle, Enter in a
 * list item) becomes one undoable [`Command`] handed to
 * [`History`](history::History). The pieces:
 *
 * ## 1. Commands (`ops`)
 * The catalogue of atomic mutations: insert/delete text, insert/remove
 * regions, create/remove/replace/move blocks, indent changes, formatting
 * wraps. Each command carries an immutable payload and a private buffer
 * populated by `execute` with exactly what `undo` needs (removed tokens,
 * previous chain keys, previous metadata); the payload alone is not enough
 * once the document has mutated.
 *
 * ## 2. Pipelines (`pipeline`)
 * Composite actions decompose into ordered steps where later steps need
 * information only available after earlier steps ran ("delete the trailing
 * content, remember it, re-insert it in a new block"). A
 * [`CommandPipeline`](pipeline::CommandPipeline) collects lazy steps that
 * each see the shared context, a scratch bag written by earlier steps, and a
 * control token to skip themselves or stop the pipeline. `build()` yields a
 * single aggregate command: one undo step, deterministic redo, cursor
 * restoration hooks. Block types describe their steps once instead of
 * hand-writing bespoke undo logic.
 *
 * ## 3. History (`history`)
 * Two stacks of boxed commands with merge-on-append (consecutive
 * single-character inserts collapse into one undo step) and a bounded
 * capacity with silent eviction. Executing a fresh command discards the redo
 * stack: history never branches.
 *
 * Everything runs synchronously on one call stack; commands are strictly
 * serialized, and a built command runs to completion once started.
 */

pub mod history;
pub mod ops;
pub mod pipeline;

use std::any::Any;

use crate::content::document::Document;
use crate::error::EditError;

/// The atomic unit of undoable work.
pub trait Command {
    /// Perform the mutation and stash whatever [`Command::undo`] will need.
    ///
    /// Calling `execute` twice without an intervening `undo` is undefined;
    /// History owns the exactly-once alternation.
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError>;

    /// Reverse the mutation using only the payload and the execute buffer.
    /// Afterwards the document is structurally and bias-addressably
    /// identical to the state before `execute`.
    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError>;

    /// Coalesce `other`, the command executed immediately after this one,
    /// into `self`. On success the caller discards `other` and `self`
    /// represents both.
    fn try_merge(&mut self, _other: &mut dyn Command) -> bool {
        false
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type BoxedCommand = Box<dyn Command>;
