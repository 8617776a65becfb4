use std::collections::VecDeque;

use crate::command::{BoxedCommand, Command};
use crate::content::document::Document;
use crate::error::EditError;

pub const DEFAULT_CAPACITY: usize = 200;

/// Undo/redo stacks over boxed commands.
///
/// Commands are strictly serialized: one executes to completion before the
/// next is processed. Executing a fresh command discards the redo stack, so
/// history never branches. The undo stack is a bounded ring; the oldest
/// entry is evicted silently once the capacity is exceeded, observable only
/// as an inability to undo that far back.
pub struct History {
    done: VecDeque<BoxedCommand>,
    undone: Vec<BoxedCommand>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            capacity,
        }
    }

    /// Run a command and record it.
    pub fn execute(&mut self, doc: &mut Document, mut command: BoxedCommand) -> Result<(), EditError> {
        command.execute(doc)?;
        self.push_executed(command);
        Ok(())
    }

    /// Record a command the caller already executed.
    ///
    /// Clears the redo stack, then offers the command to the top of the undo
    /// stack for merging (consecutive single-character inserts coalesce into
    /// one undo step); only if the top declines is it pushed.
    pub fn push_executed(&mut self, mut command: BoxedCommand) {
        self.undone.clear();
        if let Some(top) = self.done.back_mut()
            && top.try_merge(command.as_mut())
        {
            log::trace!("merged command into undo top (depth {})", self.done.len());
            return;
        }
        self.done.push_back(command);
        if self.done.len() > self.capacity {
            self.done.pop_front();
        }
    }

    /// Undo the most recent command; `false` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, EditError> {
        let Some(mut command) = self.done.pop_back() else {
            return Ok(false);
        };
        command.undo(doc)?;
        self.undone.push(command);
        log::debug!(
            "undo (depth {}, redoable {})",
            self.done.len(),
            self.undone.len()
        );
        Ok(true)
    }

    /// Re-run the most recently undone command (replay, not re-derive);
    /// `false` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, EditError> {
        let Some(mut command) = self.undone.pop() else {
            return Ok(false);
        };
        command.execute(doc)?;
        self.done.push_back(command);
        if self.done.len() > self.capacity {
            self.done.pop_front();
        }
        log::debug!(
            "redo (depth {}, redoable {})",
            self.done.len(),
            self.undone.len()
        );
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ops::InsertText;
    use crate::content::block::Block;
    use crate::content::document::RegionAddr;
    use crate::content::region::Region;

    fn doc_with(text: &str) -> (Document, RegionAddr) {
        let mut doc = Document::new();
        let block = Block::with_regions("note", vec![Region::from_text(text)]);
        let addr = RegionAddr::new(block.id(), 0);
        doc.push_back(block).expect("push");
        (doc, addr)
    }

    fn region_text(doc: &Document, addr: &RegionAddr) -> String {
        doc.region(addr).expect("region").text()
    }

    fn insert(addr: RegionAddr, at: usize, text: &str) -> BoxedCommand {
        Box::new(InsertText::new(addr, at, text))
    }

    #[test]
    fn undo_and_redo_walk_the_stacks() {
        let (mut doc, addr) = doc_with("");
        let mut history = History::new();
        history.execute(&mut doc, insert(addr, 0, "a")).unwrap();
        assert_eq!(region_text(&doc, &addr), "a");

        assert!(history.undo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "");
        assert!(history.can_redo());

        assert!(history.redo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "a");
    }

    #[test]
    fn empty_stacks_are_benign_no_ops() {
        let (mut doc, _) = doc_with("");
        let mut history = History::new();
        assert!(!history.undo(&mut doc).unwrap());
        assert!(!history.redo(&mut doc).unwrap());
    }

    #[test]
    fn a_fresh_edit_discards_the_redo_stack() {
        let (mut doc, addr) = doc_with("");
        let mut history = History::new();
        history.execute(&mut doc, insert(addr, 0, "a")).unwrap();
        assert!(history.undo(&mut doc).unwrap());
        history.execute(&mut doc, insert(addr, 0, "b")).unwrap();

        // No branching: the undone command is unreachable.
        assert!(!history.redo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "b");
    }

    #[test]
    fn contiguous_inserts_merge_into_one_undo_step() {
        let (mut doc, addr) = doc_with("");
        let mut history = History::new();
        history.execute(&mut doc, insert(addr, 0, "h")).unwrap();
        history.execute(&mut doc, insert(addr, 1, "i")).unwrap();
        assert_eq!(region_text(&doc, &addr), "hi");
        assert_eq!(history.undo_depth(), 1);

        assert!(history.undo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "");
        assert!(history.redo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "hi");
    }

    #[test]
    fn capacity_evicts_silently_from_the_bottom() {
        let (mut doc, addr) = doc_with("");
        let mut history = History::with_capacity(2);
        // Non-contiguous positions so the commands do not merge.
        history.execute(&mut doc, insert(addr, 0, "c")).unwrap();
        history.execute(&mut doc, insert(addr, 0, "b")).unwrap();
        history.execute(&mut doc, insert(addr, 0, "a")).unwrap();
        assert_eq!(region_text(&doc, &addr), "abc");
        assert_eq!(history.undo_depth(), 2);

        assert!(history.undo(&mut doc).unwrap());
        assert!(history.undo(&mut doc).unwrap());
        assert_eq!(region_text(&doc, &addr), "c");
        // The first command was evicted; undo stops here.
        assert!(!history.undo(&mut doc).unwrap());
    }
}
