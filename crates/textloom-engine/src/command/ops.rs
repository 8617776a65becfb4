//! The command catalogue: one payload shape per atomic mutation.

use std::any::Any;

use crate::command::Command;
use crate::content::block::{Block, BlockId};
use crate::content::document::{Document, RegionAddr, Side};
use crate::content::region::{Interval, Region};
use crate::content::token::{Mark, Token};
use crate::error::EditError;
use crate::order::key::OrderKey;
use crate::position::{self, Affinity, RefLocation};

fn locate(region: &Region, bias: usize, affinity: Affinity) -> Result<RefLocation, EditError> {
    position::bias_to_location_with(region, bias, affinity).ok_or(EditError::BiasOutOfRange {
        bias: bias as isize,
        count: position::token_count(region),
    })
}

/// Insert plain text at a bias position.
pub struct InsertText {
    pub target: RegionAddr,
    pub at: usize,
    pub text: String,
}

impl InsertText {
    pub fn new(target: RegionAddr, at: usize, text: impl Into<String>) -> Self {
        Self {
            target,
            at,
            text: text.into(),
        }
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl Command for InsertText {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let region = doc.region_mut(&self.target)?;
        let gap = locate(region, self.at, Affinity::Backward)?.gap();
        region.insert_tokens(gap, self.text.chars().map(Token::Text).collect());
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let region = doc.region_mut(&self.target)?;
        let gap = locate(region, self.at, Affinity::Backward)?.gap();
        region.remove_span(gap..gap + self.char_count());
        doc.bump_version();
        Ok(())
    }

    fn try_merge(&mut self, other: &mut dyn Command) -> bool {
        let Some(other) = other.as_any_mut().downcast_mut::<InsertText>() else {
            return false;
        };
        if other.target != self.target || other.at != self.at + self.char_count() {
            return false;
        }
        self.text.push_str(&other.text);
        true
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct RemovedSpan {
    gap: usize,
    tokens: Vec<Token>,
}

/// Delete a bias range; the removed token span is kept for undo.
///
/// Only tokens strictly inside the range are removed: boundary tokens at the
/// edges stay, so deleting the whole content of a wrapper leaves the (now
/// empty) wrapper in place. Rebalancing partially-covered wrappers is the
/// composing pipeline's concern.
pub struct DeleteRange {
    pub target: RegionAddr,
    pub range: Interval,
    removed: Option<RemovedSpan>,
}

impl DeleteRange {
    pub fn new(target: RegionAddr, range: Interval) -> Self {
        Self {
            target,
            range,
            removed: None,
        }
    }
}

impl Command for DeleteRange {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let region = doc.region_mut(&self.target)?;
        let range = self.range.resolve(region)?;
        let start = locate(region, range.start, Affinity::Forward)?.gap();
        let end = locate(region, range.end, Affinity::Backward)?.gap().max(start);
        let tokens = region.remove_span(start..end);
        self.removed = Some(RemovedSpan { gap: start, tokens });
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let span = self.removed.take().ok_or(EditError::MissingBuffer)?;
        let region = doc.region_mut(&self.target)?;
        region.insert_tokens(span.gap, span.tokens);
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Insert regions into a block at a region index.
pub struct InsertRegions {
    pub block: BlockId,
    pub at: usize,
    pub regions: Vec<Region>,
}

impl InsertRegions {
    pub fn new(block: BlockId, at: usize, regions: Vec<Region>) -> Self {
        Self { block, at, regions }
    }
}

impl Command for InsertRegions {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        if self.at > block.regions().len() {
            return Err(EditError::EditableNotFound {
                block: id,
                region: self.at,
            });
        }
        block.insert_regions(self.at, self.regions.clone());
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        block.remove_regions(self.at..self.at + self.regions.len());
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Remove a run of regions from a block by index.
pub struct RemoveRegions {
    pub block: BlockId,
    pub at: usize,
    pub count: usize,
    removed: Option<Vec<Region>>,
}

impl RemoveRegions {
    pub fn new(block: BlockId, at: usize, count: usize) -> Self {
        Self {
            block,
            at,
            count,
            removed: None,
        }
    }
}

impl Command for RemoveRegions {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        if self.at + self.count > block.regions().len() {
            return Err(EditError::EditableNotFound {
                block: id,
                region: self.at + self.count - 1,
            });
        }
        self.removed = Some(block.remove_regions(self.at..self.at + self.count));
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let regions = self.removed.take().ok_or(EditError::MissingBuffer)?;
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        block.insert_regions(self.at, regions);
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Create a block adjacent to an anchor. The assigned chain key is kept so a
/// redo lands the block in the same place.
pub struct CreateBlock {
    pub anchor: BlockId,
    pub side: Side,
    pub block: Block,
    key: Option<OrderKey>,
}

impl CreateBlock {
    pub fn new(anchor: BlockId, side: Side, block: Block) -> Self {
        Self {
            anchor,
            side,
            block,
            key: None,
        }
    }
}

impl Command for CreateBlock {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        match &self.key {
            Some(key) => doc.insert_at_key(key.clone(), self.block.clone())?,
            None => {
                let key = doc.insert_adjacent(&self.anchor, self.side, self.block.clone())?;
                self.key = Some(key);
            }
        }
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        doc.remove_block(&self.block.id())?;
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Remove blocks; undo restores each under its original key.
pub struct RemoveBlocks {
    pub blocks: Vec<BlockId>,
    removed: Option<Vec<(OrderKey, Block)>>,
}

impl RemoveBlocks {
    pub fn new(blocks: Vec<BlockId>) -> Self {
        Self {
            blocks,
            removed: None,
        }
    }
}

impl Command for RemoveBlocks {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let mut removed = Vec::with_capacity(self.blocks.len());
        for id in &self.blocks {
            removed.push(doc.remove_block(id)?);
        }
        self.removed = Some(removed);
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let removed = self.removed.take().ok_or(EditError::MissingBuffer)?;
        for (key, block) in removed.into_iter().rev() {
            doc.insert_at_key(key, block)?;
        }
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Swap a block for another at the same chain position.
pub struct ReplaceBlock {
    pub target: BlockId,
    pub replacement: Block,
    replaced: Option<Block>,
}

impl ReplaceBlock {
    pub fn new(target: BlockId, replacement: Block) -> Self {
        Self {
            target,
            replacement,
            replaced: None,
        }
    }
}

impl Command for ReplaceBlock {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let old = doc.replace_block(&self.target, self.replacement.clone())?;
        self.replaced = Some(old);
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let old = self.replaced.take().ok_or(EditError::MissingBuffer)?;
        doc.replace_block(&self.replacement.id(), old)?;
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Reorder: detach a block and reattach it adjacent to a new anchor.
pub struct MoveBlock {
    pub block: BlockId,
    pub anchor: BlockId,
    pub side: Side,
    origin: Option<OrderKey>,
}

impl MoveBlock {
    pub fn new(block: BlockId, anchor: BlockId, side: Side) -> Self {
        Self {
            block,
            anchor,
            side,
            origin: None,
        }
    }
}

impl Command for MoveBlock {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        if self.anchor == self.block || doc.block(&self.anchor).is_none() {
            return Err(EditError::BlockNotFound(self.anchor));
        }
        let (old_key, block) = doc.remove_block(&self.block)?;
        doc.insert_adjacent(&self.anchor, self.side, block)?;
        self.origin = Some(old_key);
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let origin = self.origin.take().ok_or(EditError::MissingBuffer)?;
        let (_, block) = doc.remove_block(&self.block)?;
        doc.insert_at_key(origin, block)?;
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Indent metadata change.
pub struct UpdateIndent {
    pub block: BlockId,
    pub indent: usize,
    previous: Option<usize>,
}

impl UpdateIndent {
    pub fn new(block: BlockId, indent: usize) -> Self {
        Self {
            block,
            indent,
            previous: None,
        }
    }
}

impl Command for UpdateIndent {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        self.previous = Some(block.indent());
        block.set_indent(self.indent);
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let previous = self.previous.take().ok_or(EditError::MissingBuffer)?;
        let id = self.block;
        let block = doc.block_mut(&id).ok_or(EditError::BlockNotFound(id))?;
        block.set_indent(previous);
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Wrap a bias range in a formatting boundary pair.
///
/// The pair encloses zero-width neighbors at both edges (start `Backward`,
/// end `Forward`), so a new wrapper nests cleanly around an existing one.
/// A collapsed range produces an empty wrapper, so formatting on an empty
/// selection stays addressable.
pub struct ApplyMark {
    pub target: RegionAddr,
    pub range: Interval,
    pub mark: Mark,
    placed: Option<(usize, usize)>,
}

impl ApplyMark {
    pub fn new(target: RegionAddr, range: Interval, mark: Mark) -> Self {
        Self {
            target,
            range,
            mark,
            placed: None,
        }
    }
}

impl Command for ApplyMark {
    fn execute(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let region = doc.region_mut(&self.target)?;
        let range = self.range.resolve(region)?;
        let start = locate(region, range.start, Affinity::Backward)?.gap();
        let end = locate(region, range.end, Affinity::Forward)?.gap().max(start);
        region.insert_token(end, Token::MarkEnd(self.mark.clone()));
        region.insert_token(start, Token::MarkStart(self.mark.clone()));
        self.placed = Some((start, end + 1));
        doc.bump_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<(), EditError> {
        let (start, end) = self.placed.take().ok_or(EditError::MissingBuffer)?;
        let region = doc.region_mut(&self.target)?;
        region.remove_token(end);
        region.remove_token(start);
        doc.bump_version();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
