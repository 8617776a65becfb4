use std::collections::HashMap;

use anyhow::Context as _;

use crate::content::block::{BehaviorRegistry, Block, BlockBehavior, BlockId, SerializedBlock};
use crate::content::region::{EditableInterval, Region};
use crate::error::EditError;
use crate::order::chain::Chain;
use crate::order::key::{self, OrderKey};
use crate::snapshot::{self, Snapshot};

/// Address of one editable region: which block, which region slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionAddr {
    pub block: BlockId,
    pub region: usize,
}

impl RegionAddr {
    pub fn new(block: BlockId, region: usize) -> Self {
        Self { block, region }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Which side of an anchor block a new block lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Caret position in bias coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub block: BlockId,
    pub region: usize,
    pub bias: usize,
}

impl Caret {
    pub fn new(block: BlockId, region: usize, bias: usize) -> Self {
        Self {
            block,
            region,
            bias,
        }
    }

    pub fn addr(&self) -> RegionAddr {
        RegionAddr::new(self.block, self.region)
    }
}

/// Selection as an anchor/head caret pair; collapsed when they coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Caret,
    pub head: Caret,
}

impl Selection {
    pub fn caret(at: Caret) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// The document: an ordered chain of typed blocks plus selection state.
///
/// The chain owns the blocks; everything else holds a [`BlockId`] and
/// resolves it through the document on each use, so nothing outside extends
/// a block's lifetime. A version counter increments on every command execute
/// and undo for change detection by embedders.
#[derive(Debug, Clone, Default)]
pub struct Document {
    chain: Chain<Block>,
    index: HashMap<BlockId, OrderKey>,
    selection: Option<Selection>,
    version: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Blocks in chain order.
    pub fn blocks(&self) -> impl Iterator<Item = (&OrderKey, &Block)> {
        self.chain.iter()
    }

    /// Append at the end of the chain, generating the key.
    pub fn push_back(&mut self, block: Block) -> Result<OrderKey, EditError> {
        let key = match self.chain.last() {
            Some((k, _)) => key::generate_after(k)?,
            None => key::generate_initial(),
        };
        self.insert_at_key(key.clone(), block)?;
        Ok(key)
    }

    /// Insert next to `anchor`, generating a key between the anchor and its
    /// neighbor on that side.
    pub fn insert_adjacent(
        &mut self,
        anchor: &BlockId,
        side: Side,
        block: Block,
    ) -> Result<OrderKey, EditError> {
        let anchor_key = self
            .index
            .get(anchor)
            .ok_or(EditError::BlockNotFound(*anchor))?
            .clone();
        let key = match side {
            Side::After => match self.chain.next(&anchor_key) {
                Some((next, _)) => key::generate_between(&anchor_key, next)?,
                None => key::generate_after(&anchor_key)?,
            },
            Side::Before => match self.chain.previous(&anchor_key) {
                Some((prev, _)) => key::generate_between(prev, &anchor_key)?,
                None => key::generate_before(&anchor_key)?,
            },
        };
        self.insert_at_key(key.clone(), block)?;
        Ok(key)
    }

    /// Insert under a known key; O(n) in chain length. Undo paths use this to
    /// put a removed block back exactly where it was.
    pub fn insert_at_key(&mut self, key: OrderKey, block: Block) -> Result<(), EditError> {
        let id = block.id();
        self.chain.insert_ordered(key.clone(), block)?;
        self.index.insert(id, key);
        Ok(())
    }

    /// Unlink a block; returns its key so it can be restored in place.
    pub fn remove_block(&mut self, id: &BlockId) -> Result<(OrderKey, Block), EditError> {
        let key = self
            .index
            .remove(id)
            .ok_or(EditError::BlockNotFound(*id))?;
        let block = self
            .chain
            .remove(&key)
            .ok_or(EditError::BlockNotFound(*id))?;
        Ok((key, block))
    }

    /// Swap the block stored under `target`'s key; the replacement takes
    /// over the chain position.
    pub fn replace_block(
        &mut self,
        target: &BlockId,
        replacement: Block,
    ) -> Result<Block, EditError> {
        let key = self
            .index
            .remove(target)
            .ok_or(EditError::BlockNotFound(*target))?;
        let Some(slot) = self.chain.find_mut(&key) else {
            return Err(EditError::BlockNotFound(*target));
        };
        let new_id = replacement.id();
        let old = std::mem::replace(slot, replacement);
        self.index.insert(new_id, key);
        Ok(old)
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.chain.find(self.index.get(id)?)
    }

    pub(crate) fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        let key = self.index.get(id)?.clone();
        self.chain.find_mut(&key)
    }

    pub fn block_at(&self, key: &OrderKey) -> Option<&Block> {
        self.chain.find(key)
    }

    pub fn key_of(&self, id: &BlockId) -> Option<&OrderKey> {
        self.index.get(id)
    }

    pub fn next_block(&self, key: &OrderKey) -> Option<(&OrderKey, &Block)> {
        self.chain.next(key)
    }

    pub fn prev_block(&self, key: &OrderKey) -> Option<(&OrderKey, &Block)> {
        self.chain.previous(key)
    }

    /// Resolve a region address; failure means the calling handler reasoned
    /// incorrectly about document state.
    pub fn region(&self, addr: &RegionAddr) -> Result<&Region, EditError> {
        let block = self
            .block(&addr.block)
            .ok_or(EditError::BlockNotFound(addr.block))?;
        block.region(addr.region).ok_or(EditError::EditableNotFound {
            block: addr.block,
            region: addr.region,
        })
    }

    pub(crate) fn region_mut(&mut self, addr: &RegionAddr) -> Result<&mut Region, EditError> {
        let block = self
            .block_mut(&addr.block)
            .ok_or(EditError::BlockNotFound(addr.block))?;
        block.region_mut(addr.region).ok_or(EditError::EditableNotFound {
            block: addr.block,
            region: addr.region,
        })
    }

    pub fn region_count(&self, id: &BlockId) -> Option<usize> {
        Some(self.block(id)?.regions().len())
    }

    /// Resolve a multi-region interval against one of `block`'s regions,
    /// normalizing any from-the-end shorthand in its bounds.
    pub fn resolve_interval(
        &self,
        block: &BlockId,
        span: &EditableInterval,
    ) -> Result<std::ops::Range<usize>, EditError> {
        let region = self.region(&RegionAddr::new(*block, span.region))?;
        span.interval.resolve(region)
    }

    /// The adjacent region within the same block, if any.
    pub fn neighbor_region(&self, addr: &RegionAddr, dir: Direction) -> Option<RegionAddr> {
        let block = self.block(&addr.block)?;
        match dir {
            Direction::Forward if addr.region + 1 < block.regions().len() => {
                Some(RegionAddr::new(addr.block, addr.region + 1))
            }
            Direction::Backward if addr.region > 0 => {
                Some(RegionAddr::new(addr.block, addr.region - 1))
            }
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn set_caret(&mut self, caret: Caret) {
        self.selection = Some(Selection::caret(caret));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Immutable view for rendering; the UI never touches the token trees.
    pub fn snapshot(&self) -> Snapshot {
        snapshot::create_snapshot(self)
    }

    /// Project every block onto the serialization contract, in chain order.
    pub fn serialize(&self, registry: &BehaviorRegistry) -> Result<Vec<SerializedBlock>, EditError> {
        self.blocks()
            .map(|(_, block)| {
                let behavior = registry
                    .get(block.kind())
                    .ok_or_else(|| EditError::UnknownKind(block.kind().to_string()))?;
                Ok(behavior.serialize(block))
            })
            .collect()
    }

    /// Rebuild a document from serialized payloads via the registered block
    /// factories.
    pub fn from_serialized(
        payloads: &[SerializedBlock],
        registry: &BehaviorRegistry,
    ) -> anyhow::Result<Document> {
        let mut doc = Document::new();
        for payload in payloads {
            let behavior = registry.get(&payload.kind).with_context(|| {
                format!("no behavior registered for block type {:?}", payload.kind)
            })?;
            let block = behavior.materialize(payload)?;
            doc.push_back(block)?;
        }
        Ok(doc)
    }
}
