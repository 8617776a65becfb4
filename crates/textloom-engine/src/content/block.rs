use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::command::pipeline::CommandPipeline;
use crate::content::document::{Caret, Document};
use crate::content::region::Region;
use crate::error::EditError;

/// Stable block identity, independent of the block's position in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A typed block: the unit the chain orders.
///
/// `kind` selects the registered [`BlockBehavior`]; `data` is the opaque
/// block-specific payload from the serialization contract. The editable
/// content lives in one or more regions (a paragraph has one, a table cell
/// block has several).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    kind: String,
    indent: usize,
    regions: Vec<Region>,
    data: Value,
}

impl Block {
    /// New block of `kind` with a single empty region.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: BlockId::new(),
            kind: kind.into(),
            indent: 0,
            regions: vec![Region::new()],
            data: Value::Null,
        }
    }

    pub fn with_regions(kind: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            id: BlockId::new(),
            kind: kind.into(),
            indent: 0,
            regions,
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub(crate) fn region_mut(&mut self, index: usize) -> Option<&mut Region> {
        self.regions.get_mut(index)
    }

    pub(crate) fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }

    pub(crate) fn insert_regions(&mut self, at: usize, regions: Vec<Region>) {
        self.regions.splice(at..at, regions);
    }

    pub(crate) fn remove_regions(&mut self, span: std::ops::Range<usize>) -> Vec<Region> {
        self.regions.splice(span, std::iter::empty()).collect()
    }
}

/// The opaque per-block serialization contract.
///
/// The core never interprets `data`; it only shuttles it between the
/// block-type factory and serializer collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

/// How a block relates to its predecessor after Backspace at the start of
/// its first region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Content merges into the previous block.
    Connect,
    /// The block stays; only its own structure changes (e.g. outdent).
    Independent,
}

/// What [`BlockBehavior::backspace_at_start`] hands back: the pipeline to
/// run plus how the caller should treat the block afterwards.
pub struct BackspacePlan {
    pub pipeline: CommandPipeline,
    pub mode: JoinMode,
}

/// Per-block-type editing capability set.
///
/// Each block type registers one implementation; the core dispatches through
/// this interface and never inspects block types directly. Builders receive
/// the document read-only and describe the edit as a pipeline; the session
/// executes it through history.
pub trait BlockBehavior {
    fn kind(&self) -> &str;

    /// Build the command pipeline for pressing Enter with a collapsed caret.
    fn enter_collapsed(
        &self,
        doc: &Document,
        caret: &Caret,
    ) -> Result<CommandPipeline, EditError>;

    /// Build the pipeline for Backspace at the very start of the first
    /// region.
    fn backspace_at_start(
        &self,
        doc: &Document,
        caret: &Caret,
    ) -> Result<BackspacePlan, EditError>;

    /// Project the block onto the serialization contract.
    fn serialize(&self, block: &Block) -> SerializedBlock;

    /// Rebuild a block from its serialized payload.
    fn materialize(&self, payload: &SerializedBlock) -> Result<Block, EditError>;
}

/// Kind-keyed registry of block behaviors.
#[derive(Default)]
pub struct BehaviorRegistry {
    behaviors: HashMap<String, Box<dyn BlockBehavior>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the behavior's own kind; replaces any previous
    /// registration for that kind.
    pub fn register(&mut self, behavior: Box<dyn BlockBehavior>) {
        self.behaviors.insert(behavior.kind().to_string(), behavior);
    }

    pub fn get(&self, kind: &str) -> Option<&dyn BlockBehavior> {
        self.behaviors.get(kind).map(|b| b.as_ref())
    }
}
