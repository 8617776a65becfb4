//! Immutable read API.
//!
//! Snapshots describe how to render without exposing the token trees: the
//! UI renders from a snapshot and never mutates document content directly.
//! Blocks keep their stable ids so frontends can diff against the previous
//! snapshot, and the document version says when a re-render is due.

use crate::content::block::{Block, BlockId};
use crate::content::document::Document;
use crate::content::region::Region;
use crate::content::token::{InlineWidget, Mark, Token};
use crate::position;

/// Immutable view of the whole document at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u64,
    pub blocks: Vec<RenderBlock>,
}

/// One block prepared for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    /// Stable identity, persists across edits.
    pub id: BlockId,
    pub kind: String,
    pub indent: usize,
    pub regions: Vec<RenderRegion>,
}

/// One region flattened into renderable segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRegion {
    /// Total addressable bias length; what cursor math needs up front.
    pub token_count: usize,
    pub segments: Vec<RenderSegment>,
}

/// A run of content under one set of active marks.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderSegment {
    Text { text: String, marks: Vec<Mark> },
    Widget { widget: InlineWidget, marks: Vec<Mark> },
}

pub(crate) fn create_snapshot(doc: &Document) -> Snapshot {
    Snapshot {
        version: doc.version(),
        blocks: doc.blocks().map(|(_, block)| render_block(block)).collect(),
    }
}

fn render_block(block: &Block) -> RenderBlock {
    RenderBlock {
        id: block.id(),
        kind: block.kind().to_string(),
        indent: block.indent(),
        regions: block.regions().iter().map(render_region).collect(),
    }
}

fn render_region(region: &Region) -> RenderRegion {
    let mut segments = Vec::new();
    let mut marks: Vec<Mark> = Vec::new();
    let mut run = String::new();
    for token in region.tokens() {
        match token {
            Token::Text(c) => run.push(*c),
            Token::Widget(widget) => {
                flush(&mut segments, &mut run, &marks);
                segments.push(RenderSegment::Widget {
                    widget: widget.clone(),
                    marks: marks.clone(),
                });
            }
            Token::MarkStart(mark) => {
                flush(&mut segments, &mut run, &marks);
                marks.push(mark.clone());
            }
            Token::MarkEnd(mark) => {
                flush(&mut segments, &mut run, &marks);
                // Unmatched ends are ignored rather than corrupting the stack.
                if let Some(pos) = marks.iter().rposition(|m| m == mark) {
                    marks.remove(pos);
                }
            }
            Token::Hint => {}
        }
    }
    flush(&mut segments, &mut run, &marks);
    RenderRegion {
        token_count: position::token_count(region),
        segments,
    }
}

fn flush(segments: &mut Vec<RenderSegment>, run: &mut String, marks: &[Mark]) {
    if !run.is_empty() {
        segments.push(RenderSegment::Text {
            text: std::mem::take(run),
            marks: marks.to_vec(),
        });
    }
}
