use serde_json::json;
use textloom_engine::{Block, Document, InlineWidget, Mark, Region, Token};

/// Region mixing plain text with wrappers and the occasional widget, the
/// shape bias queries see in real documents.
pub fn generate_region(entities: usize) -> Region {
    let mut tokens = Vec::with_capacity(entities * 2);
    for i in 0..entities {
        match i % 24 {
            7 => {
                tokens.push(Token::MarkStart(Mark::Bold));
                tokens.push(Token::Text('b'));
                tokens.push(Token::MarkEnd(Mark::Bold));
            }
            15 => tokens.push(Token::Widget(InlineWidget::new("embed", json!(i)))),
            23 => {
                tokens.push(Token::Hint);
                tokens.push(Token::Text(' '));
            }
            _ => tokens.push(Token::Text('x')),
        }
    }
    Region::from_tokens(tokens)
}

pub fn generate_document(blocks: usize, entities_per_block: usize) -> Document {
    let mut doc = Document::new();
    for _ in 0..blocks {
        let block = Block::with_regions("note", vec![generate_region(entities_per_block)]);
        doc.push_back(block).expect("push");
    }
    doc
}
