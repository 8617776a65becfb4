use serde_json::Value;

/// Inline formatting wrapper kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Bold,
    Italic,
    Link { href: String },
}

/// An opaque atomic inline object (an embedded reference, a mention, ...).
///
/// The core never interprets `data`; it travels with the widget the same way
/// block payloads travel through the serialization contract.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineWidget {
    pub kind: String,
    pub data: Value,
}

impl InlineWidget {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// One token of a region's content.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Plain character; weight 1 on the bias scale.
    Text(char),
    /// Atomic inline widget: a single indivisible unit consuming two bias
    /// units (an open + close pair). Never enterable.
    Widget(InlineWidget),
    /// Start of a formatting wrapper. Zero weight: transparent to the bias
    /// scale, but the gaps on either side are distinct locations.
    MarkStart(Mark),
    /// End of a formatting wrapper; zero weight like [`Token::MarkStart`].
    MarkEnd(Mark),
    /// Zero-width decorative marker, invisible to bias addressing.
    Hint,
}

impl Token {
    /// Weight on the bias scale.
    pub fn weight(&self) -> usize {
        match self {
            Token::Text(_) => 1,
            Token::Widget(_) => 2,
            Token::MarkStart(_) | Token::MarkEnd(_) | Token::Hint => 0,
        }
    }

    /// True for tokens that occupy bias units (characters and widgets).
    pub fn is_entity(&self) -> bool {
        self.weight() > 0
    }
}
