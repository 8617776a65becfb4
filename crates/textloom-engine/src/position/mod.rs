//! Bias addressing: converting between linear offsets and concrete locations
//! in a region's mixed token content.
//!
//! A **bias** counts addressable content units from the start of a region:
//! characters weigh 1, atomic widgets weigh 2 (an open + close pair), and
//! formatting boundaries and hint markers weigh 0. A bias value addresses
//! only entity content; zero-width tokens are transparent to the scale but
//! produce distinct locations. The gaps on either side of a `MarkStart`
//! share one bias value and differ only in whether the caret sits inside or
//! outside the wrapper; [`Affinity`] selects between them.
//!
//! Bias values are never persisted; every query recomputes from the live
//! token sequence.

pub mod softline;

pub use softline::SoftLine;

use crate::content::region::Region;
use crate::content::token::Token;

/// A concrete location inside one region.
///
/// The gap ordinal `0..=token_len` in the region's flat token sequence, the
/// flattened counterpart of a node/offset pair in a content tree. Only
/// meaningful relative to the region it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefLocation {
    gap: usize,
}

impl RefLocation {
    pub(crate) fn at(gap: usize) -> Self {
        Self { gap }
    }

    /// Raw gap ordinal in the region's token sequence.
    pub fn gap(&self) -> usize {
        self.gap
    }
}

/// Which of several equal-bias gaps to produce.
///
/// Gaps separated only by zero-width tokens share a bias value; the choice
/// decides whether the caret lands inside or outside a formatting wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// The gap immediately after the last entity consumed: before a wrapper
    /// that starts here, inside one that ends here. The canonical choice.
    Backward,
    /// The gap immediately before the next entity: inside a wrapper that
    /// starts here, after one that ends here.
    Forward,
}

/// Total addressable bias length of a region.
pub fn token_count(region: &Region) -> usize {
    region.tokens().iter().map(Token::weight).sum()
}

/// Canonical location for `bias`; `None` iff `bias` exceeds the region's
/// token count.
///
/// An empty region maps bias 0 to the gap inside its anchor point, never
/// `None`, so cursor placement and formatting on an empty selection keep
/// working. A bias falling strictly inside a widget resolves to the location
/// after it: adjacent, never inside.
pub fn bias_to_location(region: &Region, bias: usize) -> Option<RefLocation> {
    bias_to_location_with(region, bias, Affinity::Backward)
}

/// Location for `bias` with an explicit tie-break between equal-bias gaps.
pub fn bias_to_location_with(
    region: &Region,
    bias: usize,
    affinity: Affinity,
) -> Option<RefLocation> {
    if bias > token_count(region) {
        return None;
    }
    let tokens = region.tokens();
    let mut acc = 0;
    let mut first = None;
    let mut last = None;
    for gap in 0..=tokens.len() {
        if acc == bias {
            if first.is_none() {
                first = Some(gap);
            }
            last = Some(gap);
        } else if acc > bias {
            // No gap hits `bias` exactly: it falls inside a widget. Snap to
            // the first gap past it.
            if first.is_none() {
                first = Some(gap);
                last = Some(gap);
            }
            break;
        }
        if let Some(token) = tokens.get(gap) {
            acc += token.weight();
        }
    }
    let gap = match affinity {
        Affinity::Backward => first,
        Affinity::Forward => last,
    }?;
    Some(RefLocation::at(gap))
}

/// Bias of a location; exact inverse of [`bias_to_location`] for every
/// location it returns.
pub fn location_to_bias(region: &Region, loc: RefLocation) -> usize {
    let tokens = region.tokens();
    let gap = loc.gap().min(tokens.len());
    tokens[..gap].iter().map(Token::weight).sum()
}

/// One addressable step forward; `None` at the region boundary.
pub fn next_location(region: &Region, loc: RefLocation) -> Option<RefLocation> {
    let tokens = region.tokens();
    let entity = next_entity(tokens, loc.gap().min(tokens.len()))?;
    Some(RefLocation::at(entity + 1))
}

/// One addressable step backward; `None` at the region boundary.
pub fn prev_location(region: &Region, loc: RefLocation) -> Option<RefLocation> {
    let tokens = region.tokens();
    let entity = prev_entity(tokens, loc.gap().min(tokens.len()))?;
    Some(RefLocation::at(entity))
}

/// Word-boundary move forward using whitespace as the break class.
pub fn next_word_location(region: &Region, loc: RefLocation) -> Option<RefLocation> {
    next_word_location_by(region, loc, char::is_whitespace)
}

/// Word-boundary move backward using whitespace as the break class.
pub fn prev_word_location(region: &Region, loc: RefLocation) -> Option<RefLocation> {
    prev_word_location_by(region, loc, char::is_whitespace)
}

/// Word-boundary move forward with a caller-supplied break predicate.
///
/// Break characters before the word are skipped, then the word is crossed up
/// to the next break, widget, or region end. A widget is a word of its own.
/// `None` only when the location already sits at the region boundary.
pub fn next_word_location_by(
    region: &Region,
    loc: RefLocation,
    is_break: impl Fn(char) -> bool,
) -> Option<RefLocation> {
    let tokens = region.tokens();
    let mut gap = loc.gap().min(tokens.len());
    let mut i = next_entity(tokens, gap)?;
    // leading break characters
    loop {
        match &tokens[i] {
            Token::Text(c) if is_break(*c) => {
                gap = i + 1;
                match next_entity(tokens, gap) {
                    Some(n) => i = n,
                    None => return Some(RefLocation::at(gap)),
                }
            }
            _ => break,
        }
    }
    if let Token::Widget(_) = &tokens[i] {
        return Some(RefLocation::at(i + 1));
    }
    loop {
        match &tokens[i] {
            Token::Text(c) if !is_break(*c) => {
                gap = i + 1;
                match next_entity(tokens, gap) {
                    Some(n) => i = n,
                    None => return Some(RefLocation::at(gap)),
                }
            }
            _ => return Some(RefLocation::at(gap)),
        }
    }
}

/// Word-boundary move backward with a caller-supplied break predicate.
pub fn prev_word_location_by(
    region: &Region,
    loc: RefLocation,
    is_break: impl Fn(char) -> bool,
) -> Option<RefLocation> {
    let tokens = region.tokens();
    let mut gap = loc.gap().min(tokens.len());
    let mut i = prev_entity(tokens, gap)?;
    // trailing break characters
    loop {
        match &tokens[i] {
            Token::Text(c) if is_break(*c) => {
                gap = i;
                match prev_entity(tokens, gap) {
                    Some(p) => i = p,
                    None => return Some(RefLocation::at(gap)),
                }
            }
            _ => break,
        }
    }
    if let Token::Widget(_) = &tokens[i] {
        return Some(RefLocation::at(i));
    }
    loop {
        match &tokens[i] {
            Token::Text(c) if !is_break(*c) => {
                gap = i;
                match prev_entity(tokens, gap) {
                    Some(p) => i = p,
                    None => return Some(RefLocation::at(gap)),
                }
            }
            _ => return Some(RefLocation::at(gap)),
        }
    }
}

/// Index of the first entity token at or after `gap`.
fn next_entity(tokens: &[Token], gap: usize) -> Option<usize> {
    tokens[gap..]
        .iter()
        .position(Token::is_entity)
        .map(|offset| gap + offset)
}

/// Index of the last entity token strictly before `gap`.
fn prev_entity(tokens: &[Token], gap: usize) -> Option<usize> {
    tokens[..gap].iter().rposition(Token::is_entity)
}
