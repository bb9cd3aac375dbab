//! Node views

use crate::core::span::Span;
use crate::core::tokenizer::{Token, TokenKind};

/// One element of the navigation path.
///
/// A node is a view into the document buffer; it never stores where the
/// element closes. That position is recomputed by the closure matcher
/// whenever an accessor or a sibling move needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    /// Tag name
    pub name: Span,
    /// Raw attribute block, trimmed, still escaped
    pub attributes: Span,
    /// Position of the opening `<`
    pub outer_start: usize,
    /// Position just past the opening tag's `>`
    pub inner_start: usize,
    /// `<name ... />`
    pub compact: bool,
}

impl Node {
    /// Node for an open-tag token
    pub fn from_token(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::OpenTag { compact } => Some(Node {
                name: token.name,
                attributes: token.attributes,
                outer_start: token.start,
                inner_start: token.end,
                compact,
            }),
            _ => None,
        }
    }

    #[inline]
    pub fn is_compact(&self) -> bool {
        self.compact
    }
}
