//! Error types
//!
//! Two taxonomies, one per sub-grammar:
//! - [`SyntaxError`]: problems in the document bytes (or the HTML/CSS inputs)
//! - [`QueryError`]: problems in an XPath-subset query string
//!
//! Both carry a stable kind plus the byte offset of the offending token,
//! relative to the start of the buffer that was being scanned.

use thiserror::Error;

/// Kind of a document-syntax error.
///
/// The discriminants are stable and exposed through [`SyntaxErrorKind::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u16)]
pub enum SyntaxErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd = 1,
    #[error("unexpected symbol")]
    UnexpectedSymbol = 2,
    #[error("out of memory")]
    OutOfMemory = 3,
    #[error("attribute is missing '='")]
    AttributeMissingEquals = 4,
    #[error("attribute value is missing its quote")]
    AttributeMissingQuote = 5,
    #[error("attribute name not found")]
    AttributeMissingName = 6,
    #[error("node closure mismatch")]
    NodeClosureMismatch = 7,
    #[error("tag closure mismatch")]
    TagClosureMismatch = 8,
    #[error("CDATA closure mismatch")]
    CDataClosureMismatch = 9,
    #[error("comment closure mismatch")]
    CommentClosureMismatch = 10,
    #[error("processing instruction closure mismatch")]
    ProcessingInstructionClosureMismatch = 11,
    #[error("tag name not found")]
    TagNameNotFound = 12,
    #[error("nesting depth exceeded")]
    NestingDepthExceeded = 13,

    // Tag-soup path
    #[error("html: unexpected end of input")]
    HtmlUnexpectedEnd = 101,
    #[error("html: unexpected symbol")]
    HtmlUnexpectedSymbol = 102,
    #[error("html: tag closure mismatch")]
    HtmlTagClosureMismatch = 103,
    #[error("html: comment closure mismatch")]
    HtmlCommentClosureMismatch = 104,
    #[error("unsupported CSS operator")]
    UnsupportedCssOperator = 105,
}

impl SyntaxErrorKind {
    /// Stable numeric code of this kind
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// A document-syntax error and where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset into the scanned buffer
    pub offset: usize,
}

impl SyntaxError {
    #[inline]
    pub const fn new(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    #[inline]
    pub const fn code(&self) -> u16 {
        self.kind.code()
    }
}

/// Kind of a query-syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u16)]
pub enum QueryErrorKind {
    #[error("'//' is only supported right before the final step")]
    DescendantNotLast = 1,
    #[error("attribute-set selection is not supported")]
    AttributeSetUnsupported = 2,
    #[error("node name missing")]
    NodeNameMissing = 3,
    #[error("unexpected token")]
    UnexpectedToken = 4,
    #[error("predicate is not closed")]
    PredicateClosure = 5,
    #[error("quote mismatch")]
    QuoteMismatch = 6,
    #[error("unsupported predicate operator")]
    UnsupportedOperator = 7,
    #[error("unsupported predicate value type")]
    UnsupportedValueType = 8,
    #[error("ordinal is not a number")]
    NonNumericOrdinal = 9,
    #[error("query ascends above the document")]
    AscendBeyondRoot = 10,
}

impl QueryErrorKind {
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// A query-syntax error and where in the query string it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at query offset {offset}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub offset: usize,
}

impl QueryError {
    #[inline]
    pub const fn new(kind: QueryErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Error returned by the public [`Parser`](crate::Parser) API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("cursor is not positioned on a node")]
    NotPositioned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(SyntaxErrorKind::NodeClosureMismatch, 42);
        assert_eq!(err.to_string(), "node closure mismatch at byte 42");
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::new(QueryErrorKind::DescendantNotLast, 3);
        assert_eq!(
            err.to_string(),
            "'//' is only supported right before the final step at query offset 3"
        );
    }

    #[test]
    fn test_error_from() {
        let err: Error = SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, 0).into();
        assert!(matches!(err, Error::Syntax(_)));
        let err: Error = QueryError::new(QueryErrorKind::NodeNameMissing, 0).into();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn test_html_codes_distinct() {
        assert_ne!(
            SyntaxErrorKind::HtmlUnexpectedEnd.code(),
            SyntaxErrorKind::UnexpectedEnd.code()
        );
    }
}
