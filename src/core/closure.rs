//! Nested tag closure matching
//!
//! Finds the close tag that ends an element, given the position just past
//! its opening tag. Nodes never store their close position; navigation
//! calls back here whenever it needs one.

use super::tokenizer::{read_special, Token, TokenKind, Tokenizer};
use crate::error::{SyntaxError, SyntaxErrorKind};

/// Byte range of a matched close tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closure {
    /// Position of the `<` of `</name>`
    pub start: usize,
    /// Position just past its `>`
    pub end: usize,
}

/// Match the close tag of the element named `tag_name` whose content
/// starts at `inner_start`.
///
/// Open tags increment an enclosure counter and close tags decrement it;
/// the close tag that takes the counter to -1 must carry `tag_name`
/// (byte comparison) or the match fails with `NodeClosureMismatch` at
/// that tag's offset.
pub fn match_node_close(
    input: &[u8],
    inner_start: usize,
    tag_name: &[u8],
    fault_tolerant: bool,
) -> Result<Closure, SyntaxError> {
    let mut enclosure: usize = 0;

    for token in Tokenizer::new(input, inner_start, fault_tolerant).markup_only() {
        let token: Token = token?;
        match token.kind {
            TokenKind::OpenTag { compact: false } => enclosure += 1,
            TokenKind::CloseTag if enclosure == 0 => {
                if token.name.slice(input) != tag_name {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::NodeClosureMismatch,
                        token.start,
                    ));
                }
                return Ok(Closure {
                    start: token.start,
                    end: token.end,
                });
            }
            TokenKind::CloseTag => enclosure -= 1,
            _ => {}
        }
    }

    Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, input.len()))
}

/// If a comment, PI, CDATA section or declaration starts at `pos`,
/// return the position just past its closer.
pub fn match_special_node_close(
    input: &[u8],
    pos: usize,
    fault_tolerant: bool,
) -> Result<Option<usize>, SyntaxError> {
    if input.get(pos) != Some(&b'<') {
        return Ok(None);
    }
    Ok(read_special(input, pos, fault_tolerant)?.map(|token| token.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_of(input: &[u8], name: &[u8]) -> Result<Closure, SyntaxError> {
        let open = memchr::memmem::find(input, name).unwrap() - 1;
        let gt = memchr::memchr(b'>', &input[open..]).unwrap() + open;
        match_node_close(input, gt + 1, name, false)
    }

    #[test]
    fn test_simple_close() {
        let input = b"<a><b>x</b><c/></a>";
        let closure = close_of(input, b"a").unwrap();
        assert_eq!(&input[closure.start..closure.end], b"</a>");
    }

    #[test]
    fn test_nested_same_name() {
        let input = b"<a><a><a/></a></a>tail";
        let closure = close_of(input, b"a").unwrap();
        assert_eq!(closure.end, input.len() - 4);
    }

    #[test]
    fn test_special_nodes_skipped() {
        let input = b"<a><!-- </a> --><![CDATA[</a>]]><?pi </a>?></a>";
        let closure = close_of(input, b"a").unwrap();
        assert_eq!(closure.start, input.len() - 4);
    }

    #[test]
    fn test_mismatch_reports_offset() {
        let input = b"<a><b></b></c>";
        let err = close_of(input, b"a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NodeClosureMismatch);
        assert_eq!(err.offset, 10);
    }

    #[test]
    fn test_unexpected_end() {
        let input = b"<a><b></b>";
        let err = close_of(input, b"a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEnd);
        assert_eq!(err.offset, input.len());
    }

    #[test]
    fn test_case_sensitive() {
        let err = close_of(b"<a></A>", b"a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NodeClosureMismatch);
    }

    #[test]
    fn test_match_special_node_close() {
        let input = b"<!-- x --><a/>";
        assert_eq!(match_special_node_close(input, 0, false).unwrap(), Some(10));
        assert_eq!(match_special_node_close(input, 10, false).unwrap(), None);
    }
}
