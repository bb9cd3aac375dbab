//! Markup tokenizer
//!
//! Splits a buffer into a small closed set of token kinds:
//! open tags, close tags, comments, processing instructions, CDATA
//! sections, other `<!...>` declarations, and text. Special nodes are
//! recognized by prefix and consumed whole, so consumers such as the
//! closure matcher never look inside them.

use super::scanner::{is_symbol_char, trim_span, Scanner};
use super::span::Span;
use crate::error::{SyntaxError, SyntaxErrorKind};
use memchr::{memchr, memchr2, memmem};

/// Type of markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name ...>` or `<name .../>` (compact)
    OpenTag { compact: bool },
    /// `</name>`
    CloseTag,
    /// `<!-- ... -->`
    Comment,
    /// `<? ... ?>`
    ProcessingInstruction,
    /// `<![CDATA[ ... ]]>`
    CData,
    /// `<!DOCTYPE ...>` and friends, with an optional `[...]` subset
    Declaration,
    /// Everything between markup
    Text,
}

/// A token and its byte range in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Position of the token's first byte (`<` for markup)
    pub start: usize,
    /// Position just past the token's last byte
    pub end: usize,
    /// Tag name for open and close tags
    pub name: Span,
    /// Raw, trimmed attribute block for open tags
    pub attributes: Span,
}

impl Token {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            start,
            end,
            name: Span::empty(),
            attributes: Span::empty(),
        }
    }

    /// Comments, processing instructions, CDATA and declarations
    #[inline]
    pub fn is_special(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Comment
                | TokenKind::ProcessingInstruction
                | TokenKind::CData
                | TokenKind::Declaration
        )
    }

    #[inline]
    pub fn is_compact(&self) -> bool {
        matches!(self.kind, TokenKind::OpenTag { compact: true })
    }
}

/// Pull tokenizer over a buffer
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    fault_tolerant: bool,
    skip_text: bool,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `input` starting at `pos`
    pub fn new(input: &'a [u8], pos: usize, fault_tolerant: bool) -> Self {
        Tokenizer {
            scanner: Scanner::at(input, pos),
            fault_tolerant,
            skip_text: false,
            failed: false,
        }
    }

    /// Do not yield Text tokens
    #[must_use]
    pub fn markup_only(mut self) -> Self {
        self.skip_text = true;
        self
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Continue tokenizing from `pos`
    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.scanner.set_position(pos);
    }

    fn text_until_markup(&mut self, start: usize) -> Token {
        let input = self.scanner.input();
        let from = (start + 1).min(input.len());
        let end = memchr(b'<', &input[from..]).map_or(input.len(), |i| from + i);
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, start, end)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.scanner.is_eof() {
                return None;
            }
            let start = self.scanner.position();
            let input = self.scanner.input();

            let token = if input[start] != b'<' {
                self.text_until_markup(start)
            } else {
                match read_markup(input, start, self.fault_tolerant) {
                    Ok(Some(token)) => {
                        self.scanner.set_position(token.end);
                        token
                    }
                    // Stray '<' tolerated as text
                    Ok(None) => self.text_until_markup(start),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            };

            if self.skip_text && token.kind == TokenKind::Text {
                continue;
            }
            return Some(Ok(token));
        }
    }
}

/// Read the markup token starting at the `<` at `pos`.
///
/// Returns `Ok(None)` when the `<` does not start markup and
/// `fault_tolerant` is set.
pub fn read_markup(
    input: &[u8],
    pos: usize,
    fault_tolerant: bool,
) -> Result<Option<Token>, SyntaxError> {
    debug_assert_eq!(input.get(pos), Some(&b'<'));

    if let Some(token) = read_special(input, pos, fault_tolerant)? {
        return Ok(Some(token));
    }

    let reject = |kind| {
        if fault_tolerant {
            Ok(None)
        } else {
            Err(SyntaxError::new(kind, pos))
        }
    };

    if input.get(pos + 1) == Some(&b'/') {
        let mut scanner = Scanner::at(input, pos + 2);
        let Some(name) = scanner.read_symbol() else {
            return reject(SyntaxErrorKind::TagNameNotFound);
        };
        let Some(gt) = scanner.find_tag_close() else {
            return reject(SyntaxErrorKind::TagClosureMismatch);
        };
        let mut token = Token::new(TokenKind::CloseTag, pos, gt + 1);
        token.name = name;
        return Ok(Some(token));
    }

    match input.get(pos + 1) {
        Some(&b) if is_symbol_char(b) => {}
        _ => return reject(SyntaxErrorKind::TagNameNotFound),
    }

    let mut scanner = Scanner::at(input, pos + 1);
    let Some(name) = scanner.read_symbol() else {
        return reject(SyntaxErrorKind::TagNameNotFound);
    };
    let Some(gt) = scanner.find_tag_close_quoted() else {
        return reject(SyntaxErrorKind::TagClosureMismatch);
    };
    let compact = gt > name.end() && input[gt - 1] == b'/';
    let attr_end = if compact { gt - 1 } else { gt };

    let mut token = Token::new(TokenKind::OpenTag { compact }, pos, gt + 1);
    token.name = name;
    token.attributes = trim_span(input, Span::from_range(name.end(), attr_end));
    Ok(Some(token))
}

/// Recognize a comment, PI, CDATA section or declaration at `pos`.
///
/// Returns `Ok(None)` if the markup at `pos` is an ordinary tag.
pub fn read_special(
    input: &[u8],
    pos: usize,
    fault_tolerant: bool,
) -> Result<Option<Token>, SyntaxError> {
    let rest = &input[pos..];
    let (kind, body, closer, err) = if rest.starts_with(b"<!--") {
        (
            TokenKind::Comment,
            4,
            &b"-->"[..],
            SyntaxErrorKind::CommentClosureMismatch,
        )
    } else if rest.starts_with(b"<![CDATA[") {
        (
            TokenKind::CData,
            9,
            &b"]]>"[..],
            SyntaxErrorKind::CDataClosureMismatch,
        )
    } else if rest.starts_with(b"<?") {
        (
            TokenKind::ProcessingInstruction,
            2,
            &b"?>"[..],
            SyntaxErrorKind::ProcessingInstructionClosureMismatch,
        )
    } else if rest.starts_with(b"<!") {
        return declaration_end(input, pos)
            .or(if fault_tolerant { Some(input.len()) } else { None })
            .map(|end| Some(Token::new(TokenKind::Declaration, pos, end)))
            .ok_or(SyntaxError::new(SyntaxErrorKind::TagClosureMismatch, pos));
    } else {
        return Ok(None);
    };

    match memmem::find(&rest[body..], closer) {
        Some(i) => Ok(Some(Token::new(kind, pos, pos + body + i + closer.len()))),
        None if fault_tolerant => Ok(Some(Token::new(kind, pos, input.len()))),
        None => Err(SyntaxError::new(err, pos)),
    }
}

/// End of a `<! ... >` or `<! ... [ ... ]>` declaration
fn declaration_end(input: &[u8], pos: usize) -> Option<usize> {
    let from = pos + 2;
    let hit = memchr2(b'>', b'[', &input[from..]).map(|i| from + i)?;
    if input[hit] == b'>' {
        return Some(hit + 1);
    }
    let close = memchr(b']', &input[hit..]).map(|i| hit + i)?;
    memchr(b'>', &input[close..]).map(|i| close + i + 1)
}
