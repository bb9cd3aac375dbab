//! SIMD-accelerated tag and attribute scanning using memchr
//!
//! The scanner finds tag boundaries, name tokens and attributes by byte
//! position. It never allocates; every result is a position or a
//! [`Span`] into the scanned buffer.

use super::span::Span;
use crate::error::{SyntaxError, SyntaxErrorKind};
use memchr::{memchr, memchr2};

/// One `name="value"` pair found by [`Scanner::next_attribute`].
///
/// The value span excludes the quotes and is still entity-escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: Span,
    pub value: Span,
}

/// Scanner over a document buffer
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Create a scanner positioned at `pos`
    #[inline]
    pub fn at(input: &'a [u8], pos: usize) -> Self {
        Scanner {
            input,
            pos: pos.min(input.len()),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Find next '>' at or after the current position
    /// Note: Does not handle '>' inside quotes - use find_tag_close_quoted for that
    #[inline]
    pub fn find_tag_close(&self) -> Option<usize> {
        memchr(b'>', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the '>' closing the current tag, skipping quoted attribute values
    pub fn find_tag_close_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        loop {
            let hit = memchr2(b'>', b'"', &self.input[pos..]).map(|i| pos + i)?;
            // Single quotes are rarer; check whether one opens before the hit
            let single = memchr(b'\'', &self.input[pos..hit]).map(|i| pos + i);
            let (at, quote) = match single {
                Some(s) => (s, b'\''),
                None if self.input[hit] == b'"' => (hit, b'"'),
                None => return Some(hit),
            };
            let close = memchr(quote, &self.input[at + 1..])?;
            pos = at + 1 + close + 1;
        }
    }

    /// End of the name token starting at the current position.
    ///
    /// Returns the current position when no name character is present.
    #[inline]
    pub fn find_symbol_end(&self) -> usize {
        let mut pos = self.pos;
        while pos < self.input.len() && is_symbol_char(self.input[pos]) {
            pos += 1;
        }
        pos
    }

    /// Read a name token and advance past it
    #[inline]
    pub fn read_symbol(&mut self) -> Option<Span> {
        let end = self.find_symbol_end();
        if end == self.pos {
            return None;
        }
        let span = Span::from_range(self.pos, end);
        self.pos = end;
        Some(span)
    }

    /// Scan forward to the next `name="value"` pair.
    ///
    /// Returns `Ok(None)` at `>`, `/>` or end of input. On error the
    /// position is left where it was.
    pub fn next_attribute(&mut self) -> Result<Option<RawAttribute>, SyntaxError> {
        let mut pos = self.pos;
        let input = self.input;

        loop {
            while pos < input.len() && is_space(input[pos]) {
                pos += 1;
            }
            match input.get(pos) {
                None | Some(b'>') => return Ok(None),
                Some(b'/') if input.get(pos + 1) == Some(&b'>') => return Ok(None),
                Some(b'=') | Some(b'"') | Some(b'\'') => {
                    return Err(SyntaxError::new(SyntaxErrorKind::AttributeMissingName, pos));
                }
                Some(&b) if !is_symbol_char(b) => {
                    // Noise such as a lone '/' or '['
                    pos += 1;
                    continue;
                }
                Some(_) => break,
            }
        }

        let name_start = pos;
        while pos < input.len() && is_symbol_char(input[pos]) {
            pos += 1;
        }
        let name = Span::from_range(name_start, pos);

        while pos < input.len() && is_space(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err(SyntaxError::new(SyntaxErrorKind::AttributeMissingEquals, pos));
        }
        pos += 1;
        while pos < input.len() && is_space(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => return Err(SyntaxError::new(SyntaxErrorKind::AttributeMissingQuote, pos)),
        };
        let value_start = pos + 1;
        let close = memchr(quote, &input[value_start..])
            .ok_or(SyntaxError::new(SyntaxErrorKind::AttributeMissingQuote, pos))?;
        let value = Span::from_range(value_start, value_start + close);

        self.pos = value_start + close + 1;
        Ok(Some(RawAttribute { name, value }))
    }
}

/// Whitespace for the purposes of this engine: any byte <= 0x20
#[inline]
pub fn is_space(b: u8) -> bool {
    b <= 0x20
}

/// Check if byte can appear in a tag or attribute name.
///
/// High-bit bytes and `# . :` are name characters; whitespace and
/// `/ < > = [ ]` and quotes end a name.
#[inline]
pub fn is_symbol_char(b: u8) -> bool {
    !matches!(b, 0..=0x20 | b'/' | b'<' | b'>' | b'=' | b'[' | b']' | b'"' | b'\'')
}

/// Trim bytes <= 0x20 from both ends of a span
pub fn trim_span(input: &[u8], span: Span) -> Span {
    let mut start = span.start();
    let mut end = span.end().min(input.len());
    while start < end && is_space(input[start]) {
        start += 1;
    }
    while end > start && is_space(input[end - 1]) {
        end -= 1;
    }
    Span::from_range(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_close() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_tag_close(), Some(12));
        let scanner = Scanner::at(b"<a><b>", 3);
        assert_eq!(scanner.find_tag_close(), Some(5));
    }

    #[test]
    fn test_find_tag_close_quoted() {
        let scanner = Scanner::new(b"<a attr=\">test\">content");
        assert_eq!(scanner.find_tag_close_quoted(), Some(15));
        let scanner = Scanner::new(b"<a x='>' y=\"'\">");
        assert_eq!(scanner.find_tag_close_quoted(), Some(14));
    }

    #[test]
    fn test_find_symbol_end() {
        let scanner = Scanner::at(b"<ns:elem.x#1 a='b'>", 1);
        assert_eq!(scanner.find_symbol_end(), 12);
        let scanner = Scanner::at(b"<a/>", 1);
        assert_eq!(scanner.find_symbol_end(), 2);
        let scanner = Scanner::at("<caf\u{e9}>".as_bytes(), 1);
        assert_eq!(scanner.find_symbol_end(), 6);
    }

    #[test]
    fn test_next_attribute() {
        let input = b"<a id=\"x\"  class = 'y z' />";
        let mut scanner = Scanner::at(input, 2);
        let first = scanner.next_attribute().unwrap().unwrap();
        assert_eq!(first.name.slice(input), b"id");
        assert_eq!(first.value.slice(input), b"x");
        let second = scanner.next_attribute().unwrap().unwrap();
        assert_eq!(second.name.slice(input), b"class");
        assert_eq!(second.value.slice(input), b"y z");
        assert_eq!(scanner.next_attribute().unwrap(), None);
    }

    #[test]
    fn test_next_attribute_raw_value() {
        let input = b"<a title=\"&lt;b&gt;\">";
        let mut scanner = Scanner::at(input, 2);
        let attr = scanner.next_attribute().unwrap().unwrap();
        assert_eq!(attr.value.slice(input), b"&lt;b&gt;");
    }

    #[test]
    fn test_next_attribute_errors_keep_position() {
        let input = b"<a checked>";
        let mut scanner = Scanner::at(input, 2);
        let err = scanner.next_attribute().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::AttributeMissingEquals);
        assert_eq!(err.offset, 10);
        assert_eq!(scanner.position(), 2);

        let mut scanner = Scanner::at(b"<a x=y>", 2);
        let err = scanner.next_attribute().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::AttributeMissingQuote);

        let mut scanner = Scanner::at(b"<a =\"y\">", 2);
        let err = scanner.next_attribute().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::AttributeMissingName);
    }

    #[test]
    fn test_trim_span() {
        let input = b"  abc \n";
        let span = trim_span(input, Span::from_range(0, input.len()));
        assert_eq!(span.slice(input), b"abc");
    }
}
