//! Span - offset and length into the active document buffer
//!
//! Every view the parser hands out (tag names, attribute blocks, values)
//! is a span. Spans are buffer-relative, so cloning a parser never has to
//! rebase them.

/// A span referencing a portion of the document buffer.
///
/// Size: 8 bytes (offset: 4 bytes, len: 4 bytes). Documents are limited
/// to 4GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset into the buffer
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Create a span covering `start..end` (usize positions)
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            offset: start as u32,
            len: end.saturating_sub(start) as u32,
        }
    }

    #[inline]
    pub const fn empty() -> Self {
        Self { offset: 0, len: 0 }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn start(&self) -> usize {
        self.offset as usize
    }

    /// End offset (exclusive)
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset as usize + self.len as usize
    }

    /// Extract the byte slice from input
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        input.get(self.start()..self.end()).unwrap_or(&[])
    }

    /// Extract as UTF-8 string from input
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(5, 10);
        assert_eq!(span.start(), 5);
        assert_eq!(span.end(), 15);
        assert!(!span.is_empty());
        assert!(Span::empty().is_empty());
    }

    #[test]
    fn test_span_slice() {
        let input = b"hello world";
        assert_eq!(Span::from_range(6, 11).slice(input), b"world");
        assert_eq!(Span::new(0, 5).as_str(input), Some("hello"));
    }

    #[test]
    fn test_span_out_of_bounds() {
        let input = b"short";
        assert_eq!(Span::new(3, 10).slice(input), b"");
    }
}
