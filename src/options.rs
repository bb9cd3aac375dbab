//! Parser options

/// Options controlling how strictly the parser scans its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// If true, scans skip malformed fragments (stray `<`, broken attributes,
    /// unterminated special nodes at end of input) instead of aborting.
    /// Closure mismatches between real tags are errors either way.
    pub fault_tolerant: bool,
    /// Maximum depth of the node path.
    pub max_depth: usize,
    /// Separator emitted in place of whitespace runs by text decoding.
    pub text_separator: u8,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            fault_tolerant: false,
            max_depth: 256,
            text_separator: b' ',
        }
    }
}

impl ParserOptions {
    #[must_use]
    pub fn fault_tolerant(mut self, yes: bool) -> Self {
        self.fault_tolerant = yes;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    #[must_use]
    pub fn text_separator(mut self, separator: u8) -> Self {
        self.text_separator = separator;
        self
    }
}
