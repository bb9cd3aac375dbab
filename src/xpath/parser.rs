//! Query Step Parser
//!
//! Parses one path segment such as `a`, `*[2]` or `a[@href^='http'][0]`
//! into an immutable [`Qualifier`]. Offsets in errors are relative to the
//! whole query string.

use crate::core::attributes::find_attribute;
use crate::core::entities::decode_entities;
use crate::core::scanner::is_symbol_char;
use crate::core::span::Span;
use crate::error::{QueryError, QueryErrorKind};
use memchr::{memchr, memmem};

/// Element name test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// Byte-exact tag name
    Exact(Vec<u8>),
}

impl NameTest {
    #[inline]
    pub fn matches(&self, name: &[u8]) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Exact(expected) => expected.as_slice() == name,
        }
    }
}

/// Attribute comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `:=`
    StartsWith,
    /// `?=`
    EndsWith,
    /// `~=`
    Contains,
    /// `^=`, whole whitespace-delimited word
    HasWord,
}

impl CompareOp {
    /// Operator for the byte that precedes `=`, or `None` for a plain `=`
    fn from_prefix(prefix: Option<u8>) -> Option<Self> {
        Some(match prefix {
            None => CompareOp::Equals,
            Some(b'!') => CompareOp::NotEquals,
            Some(b':') => CompareOp::StartsWith,
            Some(b'?') => CompareOp::EndsWith,
            Some(b'~') => CompareOp::Contains,
            Some(b'^') => CompareOp::HasWord,
            Some(_) => return None,
        })
    }

    /// Compare a decoded attribute value against a query literal
    pub fn apply(self, value: &[u8], expected: &[u8]) -> bool {
        match self {
            CompareOp::Equals => value == expected,
            CompareOp::NotEquals => value != expected,
            CompareOp::StartsWith => value.starts_with(expected),
            CompareOp::EndsWith => value.ends_with(expected),
            CompareOp::Contains => memmem::find(value, expected).is_some(),
            CompareOp::HasWord => value
                .split(|b| b.is_ascii_whitespace())
                .any(|word| word == expected),
        }
    }
}

/// Attribute part of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributePredicate {
    Any,
    /// `[@name]`
    Has(Vec<u8>),
    /// `[@name op 'value']`
    Compare {
        op: CompareOp,
        name: Vec<u8>,
        value: Vec<u8>,
    },
}

/// One compiled step: name test, attribute test and optional ordinal.
///
/// Qualifiers never change after compilation; ordinal progress lives in
/// the evaluator's per-selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub name: NameTest,
    pub predicate: AttributePredicate,
    /// Zero-based index among the siblings passing the other two tests
    pub ordinal: Option<usize>,
}

impl Qualifier {
    /// Qualifier accepting any element
    pub fn any() -> Self {
        Qualifier {
            name: NameTest::Any,
            predicate: AttributePredicate::Any,
            ordinal: None,
        }
    }

    /// Name and attribute test (the ordinal is checked by the evaluator).
    ///
    /// A missing attribute fails every comparison, `!=` included.
    pub fn matches(&self, name: &[u8], attributes: &[u8], fault_tolerant: bool) -> bool {
        if !self.name.matches(name) {
            return false;
        }
        let block = Span::from_range(0, attributes.len());
        match &self.predicate {
            AttributePredicate::Any => true,
            AttributePredicate::Has(attr) => {
                matches!(find_attribute(attributes, block, attr, fault_tolerant), Ok(Some(_)))
            }
            AttributePredicate::Compare { op, name, value } => {
                match find_attribute(attributes, block, name, fault_tolerant) {
                    Ok(Some(raw)) => op.apply(&decode_entities(raw), value),
                    _ => false,
                }
            }
        }
    }
}

/// Parse the segment `query[start..end]` into a qualifier
pub fn parse_step(query: &str, start: usize, end: usize) -> Result<Qualifier, QueryError> {
    let mut parser = StepParser {
        bytes: query.as_bytes(),
        pos: start,
        end,
    };
    parser.parse()
}

struct StepParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> StepParser<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        if self.pos < self.end {
            Some(self.bytes[self.pos])
        } else {
            None
        }
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(b) if b <= 0x20) {
            self.advance();
        }
    }

    #[inline]
    fn error(&self, kind: QueryErrorKind) -> QueryError {
        QueryError::new(kind, self.pos)
    }

    fn parse(&mut self) -> Result<Qualifier, QueryError> {
        self.skip_spaces();
        let mut qualifier = Qualifier::any();
        qualifier.name = self.parse_name()?;

        loop {
            self.skip_spaces();
            match self.peek() {
                None => return Ok(qualifier),
                Some(b'[') => self.parse_predicate(&mut qualifier)?,
                Some(_) => return Err(self.error(QueryErrorKind::UnexpectedToken)),
            }
        }
    }

    fn parse_name(&mut self) -> Result<NameTest, QueryError> {
        match self.peek() {
            Some(b'@') => return Err(self.error(QueryErrorKind::AttributeSetUnsupported)),
            Some(b'*') => {
                self.advance();
                return Ok(NameTest::Any);
            }
            _ => {}
        }
        let start = self.pos;
        self.read_symbol();
        if self.pos == start {
            return Err(self.error(QueryErrorKind::NodeNameMissing));
        }
        Ok(NameTest::Exact(self.bytes[start..self.pos].to_vec()))
    }

    fn read_symbol(&mut self) {
        while matches!(self.peek(), Some(b) if is_symbol_char(b)) {
            self.advance();
        }
    }

    /// Parse one `[...]`; the current byte is `[`
    fn parse_predicate(&mut self, qualifier: &mut Qualifier) -> Result<(), QueryError> {
        let open = self.pos;
        self.advance();
        self.skip_spaces();

        if self.peek() == Some(b'@') {
            if qualifier.predicate != AttributePredicate::Any {
                return Err(QueryError::new(QueryErrorKind::UnexpectedToken, open));
            }
            self.advance();
            qualifier.predicate = self.parse_attribute_test()?;
        } else {
            if qualifier.ordinal.is_some() {
                return Err(QueryError::new(QueryErrorKind::UnexpectedToken, open));
            }
            qualifier.ordinal = Some(self.parse_ordinal()?);
        }

        self.skip_spaces();
        if self.peek() != Some(b']') {
            return Err(self.error(QueryErrorKind::PredicateClosure));
        }
        self.advance();
        Ok(())
    }

    fn parse_attribute_test(&mut self) -> Result<AttributePredicate, QueryError> {
        let start = self.pos;
        self.read_symbol();
        let mut name_end = self.pos;

        // Operator prefixes are name characters; split one off before '='
        let mut prefix = None;
        if name_end > start
            && self.peek() == Some(b'=')
            && matches!(self.bytes[name_end - 1], b'!' | b':' | b'?' | b'~' | b'^')
        {
            name_end -= 1;
            prefix = Some(self.bytes[name_end]);
        }
        if name_end == start {
            return Err(QueryError::new(QueryErrorKind::NodeNameMissing, start));
        }
        let name = self.bytes[start..name_end].to_vec();

        self.skip_spaces();
        match self.peek() {
            Some(b']') => return Ok(AttributePredicate::Has(name)),
            Some(b'=') => {}
            Some(b @ (b'!' | b':' | b'?' | b'~' | b'^')) if prefix.is_none() => {
                self.advance();
                if self.peek() != Some(b'=') {
                    return Err(self.error(QueryErrorKind::UnsupportedOperator));
                }
                prefix = Some(b);
            }
            _ => return Err(self.error(QueryErrorKind::UnsupportedOperator)),
        }
        let op = CompareOp::from_prefix(prefix)
            .ok_or_else(|| self.error(QueryErrorKind::UnsupportedOperator))?;
        self.advance();

        self.skip_spaces();
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.error(QueryErrorKind::UnsupportedValueType)),
        };
        let value_start = self.pos + 1;
        let close = memchr(quote, &self.bytes[value_start..self.end])
            .ok_or_else(|| self.error(QueryErrorKind::QuoteMismatch))?;
        let value = self.bytes[value_start..value_start + close].to_vec();
        self.pos = value_start + close + 1;

        Ok(AttributePredicate::Compare { op, name, value })
    }

    fn parse_ordinal(&mut self) -> Result<usize, QueryError> {
        let start = self.pos;
        let close = memchr(b']', &self.bytes[start..self.end])
            .ok_or_else(|| QueryError::new(QueryErrorKind::PredicateClosure, self.end))?;
        let text = std::str::from_utf8(&self.bytes[start..start + close])
            .map_err(|_| self.error(QueryErrorKind::NonNumericOrdinal))?;
        let ordinal = text
            .trim()
            .parse::<usize>()
            .map_err(|_| self.error(QueryErrorKind::NonNumericOrdinal))?;
        self.pos = start + close;
        Ok(ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(s: &str) -> Result<Qualifier, QueryError> {
        parse_step(s, 0, s.len())
    }

    #[test]
    fn test_plain_name() {
        let q = step("item").unwrap();
        assert_eq!(q.name, NameTest::Exact(b"item".to_vec()));
        assert_eq!(q.predicate, AttributePredicate::Any);
        assert_eq!(q.ordinal, None);
        assert_eq!(step("*").unwrap().name, NameTest::Any);
    }

    #[test]
    fn test_predicates() {
        let q = step("a[@href^='http'][2]").unwrap();
        assert_eq!(
            q.predicate,
            AttributePredicate::Compare {
                op: CompareOp::HasWord,
                name: b"href".to_vec(),
                value: b"http".to_vec(),
            }
        );
        assert_eq!(q.ordinal, Some(2));

        let q = step("a[@class:=\"btn\"]").unwrap();
        assert!(matches!(
            q.predicate,
            AttributePredicate::Compare { op: CompareOp::StartsWith, .. }
        ));
        let q = step("a[@id != 'x']").unwrap();
        assert!(matches!(
            q.predicate,
            AttributePredicate::Compare { op: CompareOp::NotEquals, .. }
        ));
        assert_eq!(step("a[@id]").unwrap().predicate, AttributePredicate::Has(b"id".to_vec()));
    }

    #[test]
    fn test_errors() {
        assert_eq!(step("@id").unwrap_err().kind, QueryErrorKind::AttributeSetUnsupported);
        assert_eq!(step("").unwrap_err().kind, QueryErrorKind::NodeNameMissing);
        assert_eq!(step("a[@id='x'").unwrap_err().kind, QueryErrorKind::PredicateClosure);
        assert_eq!(step("a[@id='x]").unwrap_err().kind, QueryErrorKind::QuoteMismatch);
        assert_eq!(step("a[@id<'x']").unwrap_err().kind, QueryErrorKind::UnsupportedOperator);
        assert_eq!(step("a[@id=x]").unwrap_err().kind, QueryErrorKind::UnsupportedValueType);
        assert_eq!(step("a[x]").unwrap_err().kind, QueryErrorKind::NonNumericOrdinal);
        assert_eq!(step("a[1][2]").unwrap_err().kind, QueryErrorKind::UnexpectedToken);
        assert_eq!(step("a[1] b").unwrap_err().kind, QueryErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_error_offset() {
        let err = step("item[@x=1]").unwrap_err();
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_compare_ops() {
        assert!(CompareOp::StartsWith.apply(b"btn-primary", b"btn"));
        assert!(!CompareOp::StartsWith.apply(b"primary-btn", b"btn"));
        assert!(CompareOp::Contains.apply(b"primary-btn", b"btn"));
        assert!(CompareOp::HasWord.apply(b"big btn red", b"btn"));
        assert!(!CompareOp::HasWord.apply(b"btn-primary", b"btn"));
        assert!(CompareOp::EndsWith.apply(b"primary-btn", b"btn"));
    }

    #[test]
    fn test_qualifier_matches() {
        let q = step("a[@title='x & y']").unwrap();
        assert!(q.matches(b"a", b"title=\"x &amp; y\"", false));
        assert!(!q.matches(b"b", b"title=\"x &amp; y\"", false));

        // Absent attribute fails even a negated comparison
        let q = step("a[@id!='x']").unwrap();
        assert!(!q.matches(b"a", b"", false));
        assert!(q.matches(b"a", b"id=\"y\"", false));
    }
}
