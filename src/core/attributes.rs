//! XML Attribute Iteration and Value Decoding
//!
//! Walks a raw attribute block (the text between a tag name and its `>`)
//! and converts attribute values into typed results.

use super::entities::decode_entities;
use super::scanner::Scanner;
use super::span::Span;
use crate::error::SyntaxError;
use std::borrow::Cow;

/// An attribute found in a document buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name
    pub name: &'a [u8],
    /// Attribute value, still entity-escaped
    pub raw_value: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// Get the name as a string
    pub fn name_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Value with entities decoded
    pub fn value(&self) -> Cow<'a, [u8]> {
        decode_entities(self.raw_value)
    }

    /// Decoded value as a string
    pub fn value_str(&self) -> Option<Cow<'a, str>> {
        match self.value() {
            Cow::Borrowed(b) => std::str::from_utf8(b).ok().map(Cow::Borrowed),
            Cow::Owned(v) => String::from_utf8(v).ok().map(Cow::Owned),
        }
    }
}

/// Iterator over the attributes of one raw attribute block
pub struct AttributeIter<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    fault_tolerant: bool,
    error: Option<SyntaxError>,
}

impl<'a> AttributeIter<'a> {
    /// Iterate the attributes in `block`, a span of `input`
    pub fn new(input: &'a [u8], block: Span, fault_tolerant: bool) -> Self {
        // Bound the scan to the block so a broken value cannot run past the tag
        let bounded = &input[..block.end().min(input.len())];
        AttributeIter {
            input,
            scanner: Scanner::at(bounded, block.start()),
            fault_tolerant,
            error: None,
        }
    }

    /// The error that stopped a strict iteration, if any
    pub fn error(&self) -> Option<SyntaxError> {
        self.error
    }

    /// Next attribute as spans, for callers that keep their own cursor
    pub fn next_spans(&mut self) -> Option<(Span, Span)> {
        loop {
            match self.scanner.next_attribute() {
                Ok(Some(raw)) => return Some((raw.name, raw.value)),
                Ok(None) => return None,
                Err(e) if self.fault_tolerant => {
                    // Skip the broken fragment and keep going
                    if e.offset >= self.scanner.input().len() {
                        return None;
                    }
                    let resume = if e.offset > self.scanner.position() {
                        e.offset
                    } else {
                        e.offset + 1
                    };
                    self.scanner.set_position(resume);
                }
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.scanner.position()
    }
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (name, value) = self.next_spans()?;
        Some(Attribute {
            name: name.slice(self.input),
            raw_value: value.slice(self.input),
        })
    }
}

/// Find an attribute's raw value by name (case-sensitive)
pub fn find_attribute<'a>(
    input: &'a [u8],
    block: Span,
    name: &[u8],
    fault_tolerant: bool,
) -> Result<Option<&'a [u8]>, SyntaxError> {
    let mut iter = AttributeIter::new(input, block, fault_tolerant);
    let found = iter.by_ref().find(|attr| attr.name == name).map(|attr| attr.raw_value);
    match (found, iter.error()) {
        (Some(value), _) => Ok(Some(value)),
        (None, Some(e)) => Err(e),
        (None, None) => Ok(None),
    }
}

/// Parse a boolean: true/yes/on/1 or false/no/off/0, any case
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    const TRUE: [&str; 4] = ["true", "yes", "on", "1"];
    const FALSE: [&str; 4] = ["false", "no", "off", "0"];
    if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Parse a byte size such as `512`, `2k`, `1.5m` or `4GB` (powers of 1024)
pub fn parse_file_size(value: &str) -> Option<u64> {
    let (number, suffix) = split_number(value)?;
    let multiplier: u64 = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1 << 10,
        "m" | "mb" => 1 << 20,
        "g" | "gb" => 1 << 30,
        "t" | "tb" => 1 << 40,
        _ => return None,
    };
    scale(number, multiplier)
}

/// Parse a time span into milliseconds: `250`, `250ms`, `30s`, `5m`,
/// `2h`, `1d`, `1w`
pub fn parse_time_span(value: &str) -> Option<u64> {
    let (number, suffix) = split_number(value)?;
    let multiplier: u64 = match suffix.to_ascii_lowercase().as_str() {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return None,
    };
    scale(number, multiplier)
}

/// Split `value` into its leading unsigned decimal number and a trimmed suffix
fn split_number(value: &str) -> Option<(&str, &str)> {
    let value = value.trim();
    let end = value
        .bytes()
        .position(|b| !(b.is_ascii_digit() || b == b'.'))
        .unwrap_or(value.len());
    if end == 0 {
        return None;
    }
    Some((&value[..end], value[end..].trim()))
}

fn scale(number: &str, multiplier: u64) -> Option<u64> {
    if number.contains('.') {
        let n: f64 = number.parse().ok()?;
        let scaled = n * multiplier as f64;
        (scaled.is_finite() && scaled < u64::MAX as f64).then_some(scaled as u64)
    } else {
        number.parse::<u64>().ok()?.checked_mul(multiplier)
    }
}
