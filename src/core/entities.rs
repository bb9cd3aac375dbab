//! XML Entity Decoding and Text Extraction
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! [`decode_entities`] uses Cow for zero-copy when no entities are present.
//! [`decode_entities_to_text`] additionally collapses whitespace and can
//! strip markup, which is what node text accessors use.

use super::closure::match_node_close;
use super::tokenizer::{read_markup, TokenKind};
use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// Longest entity body we look at before giving up on finding ';'
const MAX_ENTITY_LEN: usize = 12;

/// Options for [`decode_entities_to_text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    /// Emitted in place of each whitespace run
    pub separator: u8,
    /// Treat markup as a separator; `<br>` and `<p>` become "\r\n"
    pub trim_xml_code: bool,
    /// Skip nested elements entirely (implies `trim_xml_code`)
    pub trim_subnodes: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            separator: b' ',
            trim_xml_code: false,
            trim_subnodes: false,
        }
    }
}

impl TextOptions {
    #[must_use]
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn trim_xml_code(mut self, yes: bool) -> Self {
        self.trim_xml_code = yes;
        self
    }

    #[must_use]
    pub fn trim_subnodes(mut self, yes: bool) -> Self {
        self.trim_subnodes = yes;
        self
    }
}

/// Decode entity references only
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_entities(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;
        pos += push_entity(input, pos, &mut result);
    }
    result.extend_from_slice(&input[pos..]);
    Cow::Owned(result)
}

/// Decode the reference at `input[pos] == '&'` into `out`.
///
/// Unknown or malformed references are copied literally (just the '&').
/// Returns the number of input bytes consumed.
fn push_entity(input: &[u8], pos: usize, out: &mut Vec<u8>) -> usize {
    let window = &input[pos + 1..(pos + 1 + MAX_ENTITY_LEN).min(input.len())];
    if let Some(semi) = memchr(b';', window) {
        let mut buf = [0u8; 4];
        if let Some(decoded) = decode_entity(&window[..semi], &mut buf) {
            out.extend_from_slice(decoded);
            return semi + 2;
        }
    }
    out.push(b'&');
    1
}

/// Decode a single entity body (without & and ;)
fn decode_entity<'b>(entity: &[u8], buf: &'b mut [u8; 4]) -> Option<&'b [u8]> {
    let c = match entity {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"quot" => '"',
        b"apos" => '\'',
        [b'#', b'x' | b'X', hex @ ..] if !hex.is_empty() => {
            let hex = std::str::from_utf8(hex).ok()?;
            char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
        }
        [b'#', dec @ ..] if !dec.is_empty() => {
            let dec = std::str::from_utf8(dec).ok()?;
            char::from_u32(dec.parse::<u32>().ok()?)?
        }
        _ => return None,
    };
    Some(c.encode_utf8(buf).as_bytes())
}

/// Decode a raw span into display text.
///
/// Whitespace runs (bytes <= 0x20) collapse into one separator, never
/// emitted right after another separator, at the start, or at the end.
pub fn decode_entities_to_text(raw: &[u8], options: &TextOptions) -> String {
    let mut text = TextBuilder::new(options.separator, raw.len());
    let markup = options.trim_xml_code || options.trim_subnodes;
    let mut pos = 0;

    while pos < raw.len() {
        let b = raw[pos];
        if b <= 0x20 {
            text.separator();
            pos += 1;
        } else if b == b'&' {
            pos += push_entity(raw, pos, &mut text.out);
            text.at_separator = false;
        } else if b == b'<' && markup {
            pos = skip_markup(raw, pos, options, &mut text);
        } else {
            let stop = memchr2(b'&', b'<', &raw[pos..]).map_or(raw.len(), |i| pos + i);
            let stop = if stop == pos { pos + 1 } else { stop };
            for &c in &raw[pos..stop] {
                if c <= 0x20 {
                    text.separator();
                } else {
                    text.push(c);
                }
            }
            pos = stop;
        }
    }

    text.finish()
}

/// Consume the markup at `raw[pos] == '<'`, emitting its separator
fn skip_markup(raw: &[u8], pos: usize, options: &TextOptions, text: &mut TextBuilder) -> usize {
    let token = match read_markup(raw, pos, true) {
        Ok(Some(token)) => token,
        // A '<' that starts no markup is content
        _ => {
            text.push(b'<');
            return pos + 1;
        }
    };

    match token.kind {
        TokenKind::CData => {
            for &c in &raw[token.start + 9..token.end.saturating_sub(3).max(token.start + 9)] {
                if c <= 0x20 {
                    text.separator();
                } else {
                    text.push(c);
                }
            }
            token.end
        }
        TokenKind::OpenTag { compact } => {
            let name = token.name.slice(raw);
            if name.eq_ignore_ascii_case(b"br") || name.eq_ignore_ascii_case(b"p") {
                text.line_break();
            } else {
                text.separator();
            }
            if options.trim_subnodes && !compact {
                if let Ok(closure) = match_node_close(raw, token.end, name, true) {
                    return closure.end;
                }
            }
            token.end
        }
        TokenKind::CloseTag => {
            text.separator();
            token.end
        }
        _ => token.end,
    }
}

/// Output buffer tracking separator state
struct TextBuilder {
    out: Vec<u8>,
    separator: u8,
    /// Last thing emitted was a separator (or nothing yet)
    at_separator: bool,
}

impl TextBuilder {
    fn new(separator: u8, capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            separator,
            at_separator: true,
        }
    }

    #[inline]
    fn push(&mut self, b: u8) {
        self.out.push(b);
        self.at_separator = false;
    }

    #[inline]
    fn separator(&mut self) {
        if !self.at_separator {
            self.out.push(self.separator);
            self.at_separator = true;
        }
    }

    fn line_break(&mut self) {
        if self.at_separator && self.out.last() == Some(&self.separator) {
            self.out.pop();
        }
        if !self.out.is_empty() && !self.out.ends_with(b"\r\n") {
            self.out.extend_from_slice(b"\r\n");
        }
        self.at_separator = true;
    }

    fn finish(mut self) -> String {
        if self.at_separator {
            if self.out.ends_with(b"\r\n") {
                self.out.truncate(self.out.len() - 2);
            } else if self.out.last() == Some(&self.separator) {
                self.out.pop();
            }
        }
        match String::from_utf8(self.out) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Encode text for XML output (escape special characters)
pub fn escape_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\'')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape tag-soup text for XHTML output.
///
/// `&` is left alone so references already present in the HTML survive.
pub fn escape_markup(input: &[u8], out: &mut Vec<u8>) {
    for &b in input {
        match b {
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            b'\'' => out.extend_from_slice(b"&apos;"),
            _ => out.push(b),
        }
    }
}
