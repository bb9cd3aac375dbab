//! Tag-soup rewrite
//!
//! First HTML pass: turns a tag-soup byte stream into XHTML-shaped markup
//! one tag at a time. Nesting is not checked here; that is the job of
//! [`force_wellformed`](super::wellformed::force_wellformed).

use crate::core::entities::escape_markup;
use crate::core::scanner::{is_space, is_symbol_char};
use memchr::{memchr, memmem};
use std::borrow::Cow;

/// Elements that never have content
const VOID_ELEMENTS: [&[u8]; 10] = [
    b"base", b"meta", b"link", b"area", b"img", b"hr", b"br", b"rel", b"input", b"button",
];

/// Elements whose body is copied verbatim inside CDATA
const RAW_TEXT_ELEMENTS: [&[u8]; 2] = [b"script", b"style"];

#[inline]
pub fn is_void_element(name: &[u8]) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

#[inline]
fn is_raw_text_element(name: &[u8]) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Drop control bytes other than TAB, CR and LF
pub fn strip_controls(input: &[u8]) -> Cow<'_, [u8]> {
    let is_control = |b: u8| (b < 0x20 && !matches!(b, b'\t' | b'\r' | b'\n')) || b == 0x7F;
    if !input.iter().any(|&b| is_control(b)) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.iter().copied().filter(|&b| !is_control(b)).collect())
}

/// One parsed open tag
struct OpenTag {
    name: Vec<u8>,
    attributes: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    self_closing: bool,
    end: usize,
}

enum TagScan {
    Tag(OpenTag),
    /// A `<` inside the tag: drop what was read and restart there
    Restart(usize),
    /// Input ended inside the tag
    Unterminated,
}

/// Rewrite tag-soup HTML into XHTML-shaped markup
pub fn rewrite(input: &[u8]) -> Vec<u8> {
    let input = strip_controls(input);
    let input: &[u8] = &input;
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    let mut pos = 0;

    while pos < input.len() {
        let Some(lt) = memchr(b'<', &input[pos..]).map(|i| pos + i) else {
            escape_markup(&input[pos..], &mut out);
            break;
        };
        escape_markup(&input[pos..lt], &mut out);
        pos = lt;
        let rest = &input[pos..];

        if rest.starts_with(b"<!--") {
            let end = memmem::find(&rest[4..], b"-->").map_or(input.len(), |i| pos + 4 + i + 3);
            out.extend_from_slice(&input[pos..end]);
            pos = end;
        } else if rest.starts_with(b"<![CDATA[") {
            let end = memmem::find(&rest[9..], b"]]>").map_or(input.len(), |i| pos + 9 + i + 3);
            out.extend_from_slice(&input[pos..end]);
            pos = end;
        } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            let end = memchr(b'>', rest).map_or(input.len(), |i| pos + i + 1);
            out.extend_from_slice(&input[pos..end]);
            pos = end;
        } else if rest.starts_with(b"</") {
            pos = rewrite_close_tag(input, pos, &mut out);
        } else if rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
            match scan_open_tag(input, pos) {
                TagScan::Tag(tag) => {
                    emit_open_tag(&tag, &mut out);
                    pos = tag.end;
                    if !tag.self_closing && is_raw_text_element(&tag.name) {
                        pos = rewrite_raw_text(input, pos, &tag.name, &mut out);
                    }
                }
                TagScan::Restart(at) => pos = at,
                TagScan::Unterminated => pos = input.len(),
            }
        } else {
            out.extend_from_slice(b"&lt;");
            pos += 1;
        }
    }
    out
}

/// Rewrite the close tag at `pos`; void closers are dropped
fn rewrite_close_tag(input: &[u8], pos: usize, out: &mut Vec<u8>) -> usize {
    let name_start = pos + 2;
    let mut name_end = name_start;
    while name_end < input.len() && is_symbol_char(input[name_end]) {
        name_end += 1;
    }
    if name_end == name_start {
        out.extend_from_slice(b"&lt;");
        return pos + 1;
    }

    // Anything up to '>' is dropped; a '<' first means the tag was cut short
    let end = match input[name_end..].iter().position(|&b| b == b'>' || b == b'<') {
        Some(i) if input[name_end + i] == b'>' => name_end + i + 1,
        Some(i) => name_end + i,
        None => input.len(),
    };

    let name = &input[name_start..name_end];
    if !is_void_element(name) {
        out.extend_from_slice(b"</");
        out.extend(name.iter().map(u8::to_ascii_lowercase));
        out.push(b'>');
    }
    end
}

fn scan_open_tag(input: &[u8], pos: usize) -> TagScan {
    let mut p = pos + 1;
    while p < input.len() && is_symbol_char(input[p]) {
        p += 1;
    }
    let name = input[pos + 1..p].to_ascii_lowercase();
    let mut attributes = Vec::new();

    loop {
        while p < input.len() && is_space(input[p]) {
            p += 1;
        }
        match input.get(p) {
            None => return TagScan::Unterminated,
            Some(b'>') => {
                return TagScan::Tag(OpenTag {
                    name,
                    attributes,
                    self_closing: false,
                    end: p + 1,
                });
            }
            Some(b'/') if input.get(p + 1) == Some(&b'>') => {
                return TagScan::Tag(OpenTag {
                    name,
                    attributes,
                    self_closing: true,
                    end: p + 2,
                });
            }
            Some(b'<') => return TagScan::Restart(p),
            Some(&b) if !is_symbol_char(b) => p += 1,
            Some(_) => {
                let name_start = p;
                while p < input.len() && is_symbol_char(input[p]) {
                    p += 1;
                }
                let attr_name = input[name_start..p].to_ascii_lowercase();

                let mut q = p;
                while q < input.len() && is_space(input[q]) {
                    q += 1;
                }
                if input.get(q) != Some(&b'=') {
                    attributes.push((attr_name, None));
                    continue;
                }
                q += 1;
                while q < input.len() && is_space(input[q]) {
                    q += 1;
                }

                let value = match input.get(q) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let Some(close) = memchr(quote, &input[q + 1..]) else {
                            return TagScan::Unterminated;
                        };
                        p = q + 1 + close + 1;
                        &input[q + 1..q + 1 + close]
                    }
                    _ => {
                        let start = q;
                        while q < input.len()
                            && !is_space(input[q])
                            && !matches!(input[q], b'<' | b'>' | b'"' | b'\'')
                        {
                            q += 1;
                        }
                        p = q;
                        &input[start..q]
                    }
                };
                attributes.push((attr_name, Some(value.to_vec())));
            }
        }
    }
}

fn emit_open_tag(tag: &OpenTag, out: &mut Vec<u8>) {
    out.push(b'<');
    out.extend_from_slice(&tag.name);
    for (name, value) in &tag.attributes {
        out.push(b' ');
        out.extend_from_slice(name);
        out.extend_from_slice(b"=\"");
        if let Some(value) = value {
            for &b in value {
                match b {
                    b'"' => out.extend_from_slice(b"&quot;"),
                    b'<' => out.extend_from_slice(b"&lt;"),
                    b'>' => out.extend_from_slice(b"&gt;"),
                    _ => out.push(b),
                }
            }
        }
        out.push(b'"');
    }
    if tag.self_closing || is_void_element(&tag.name) {
        out.extend_from_slice(b" />");
    } else {
        out.push(b'>');
    }
}

/// Wrap the body of a script/style element in CDATA and emit its closer.
///
/// `pos` is just past the open tag; returns the position after the
/// original close tag (or end of input when it is missing).
fn rewrite_raw_text(input: &[u8], pos: usize, name: &[u8], out: &mut Vec<u8>) -> usize {
    let (body_end, end) = match find_raw_text_close(input, pos, name) {
        Some((start, end)) => (start, end),
        None => (input.len(), input.len()),
    };

    out.extend_from_slice(b"<![CDATA[");
    let body = &input[pos..body_end];
    let mut from = 0;
    for i in memmem::find_iter(body, b"]]>") {
        out.extend_from_slice(&body[from..i]);
        out.extend_from_slice(b"]]]]><![CDATA[>");
        from = i + 3;
    }
    out.extend_from_slice(&body[from..]);
    out.extend_from_slice(b"]]>");

    out.extend_from_slice(b"</");
    out.extend_from_slice(name);
    out.push(b'>');
    end
}

/// `(start, end)` of `</name ...>` at or after `pos`, case-insensitive
fn find_raw_text_close(input: &[u8], pos: usize, name: &[u8]) -> Option<(usize, usize)> {
    let mut from = pos;
    while let Some(i) = memmem::find(&input[from..], b"</") {
        let start = from + i;
        let name_end = start + 2 + name.len();
        let boundary = input.get(name_end).map_or(true, |&b| !is_symbol_char(b));
        if name_end <= input.len() && input[start + 2..name_end].eq_ignore_ascii_case(name) && boundary {
            let end = memchr(b'>', &input[name_end..]).map_or(input.len(), |j| name_end + j + 1);
            return Some((start, end));
        }
        from = start + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rw(s: &str) -> String {
        String::from_utf8(rewrite(s.as_bytes())).unwrap()
    }

    #[test]
    fn test_void_elements() {
        assert_eq!(rw("<BR>"), "<br />");
        assert_eq!(rw("a<br>b</br>c"), "a<br />bc");
        assert_eq!(rw("<IMG SRC=x.png>"), "<img src=\"x.png\" />");
        assert_eq!(rw("<Input disabled>"), "<input disabled=\"\" />");
    }

    #[test]
    fn test_script_cdata() {
        assert_eq!(
            rw("<script>if(a<b){}</script>"),
            "<script><![CDATA[if(a<b){}]]></script>"
        );
        assert_eq!(
            rw("<STYLE>a>b{}</Style >x"),
            "<style><![CDATA[a>b{}]]></style>x"
        );
        assert_eq!(
            rw("<script>x=']]>'</script>"),
            "<script><![CDATA[x=']]]]><![CDATA[>']]></script>"
        );
        assert_eq!(rw("<script>open"), "<script><![CDATA[open]]></script>");
    }

    #[test]
    fn test_attributes() {
        assert_eq!(
            rw("<A HREF='/x?a=1&b=2' Title=\"a<b\" data-x = y>t</A>"),
            "<a href=\"/x?a=1&b=2\" title=\"a&lt;b\" data-x=\"y\">t</a>"
        );
        assert_eq!(rw("<p class=\"it's\">"), "<p class=\"it's\">");
    }

    #[test]
    fn test_text_escaping_and_specials() {
        assert_eq!(rw("a < b > \"c\""), "a &lt; b &gt; &quot;c&quot;");
        assert_eq!(rw("<!-- <b> -->x"), "<!-- <b> -->x");
        assert_eq!(rw("<!DOCTYPE html><?php x ?>"), "<!DOCTYPE html><?php x ?>");
        assert_eq!(rw("a\u{1}b\tc"), "ab\tc");
    }

    #[test]
    fn test_restart_on_stray_lt() {
        assert_eq!(rw("<div class=\"a\" <p>x</p>"), "<p>x</p>");
        assert_eq!(rw("</ x"), "&lt;/ x");
    }

    #[test]
    fn test_unterminated_tag_dropped() {
        assert_eq!(rw("ok<a href=\"x"), "ok");
    }
}
