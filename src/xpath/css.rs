//! CSS path translation
//!
//! Rewrites a small CSS selector subset into the query language:
//!
//! | CSS          | Query                  |
//! |--------------|------------------------|
//! | `tag#id`     | `tag[@id='id']`        |
//! | `tag.class`  | `tag[@class:='class']` |
//! | `tag~class`  | `tag[@class^='class']` |
//! | `tag[...]`   | `tag[...]`             |
//! | `a > b`      | `.//a/b`               |
//! | `a b`        | `.//a//b`              |
//!
//! `.class` is a prefix match on the whole attribute value, not a class
//! token test. Every selector is searched below the cursor (`.//`), so its
//! first segment may match at any depth. A descendant combinator is only
//! supported before the final segment.

use crate::error::{SyntaxError, SyntaxErrorKind};

/// Translate a CSS path into a query string
pub fn css_to_xpath(css: &str) -> Result<String, SyntaxError> {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len() + 16);
    let mut pos = 0;
    // Current segment has a tag name (or `*`) already
    let mut named = false;
    // Offset of the descendant combinator seen so far
    let mut descendant: Option<usize> = None;

    out.push_str(".//");

    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' | b'>' => {
                let at = pos;
                let mut child = false;
                while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'>') {
                    if bytes[pos] == b'>' {
                        if child {
                            return Err(unsupported(pos));
                        }
                        child = true;
                    }
                    pos += 1;
                }
                if pos == bytes.len() {
                    if child {
                        return Err(unsupported(pos - 1));
                    }
                    break;
                }
                if !named {
                    return Err(unsupported(pos));
                }
                if let Some(earlier) = descendant {
                    return Err(unsupported(earlier));
                }
                if child {
                    out.push('/');
                } else {
                    out.push_str("//");
                    descendant = Some(at);
                }
                named = false;
            }
            b'#' | b'.' | b'~' => {
                let (ident, end) = read_ident(css, pos + 1);
                if ident.is_empty() {
                    return Err(unsupported(pos));
                }
                if !named {
                    out.push('*');
                    named = true;
                }
                let (attr, op) = match b {
                    b'#' => ("id", "="),
                    b'.' => ("class", ":="),
                    _ => ("class", "^="),
                };
                out.push_str(&format!("[@{attr}{op}'{ident}']"));
                pos = end;
            }
            b'[' => {
                let end = bracket_end(bytes, pos).ok_or_else(|| unsupported(pos))?;
                if !named {
                    out.push('*');
                    named = true;
                }
                out.push_str(&css[pos..end]);
                pos = end;
            }
            _ if is_ident_byte(b) || b == b'*' => {
                if named {
                    return Err(unsupported(pos));
                }
                let (ident, end) = if b == b'*' {
                    ("*", pos + 1)
                } else {
                    read_ident(css, pos)
                };
                out.push_str(ident);
                named = true;
                pos = end;
            }
            // `+ , :` and everything else
            _ => return Err(unsupported(pos)),
        }
    }

    tracing::trace!("css '{}' -> '{}'", css, out);
    Ok(out)
}

#[inline]
fn unsupported(pos: usize) -> SyntaxError {
    SyntaxError::new(SyntaxErrorKind::UnsupportedCssOperator, pos)
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn read_ident(css: &str, start: usize) -> (&str, usize) {
    let bytes = css.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    (&css[start..end], end)
}

/// Position just past the `]` closing the bracket at `start`
fn bracket_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == b']' => return Some(i + 1),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        assert_eq!(css_to_xpath("div").unwrap(), ".//div");
        assert_eq!(css_to_xpath("a#top").unwrap(), ".//a[@id='top']");
        assert_eq!(css_to_xpath("a.btn").unwrap(), ".//a[@class:='btn']");
        assert_eq!(css_to_xpath("a~btn").unwrap(), ".//a[@class^='btn']");
        assert_eq!(css_to_xpath("#main").unwrap(), ".//*[@id='main']");
    }

    #[test]
    fn test_combinators() {
        assert_eq!(css_to_xpath("div > p").unwrap(), ".//div/p");
        assert_eq!(css_to_xpath("div>p").unwrap(), ".//div/p");
        assert_eq!(css_to_xpath("div.note  a").unwrap(), ".//div[@class:='note']//a");
        assert_eq!(css_to_xpath("body > div.note a").unwrap(), ".//body/div[@class:='note']//a");
    }

    #[test]
    fn test_descendant_only_before_last() {
        let err = css_to_xpath("body div a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnsupportedCssOperator);
        assert_eq!(err.offset, 4);
        assert_eq!(css_to_xpath("div a > b").unwrap_err().offset, 3);
    }

    #[test]
    fn test_translations_compile() {
        for css in ["div", "#main", "div > p > a", "ul.menu li", "body > div a[@href]"] {
            let query = css_to_xpath(css).unwrap();
            assert!(crate::xpath::compile(&query).is_ok(), "{css} -> {query}");
        }
    }

    #[test]
    fn test_bracket_passthrough() {
        assert_eq!(css_to_xpath("a[@href^='http']").unwrap(), ".//a[@href^='http']");
        assert_eq!(css_to_xpath("a[@title='x]y']").unwrap(), ".//a[@title='x]y']");
    }

    #[test]
    fn test_unsupported() {
        let err = css_to_xpath("a + b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnsupportedCssOperator);
        assert_eq!(err.offset, 2);
        assert!(css_to_xpath("a:hover").is_err());
        assert!(css_to_xpath("a, b").is_err());
        assert!(css_to_xpath("a > > b").is_err());
        assert!(css_to_xpath("a ~ b").is_err());
    }
}
