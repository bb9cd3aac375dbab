//! Query Compiler
//!
//! Compiles a path such as `/html/body//a[@href^='http']` into a
//! [`CompiledQuery`]: the ancestor steps, the final step, and the flags the
//! navigator needs to anchor and walk the query.

use super::parser::{parse_step, Qualifier};
use crate::error::{QueryError, QueryErrorKind};

/// Compiled query, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Qualifiers for levels 1..=steps.len() below the anchor
    pub steps: Vec<Qualifier>,
    /// Qualifier for the selected nodes
    pub last: Qualifier,
    /// No leading `/`
    pub relative: bool,
    /// `//` before the final step
    pub include_descendants: bool,
    /// Leading `//` before the first of several steps: the chain of steps
    /// may start at any depth below the anchor
    pub floating: bool,
    /// Leading `..` segments not cancelled by a step
    pub ascend_count: usize,
}

impl CompiledQuery {
    /// Relative level at which the final qualifier applies
    #[inline]
    pub fn nominal_level(&self) -> usize {
        self.steps.len() + 1
    }
}

/// Compile a query string
pub fn compile(query: &str) -> Result<CompiledQuery, QueryError> {
    let bytes = query.as_bytes();
    let (start, end) = trim_range(bytes, 0, bytes.len());
    let relative = bytes.get(start) != Some(&b'/');
    let body = if relative { start } else { start + 1 };

    let segments = split_segments(bytes, body, end)?;
    let Some((&(last_start, last_end), prefix)) = segments.split_last() else {
        return Err(QueryError::new(QueryErrorKind::NodeNameMissing, end));
    };

    // An empty segment right before the last one is the `//`
    let (prefix, include_descendants) = match prefix.split_last() {
        Some((&(s, e), rest)) if s == e => (rest, true),
        _ => (prefix, false),
    };

    let mut steps = Vec::with_capacity(prefix.len());
    let mut ascend_count = 0;
    let mut floating = false;
    for &(s, e) in prefix {
        match &bytes[s..e] {
            b"" if steps.is_empty() && !floating => floating = true,
            b"" => return Err(QueryError::new(QueryErrorKind::DescendantNotLast, s)),
            b"." => {}
            b".." => {
                if steps.pop().is_none() {
                    if !relative || floating {
                        return Err(QueryError::new(QueryErrorKind::UnexpectedToken, s));
                    }
                    ascend_count += 1;
                }
            }
            _ => steps.push(parse_step(query, s, e)?),
        }
    }

    let last = match &bytes[last_start..last_end] {
        b"" | b"." | b".." => {
            return Err(QueryError::new(QueryErrorKind::NodeNameMissing, last_start));
        }
        _ => parse_step(query, last_start, last_end)?,
    };

    // `//` directly before the final step is the plain descendant search
    let include_descendants = include_descendants || (floating && steps.is_empty());
    let floating = floating && !steps.is_empty();

    Ok(CompiledQuery {
        steps,
        last,
        relative,
        include_descendants,
        floating,
        ascend_count,
    })
}

/// Split `bytes[start..end]` at every `/` outside predicates and quotes.
///
/// Returns trimmed `(start, end)` ranges; `//` yields an empty range.
fn split_segments(bytes: &[u8], start: usize, end: usize) -> Result<Vec<(usize, usize)>, QueryError> {
    let mut segments = Vec::new();
    let mut segment_start = start;
    let mut bracket: Option<usize> = None;
    let mut quote: Option<(u8, usize)> = None;

    for pos in start..end {
        let b = bytes[pos];
        if let Some((q, _)) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' if bracket.is_some() => quote = Some((b, pos)),
            b'[' if bracket.is_none() => bracket = Some(pos),
            b'[' => return Err(QueryError::new(QueryErrorKind::UnexpectedToken, pos)),
            b']' if bracket.is_some() => bracket = None,
            b']' => return Err(QueryError::new(QueryErrorKind::UnexpectedToken, pos)),
            b'/' if bracket.is_none() => {
                segments.push(trim_range(bytes, segment_start, pos));
                segment_start = pos + 1;
            }
            _ => {}
        }
    }

    if let Some((_, at)) = quote {
        return Err(QueryError::new(QueryErrorKind::QuoteMismatch, at));
    }
    if bracket.is_some() {
        return Err(QueryError::new(QueryErrorKind::PredicateClosure, end));
    }
    segments.push(trim_range(bytes, segment_start, end));
    Ok(segments)
}

fn trim_range(bytes: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && bytes[start] <= 0x20 {
        start += 1;
    }
    while end > start && bytes[end - 1] <= 0x20 {
        end -= 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::parser::NameTest;

    fn name(q: &Qualifier) -> &[u8] {
        match &q.name {
            NameTest::Exact(n) => n.as_slice(),
            NameTest::Any => b"*",
        }
    }

    #[test]
    fn test_absolute_path() {
        let q = compile("/html/body/a").unwrap();
        assert!(!q.relative);
        assert!(!q.include_descendants);
        assert_eq!(q.steps.iter().map(name).collect::<Vec<_>>(), vec![&b"html"[..], &b"body"[..]]);
        assert_eq!(name(&q.last), b"a");
        assert_eq!(q.nominal_level(), 3);
    }

    #[test]
    fn test_descendants_before_last() {
        let q = compile("/html/body//a[@href^='http']").unwrap();
        assert!(q.include_descendants);
        assert_eq!(q.steps.len(), 2);

        let q = compile("//item").unwrap();
        assert!(q.include_descendants);
        assert!(q.steps.is_empty());
        assert!(!q.relative);

        let q = compile(".//item").unwrap();
        assert!(q.include_descendants);
        assert!(q.relative);
        assert!(!q.floating);

        let q = compile(".//./item").unwrap();
        assert!(q.include_descendants);
        assert!(!q.floating);
    }

    #[test]
    fn test_leading_descendants() {
        let q = compile("//div/p/a").unwrap();
        assert!(q.floating);
        assert!(!q.relative);
        assert!(!q.include_descendants);
        assert_eq!(q.steps.iter().map(name).collect::<Vec<_>>(), vec![&b"div"[..], &b"p"[..]]);

        let q = compile(".//div//a").unwrap();
        assert!(q.floating);
        assert!(q.relative);
        assert!(q.include_descendants);
        assert_eq!(q.steps.len(), 1);

        let q = compile("..//div/a").unwrap();
        assert!(q.floating);
        assert_eq!(q.ascend_count, 1);
    }

    #[test]
    fn test_relative_and_ascend() {
        let q = compile("../../x").unwrap();
        assert!(q.relative);
        assert_eq!(q.ascend_count, 2);

        let q = compile("a/../b").unwrap();
        assert_eq!(q.ascend_count, 0);
        assert!(q.steps.is_empty());
        assert_eq!(name(&q.last), b"b");

        let q = compile("./a/./b").unwrap();
        assert_eq!(q.steps.len(), 1);
    }

    #[test]
    fn test_slash_inside_predicate() {
        let q = compile("a[@href:='http://x/y']").unwrap();
        assert!(q.steps.is_empty());
    }

    #[test]
    fn test_compile_errors() {
        let kind = |s: &str| compile(s).unwrap_err().kind;
        assert_eq!(kind("/a//b/c"), QueryErrorKind::DescendantNotLast);
        assert_eq!(kind("//a//b/c"), QueryErrorKind::DescendantNotLast);
        assert_eq!(kind(".//../a"), QueryErrorKind::UnexpectedToken);
        assert_eq!(kind("/a/@id"), QueryErrorKind::AttributeSetUnsupported);
        assert_eq!(kind("/a/"), QueryErrorKind::NodeNameMissing);
        assert_eq!(kind("a/.."), QueryErrorKind::NodeNameMissing);
        assert_eq!(kind(""), QueryErrorKind::NodeNameMissing);
        assert_eq!(kind("/../a"), QueryErrorKind::UnexpectedToken);
        assert_eq!(kind("a[@x='1]"), QueryErrorKind::QuoteMismatch);
        assert_eq!(kind("a[1"), QueryErrorKind::PredicateClosure);
    }

    #[test]
    fn test_descendant_offset() {
        let err = compile("/a//b/c").unwrap_err();
        assert_eq!(err.offset, 3);
    }
}
