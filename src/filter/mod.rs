//! Tag filters
//!
//! A filter decides whether the navigator may enter a candidate element.
//! It sees the raw tag name, the raw attribute block and the candidate's
//! 1-based depth below the document.

use crate::xpath::eval::XPathFilter;
use std::sync::Arc;

/// Capability to accept or reject a candidate element
pub trait TagFilter: Send + Sync {
    fn test(&self, name: &[u8], attributes: &[u8], level: usize) -> bool;
}

impl<F> TagFilter for F
where
    F: Fn(&[u8], &[u8], usize) -> bool + Send + Sync,
{
    #[inline]
    fn test(&self, name: &[u8], attributes: &[u8], level: usize) -> bool {
        self(name, attributes, level)
    }
}

/// The filter currently gating navigation
#[derive(Clone, Default)]
pub enum ActiveFilter {
    /// Every element is accepted
    #[default]
    None,
    /// A caller-supplied filter
    User(Arc<dyn TagFilter>),
    /// A compiled query together with its traversal state
    XPath(XPathFilter),
}

impl ActiveFilter {
    /// Build the filter for a default user filter, if any
    pub fn from_user(filter: Option<&Arc<dyn TagFilter>>) -> Self {
        match filter {
            Some(f) => ActiveFilter::User(Arc::clone(f)),
            None => ActiveFilter::None,
        }
    }

    #[inline]
    pub fn test(&mut self, name: &[u8], attributes: &[u8], level: usize) -> bool {
        match self {
            ActiveFilter::None => true,
            ActiveFilter::User(f) => f.test(name, attributes, level),
            ActiveFilter::XPath(x) => x.test(name, attributes, level),
        }
    }

    #[inline]
    pub fn is_xpath(&self) -> bool {
        matches!(self, ActiveFilter::XPath(_))
    }

    #[inline]
    pub fn xpath(&self) -> Option<&XPathFilter> {
        match self {
            ActiveFilter::XPath(x) => Some(x),
            _ => None,
        }
    }

    #[inline]
    pub fn xpath_mut(&mut self) -> Option<&mut XPathFilter> {
        match self {
            ActiveFilter::XPath(x) => Some(x),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ActiveFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveFilter::None => f.write_str("None"),
            ActiveFilter::User(_) => f.write_str("User(..)"),
            ActiveFilter::XPath(x) => f.debug_tuple("XPath").field(x).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_filter() {
        let filter = |name: &[u8], _: &[u8], level: usize| name == b"item" && level < 3;
        assert!(filter.test(b"item", b"", 2));
        assert!(!filter.test(b"item", b"", 3));
        assert!(!filter.test(b"other", b"", 1));
    }

    #[test]
    fn test_active_filter_dispatch() {
        let mut none = ActiveFilter::None;
        assert!(none.test(b"x", b"", 1));

        let user: Arc<dyn TagFilter> = Arc::new(|_: &[u8], attrs: &[u8], _: usize| !attrs.is_empty());
        let mut active = ActiveFilter::from_user(Some(&user));
        assert!(active.test(b"x", b"id=\"1\"", 1));
        assert!(!active.test(b"x", b"", 1));
        assert!(!active.is_xpath());
    }
}
