//! Cursor parser
//!
//! Navigation state over one document buffer, borrowed or owned. Moves
//! scan the buffer from a node's boundaries and push, pop or replace
//! entries of the node path; nothing else is built.

use super::node::Node;
use crate::core::closure::match_node_close;
use crate::core::tokenizer::{TokenKind, Tokenizer};
use crate::error::{Error, QueryError, QueryErrorKind, Result, SyntaxError, SyntaxErrorKind};
use crate::filter::{ActiveFilter, TagFilter};
use crate::html::normalize_html;
use crate::options::ParserOptions;
use crate::xpath::cache::compile_cached;
use crate::xpath::css::css_to_xpath;
use crate::xpath::{CompiledQuery, XPathFilter};
use memchr::memchr;
use std::borrow::Cow;
use std::sync::Arc;

/// Longest document a parser accepts; node spans hold `u32` offsets
pub const MAX_DOCUMENT_LEN: usize = u32::MAX as usize;

/// In-place cursor parser.
///
/// Cloning deep-copies an owned buffer and shares a borrowed one; every
/// stored position is buffer-relative so clones need no fix-up.
#[derive(Clone)]
pub struct Parser<'a> {
    pub(super) buffer: Cow<'a, [u8]>,
    pub(super) path: Vec<Node>,
    default_filter: Option<Arc<dyn TagFilter>>,
    filter: ActiveFilter,
    /// Next scan position inside the current node's attribute block
    pub(super) attribute_cursor: Option<usize>,
    pub(super) last_error: Option<SyntaxError>,
    pub(super) options: ParserOptions,
    /// Path to restore when a selection ends
    origin: Vec<Node>,
}

impl<'a> Parser<'a> {
    /// Parser over a borrowed buffer
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: ParserOptions) -> Self {
        let mut parser = Self::empty(options);
        parser.load(input);
        parser
    }

    /// Parser owning its buffer
    pub fn owned(input: Vec<u8>) -> Self {
        let mut parser = Self::empty(ParserOptions::default());
        parser.load_owned(input);
        parser
    }

    /// Parser over tag-soup HTML normalized to XHTML
    pub fn html(input: &[u8]) -> Self {
        let mut parser = Self::empty(ParserOptions::default());
        parser.load_html(input);
        parser
    }

    fn empty(options: ParserOptions) -> Self {
        Parser {
            buffer: Cow::Borrowed(&[]),
            path: Vec::new(),
            default_filter: None,
            filter: ActiveFilter::None,
            attribute_cursor: None,
            last_error: None,
            options,
            origin: Vec::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Borrow `input`; the parser then lives no longer than the buffer.
    ///
    /// Input past the first NUL byte is ignored. A document longer than
    /// [`MAX_DOCUMENT_LEN`] is not loaded: the parser is left empty and
    /// [`last_error`](Self::last_error) reports `OutOfMemory`.
    pub fn load(&mut self, input: &'a [u8]) {
        let input = until_nul(input);
        if let Err(e) = check_len(input.len()) {
            self.reject(e);
            return;
        }
        self.buffer = Cow::Borrowed(input);
        self.reset();
        tracing::debug!("loaded {} bytes (borrowed)", self.buffer.len());
    }

    /// Take ownership of `input`; same limits as [`load`](Self::load)
    pub fn load_owned(&mut self, mut input: Vec<u8>) {
        if let Some(nul) = memchr(0, &input) {
            input.truncate(nul);
        }
        if let Err(e) = check_len(input.len()) {
            self.reject(e);
            return;
        }
        self.buffer = Cow::Owned(input);
        self.reset();
        tracing::debug!("loaded {} bytes (owned)", self.buffer.len());
    }

    /// Copy `input` into a buffer owned by the parser
    pub fn load_copy(&mut self, input: &[u8]) -> Result<()> {
        let input = until_nul(input);
        check_len(input.len())?;
        let mut copy = Vec::new();
        copy.try_reserve_exact(input.len())
            .map_err(|_| SyntaxError::new(SyntaxErrorKind::OutOfMemory, 0))?;
        copy.extend_from_slice(input);
        self.load_owned(copy);
        Ok(())
    }

    /// Normalize tag-soup HTML and load the result.
    ///
    /// Returns whether structural repair was needed.
    pub fn load_html(&mut self, input: &[u8]) -> bool {
        let repair = normalize_html(input);
        let repaired = repair.repaired;
        self.load_owned(repair.output);
        repaired
    }

    /// Drop the buffer and all navigation state
    pub fn clear(&mut self) {
        self.buffer = Cow::Borrowed(&[]);
        self.reset();
    }

    fn reject(&mut self, error: SyntaxError) {
        self.clear();
        tracing::debug!("document rejected: {}", error);
        self.last_error = Some(error);
    }

    fn reset(&mut self) {
        self.path.clear();
        self.origin.clear();
        self.attribute_cursor = None;
        self.last_error = None;
        self.filter = ActiveFilter::from_user(self.default_filter.as_ref());
    }

    // ========================================================================
    // State
    // ========================================================================

    /// The active document buffer
    #[inline]
    pub fn document(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.buffer, Cow::Borrowed(_))
    }

    #[inline]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ParserOptions) {
        self.options = options;
    }

    /// Depth of the current node (0 when unpositioned)
    #[inline]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Nodes from the top of the document down to the current one
    #[inline]
    pub fn path(&self) -> &[Node] {
        &self.path
    }

    #[inline]
    pub fn current(&self) -> Option<&Node> {
        self.path.last()
    }

    /// Error that stopped the last failed move, if it was not a clean end
    #[inline]
    pub fn last_error(&self) -> Option<SyntaxError> {
        self.last_error
    }

    /// Install (or remove) the default user filter.
    ///
    /// An active selection keeps running with the new filter composed
    /// under its query.
    pub fn set_filter(&mut self, filter: Option<Arc<dyn TagFilter>>) {
        self.default_filter = filter;
        match self.filter.xpath_mut() {
            Some(xpath) => xpath.set_inner(self.default_filter.clone()),
            None => self.filter = ActiveFilter::from_user(self.default_filter.as_ref()),
        }
    }

    /// Parser borrowing this one's buffer, positioned on the same path,
    /// with the same options and default filter and no active selection
    pub fn fork(&self) -> Parser<'_> {
        Parser {
            buffer: Cow::Borrowed(&self.buffer),
            path: self.path.clone(),
            default_filter: self.default_filter.clone(),
            filter: ActiveFilter::from_user(self.default_filter.as_ref()),
            attribute_cursor: None,
            last_error: None,
            options: self.options,
            origin: Vec::new(),
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn begin_move(&mut self) {
        self.attribute_cursor = None;
        self.last_error = None;
    }

    fn fail(&mut self, error: SyntaxError) -> bool {
        tracing::trace!("navigation failed: {}", error);
        self.last_error = Some(error);
        false
    }

    /// Find the first open tag at or after `from`, on this level, that
    /// passes the name test and the active filter.
    fn scan(&mut self, from: usize, level: usize, name: Option<&[u8]>) -> Result<Option<Node>, SyntaxError> {
        let input: &[u8] = &self.buffer;
        let fault_tolerant = self.options.fault_tolerant;
        let mut tokens = Tokenizer::new(input, from, fault_tolerant).markup_only();

        while let Some(token) = tokens.next() {
            let token = token?;
            match token.kind {
                // The parent ends here
                TokenKind::CloseTag => return Ok(None),
                TokenKind::OpenTag { compact } => {
                    let tag = token.name.slice(input);
                    if name.map_or(true, |n| n == tag)
                        && self.filter.test(tag, token.attributes.slice(input), level)
                    {
                        return Ok(Node::from_token(&token));
                    }
                    if !compact {
                        let closure = match_node_close(input, token.end, tag, fault_tolerant)?;
                        tokens.seek(closure.end);
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Enter the first child element, optionally the first one named `name`.
    ///
    /// When unpositioned this enters the first top-level element.
    pub fn enter_first_child(&mut self, name: Option<&str>) -> bool {
        self.begin_move();
        let from = match self.path.last() {
            Some(node) if node.compact => return false,
            Some(node) => node.inner_start,
            None => 0,
        };
        let level = self.path.len() + 1;

        match self.scan(from, level, name.map(str::as_bytes)) {
            Ok(Some(_)) if level > self.options.max_depth => {
                self.fail(SyntaxError::new(SyntaxErrorKind::NestingDepthExceeded, from))
            }
            Ok(Some(node)) => {
                self.path.push(node);
                true
            }
            Ok(None) => false,
            Err(e) => self.fail(e),
        }
    }

    /// Replace the current node with its next sibling element
    pub fn enter_next_sibling(&mut self) -> bool {
        self.begin_move();
        let Some(&node) = self.path.last() else {
            return false;
        };

        let from = if node.compact {
            node.inner_start
        } else {
            let name = node.name.slice(&self.buffer);
            match match_node_close(&self.buffer, node.inner_start, name, self.options.fault_tolerant) {
                Ok(closure) => closure.end,
                Err(e) => return self.fail(e),
            }
        };

        match self.scan(from, self.path.len(), None) {
            Ok(Some(sibling)) => {
                if let Some(top) = self.path.last_mut() {
                    *top = sibling;
                }
                true
            }
            Ok(None) => false,
            Err(e) => self.fail(e),
        }
    }

    /// Move to the parent; fails at the top level
    pub fn enter_parent(&mut self) -> bool {
        self.begin_move();
        if self.path.len() <= 1 {
            return false;
        }
        self.path.pop();
        true
    }

    /// Return to the top-level node and the default filter
    pub fn enter_root(&mut self) -> bool {
        self.begin_move();
        if self.path.is_empty() {
            return false;
        }
        self.path.truncate(1);
        self.origin.clear();
        self.filter = ActiveFilter::from_user(self.default_filter.as_ref());
        true
    }

    /// Depth-first step: first child, else next sibling, else the next
    /// sibling of the nearest ancestor that has one.
    ///
    /// During a selection this is [`next_match`](Self::next_match). A
    /// failed step leaves the path unchanged.
    pub fn enter_succeeding_node(&mut self) -> bool {
        if self.filter.is_xpath() {
            return self.next_match();
        }
        let saved = self.path.clone();
        if self.step_succeeding(0) {
            return true;
        }
        self.path = saved;
        false
    }

    /// One depth-first step that never leaves the subtree of the node at
    /// depth `anchor`
    fn step_succeeding(&mut self, anchor: usize) -> bool {
        let descend = match self.filter.xpath() {
            Some(xpath) => xpath.may_descend(self.path.len()),
            None => true,
        };
        if descend && self.enter_first_child(None) {
            return true;
        }
        if self.last_error.is_some() {
            return false;
        }

        while self.path.len() > anchor {
            if self.enter_next_sibling() {
                return true;
            }
            if self.last_error.is_some() {
                return false;
            }
            self.path.pop();
        }
        false
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Start a selection. Matches are visited with [`next_match`](Self::next_match).
    ///
    /// Absolute queries are anchored at the document, relative ones at the
    /// current node (after any leading `..`).
    pub fn select(&mut self, query: &str) -> Result<()> {
        let compiled = compile_cached(query)?;
        self.begin_selection(compiled)
    }

    /// Start a selection from a CSS path
    pub fn select_css(&mut self, css: &str) -> Result<()> {
        let query = css_to_xpath(css)?;
        self.select(&query)
    }

    fn begin_selection(&mut self, query: Arc<CompiledQuery>) -> Result<()> {
        self.begin_move();
        let anchor = if query.relative {
            self.path
                .len()
                .checked_sub(query.ascend_count)
                .ok_or(QueryError::new(QueryErrorKind::AscendBeyondRoot, 0))?
        } else {
            0
        };

        self.origin = self.path.clone();
        self.path.truncate(anchor);
        self.filter = ActiveFilter::XPath(XPathFilter::new(
            query,
            self.default_filter.clone(),
            anchor,
            self.options.fault_tolerant,
        ));
        Ok(())
    }

    /// Move to the next node selected by the active query.
    ///
    /// When the selection is exhausted (or hits a syntax error) the path
    /// from before [`select`](Self::select) is restored and the selection
    /// ends.
    pub fn next_match(&mut self) -> bool {
        let Some(anchor) = self.filter.xpath().map(XPathFilter::anchor_depth) else {
            return false;
        };
        loop {
            if let Some(xpath) = self.filter.xpath_mut() {
                xpath.clear_satisfied();
            }
            if !self.step_succeeding(anchor) {
                self.end_selection();
                return false;
            }
            if self.filter.xpath().is_some_and(XPathFilter::last_satisfied) {
                return true;
            }
        }
    }

    /// Collect every node selected by `query`; the cursor is left where it
    /// was
    pub fn select_all(&mut self, query: &str) -> Result<Vec<Node>> {
        self.select(query)?;
        self.collect_matches()
    }

    /// [`select_all`](Self::select_all) for a CSS path
    pub fn select_all_css(&mut self, css: &str) -> Result<Vec<Node>> {
        self.select_css(css)?;
        self.collect_matches()
    }

    fn collect_matches(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while self.next_match() {
            if let Some(&node) = self.path.last() {
                nodes.push(node);
            }
        }
        match self.last_error {
            Some(e) => Err(Error::Syntax(e)),
            None => Ok(nodes),
        }
    }

    /// Abandon the active selection and restore the path it started from
    pub fn clear_selection(&mut self) {
        if self.filter.is_xpath() {
            self.end_selection();
        }
    }

    fn end_selection(&mut self) {
        self.path = std::mem::take(&mut self.origin);
        self.attribute_cursor = None;
        self.filter = ActiveFilter::from_user(self.default_filter.as_ref());
    }

    /// The active selection's filter, if a selection is running
    pub fn selection(&self) -> Option<&XPathFilter> {
        self.filter.xpath()
    }
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("len", &self.buffer.len())
            .field("borrowed", &self.is_borrowed())
            .field("path", &self.path)
            .field("filter", &self.filter)
            .field("last_error", &self.last_error)
            .field("options", &self.options)
            .finish()
    }
}

/// Input up to (not including) the first NUL byte
#[inline]
fn check_len(len: usize) -> std::result::Result<(), SyntaxError> {
    if len > MAX_DOCUMENT_LEN {
        return Err(SyntaxError::new(SyntaxErrorKind::OutOfMemory, MAX_DOCUMENT_LEN));
    }
    Ok(())
}

fn until_nul(input: &[u8]) -> &[u8] {
    memchr(0, input).map_or(input, |nul| &input[..nul])
}
