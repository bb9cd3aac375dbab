//! Node accessors
//!
//! [`NodeView`] projects a [`Node`] of a document into its name,
//! attributes, markup and text. The parser exposes the same accessors for
//! its current node.

use super::node::Node;
use super::parser::Parser;
use crate::core::attributes::{
    parse_bool, parse_file_size, parse_time_span, Attribute, AttributeIter,
};
use crate::core::closure::{match_node_close, Closure};
use crate::core::entities::{decode_entities_to_text, TextOptions};
use crate::core::scanner::trim_span;
use crate::core::span::Span;
use crate::core::tokenizer::{read_special, TokenKind};
use crate::error::{Error, Result, SyntaxError};
use std::borrow::Cow;

/// A node together with the buffer it points into
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'p> {
    document: &'p [u8],
    node: Node,
    fault_tolerant: bool,
    separator: u8,
}

impl<'p> NodeView<'p> {
    #[inline]
    pub fn node(&self) -> Node {
        self.node
    }

    #[inline]
    pub fn name(&self) -> &'p [u8] {
        self.node.name.slice(self.document)
    }

    #[inline]
    pub fn name_str(&self) -> Option<&'p str> {
        self.node.name.as_str(self.document)
    }

    /// Attribute block as written, still escaped
    #[inline]
    pub fn attributes_raw(&self) -> &'p [u8] {
        self.node.attributes.slice(self.document)
    }

    pub fn attributes(&self) -> AttributeIter<'p> {
        AttributeIter::new(self.document, self.node.attributes, self.fault_tolerant)
    }

    /// Raw (escaped) value of attribute `name`
    pub fn attribute(&self, name: &str) -> Option<&'p [u8]> {
        self.attributes()
            .find(|attr| attr.name == name.as_bytes())
            .map(|attr| attr.raw_value)
    }

    /// Decoded value of attribute `name`
    pub fn attribute_value(&self, name: &str) -> Option<Cow<'p, str>> {
        self.attributes()
            .find(|attr| attr.name == name.as_bytes())
            .and_then(|attr| attr.value_str())
    }

    pub fn attribute_string(&self, name: &str, default: &str) -> String {
        self.attribute_value(name)
            .map_or_else(|| default.to_owned(), Cow::into_owned)
    }

    pub fn attribute_i32(&self, name: &str, default: i32) -> i32 {
        self.parsed(name, default, |v| v.parse().ok())
    }

    pub fn attribute_i64(&self, name: &str, default: i64) -> i64 {
        self.parsed(name, default, |v| v.parse().ok())
    }

    pub fn attribute_f64(&self, name: &str, default: f64) -> f64 {
        self.parsed(name, default, |v| v.parse().ok())
    }

    /// `true/yes/on/1` or `false/no/off/0`
    pub fn attribute_bool(&self, name: &str, default: bool) -> bool {
        self.parsed(name, default, parse_bool)
    }

    /// Byte size with an optional `k m g t` suffix (powers of 1024)
    pub fn attribute_file_size(&self, name: &str, default: u64) -> u64 {
        self.parsed(name, default, parse_file_size)
    }

    /// Time span in milliseconds, with an optional `ms s m h d w` suffix
    pub fn attribute_time_span(&self, name: &str, default: u64) -> u64 {
        self.parsed(name, default, parse_time_span)
    }

    fn parsed<T>(&self, name: &str, default: T, parse: impl FnOnce(&str) -> Option<T>) -> T {
        self.attribute_value(name)
            .and_then(|value| parse(value.trim()))
            .unwrap_or(default)
    }

    /// The node's close tag; `None` for a compact node
    pub fn closure(&self) -> Result<Option<Closure>, SyntaxError> {
        if self.node.compact {
            return Ok(None);
        }
        match_node_close(self.document, self.node.inner_start, self.name(), self.fault_tolerant)
            .map(Some)
    }

    /// Markup from the opening `<` through the close tag
    pub fn outer_xml(&self) -> Result<&'p [u8], SyntaxError> {
        let end = match self.closure()? {
            Some(closure) => closure.end,
            None => self.node.inner_start,
        };
        Ok(&self.document[self.node.outer_start..end])
    }

    /// Markup between the opening and the close tag
    pub fn inner_xml(&self) -> Result<&'p [u8], SyntaxError> {
        Ok(match self.closure()? {
            Some(closure) => &self.document[self.node.inner_start..closure.start],
            None => &[],
        })
    }

    /// Decoded, whitespace-collapsed inner content
    pub fn inner_text(&self) -> Result<String, SyntaxError> {
        self.inner_text_with(&TextOptions::default().separator(self.separator))
    }

    pub fn inner_text_with(&self, options: &TextOptions) -> Result<String, SyntaxError> {
        Ok(decode_entities_to_text(self.inner_xml()?, options))
    }

    /// Payload of the inner content when it is exactly one CDATA section
    pub fn cdata(&self) -> Result<Option<&'p [u8]>, SyntaxError> {
        let inner = self.inner_xml()?;
        let trimmed = trim_span(inner, Span::from_range(0, inner.len())).slice(inner);
        if !trimmed.starts_with(b"<![CDATA[") {
            return Ok(None);
        }
        Ok(match read_special(trimmed, 0, false) {
            Ok(Some(token)) if token.kind == TokenKind::CData && token.end == trimmed.len() => {
                Some(&trimmed[9..trimmed.len() - 3])
            }
            _ => None,
        })
    }
}

impl<'a> Parser<'a> {
    /// View of any node of this document
    pub fn view(&self, node: &Node) -> NodeView<'_> {
        NodeView {
            document: &self.buffer,
            node: *node,
            fault_tolerant: self.options.fault_tolerant,
            separator: self.options.text_separator,
        }
    }

    /// View of the current node
    pub fn current_view(&self) -> Option<NodeView<'_>> {
        self.path.last().map(|node| self.view(node))
    }

    fn positioned(&self) -> Result<NodeView<'_>> {
        self.current_view().ok_or(Error::NotPositioned)
    }

    pub fn node_name(&self) -> Option<&str> {
        self.current_view().and_then(|view| view.name_str())
    }

    pub fn attributes_raw(&self) -> Option<&[u8]> {
        self.current_view().map(|view| view.attributes_raw())
    }

    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.current_view()?.attribute(name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.current_view()?.attribute_value(name)
    }

    pub fn attribute_string(&self, name: &str, default: &str) -> String {
        self.current_view()
            .map_or_else(|| default.to_owned(), |view| view.attribute_string(name, default))
    }

    pub fn attribute_i32(&self, name: &str, default: i32) -> i32 {
        self.current_view()
            .map_or(default, |view| view.attribute_i32(name, default))
    }

    pub fn attribute_i64(&self, name: &str, default: i64) -> i64 {
        self.current_view()
            .map_or(default, |view| view.attribute_i64(name, default))
    }

    pub fn attribute_f64(&self, name: &str, default: f64) -> f64 {
        self.current_view()
            .map_or(default, |view| view.attribute_f64(name, default))
    }

    pub fn attribute_bool(&self, name: &str, default: bool) -> bool {
        self.current_view()
            .map_or(default, |view| view.attribute_bool(name, default))
    }

    pub fn attribute_file_size(&self, name: &str, default: u64) -> u64 {
        self.current_view()
            .map_or(default, |view| view.attribute_file_size(name, default))
    }

    pub fn attribute_time_span(&self, name: &str, default: u64) -> u64 {
        self.current_view()
            .map_or(default, |view| view.attribute_time_span(name, default))
    }

    pub fn outer_xml(&self) -> Result<&[u8]> {
        Ok(self.positioned()?.outer_xml()?)
    }

    pub fn inner_xml(&self) -> Result<&[u8]> {
        Ok(self.positioned()?.inner_xml()?)
    }

    pub fn inner_text(&self) -> Result<String> {
        Ok(self.positioned()?.inner_text()?)
    }

    pub fn inner_text_with(&self, options: &TextOptions) -> Result<String> {
        Ok(self.positioned()?.inner_text_with(options)?)
    }

    pub fn cdata(&self) -> Result<Option<&[u8]>> {
        Ok(self.positioned()?.cdata()?)
    }

    /// Restart attribute iteration on the current node
    pub fn first_attribute(&mut self) -> Option<Attribute<'_>> {
        self.attribute_cursor = self.path.last().map(|node| node.attributes.start());
        self.next_attribute()
    }

    /// Next attribute of the current node; `None` when done or before
    /// [`first_attribute`](Self::first_attribute).
    ///
    /// In strict mode a malformed attribute ends the iteration and is
    /// reported through [`last_error`](Self::last_error).
    pub fn next_attribute(&mut self) -> Option<Attribute<'_>> {
        let node = *self.path.last()?;
        let cursor = self.attribute_cursor?;
        let block = Span::from_range(cursor, node.attributes.end());
        let mut iter = AttributeIter::new(&self.buffer, block, self.options.fault_tolerant);

        match iter.next_spans() {
            Some((name, value)) => {
                self.attribute_cursor = Some(iter.position());
                let document: &[u8] = &self.buffer;
                Some(Attribute {
                    name: name.slice(document),
                    raw_value: value.slice(document),
                })
            }
            None => {
                if let Some(e) = iter.error() {
                    self.last_error = Some(e);
                }
                self.attribute_cursor = None;
                None
            }
        }
    }
}
