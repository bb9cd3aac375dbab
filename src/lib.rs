//! tagcursor - In-place XML/XHTML cursor parsing
//!
//! The document is never turned into a tree. A [`Parser`] keeps a path of
//! buffer-relative [`Node`] views and moves it by scanning the bytes:
//!
//! - Navigation: `enter_first_child`, `enter_next_sibling`, `enter_parent`,
//!   `enter_root`, `enter_succeeding_node`
//! - Filtering: a [`TagFilter`] gates which nodes navigation visits
//! - Queries: an XPath subset (and CSS paths translated into it) compiled
//!   into a filter, see [`xpath`]
//! - Accessors: names, attributes, markup and decoded text of a node
//! - HTML: tag-soup normalized into well-formed XHTML, see [`html`]
//!
//! ```no_run
//! use tagcursor::Parser;
//!
//! let mut parser = Parser::new(b"<r><a href=\"x\">one</a><a>two</a></r>");
//! for node in parser.select_all("/r/a[@href]")? {
//!     println!("{}", parser.view(&node).inner_text()?);
//! }
//! # Ok::<(), tagcursor::Error>(())
//! ```

pub mod core;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod html;
pub mod options;
pub mod strategy;
pub mod xpath;

pub use crate::core::entities::TextOptions;
pub use crate::core::span::Span;
pub use cursor::{Node, NodeView, Parser};
pub use error::{Error, QueryError, QueryErrorKind, Result, SyntaxError, SyntaxErrorKind};
pub use filter::TagFilter;
pub use html::{normalize_html, Repair};
pub use options::ParserOptions;
pub use strategy::select_parallel;
pub use xpath::css_to_xpath;
