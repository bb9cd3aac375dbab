//! Cursor navigation
//!
//! [`Parser`] keeps a path of [`Node`] views from the top of the document
//! down to the current element and moves it with `enter_*` calls or
//! query selections. Accessors project the current node (or any node
//! returned by a selection) into names, attributes, markup and text.

pub mod accessors;
pub mod node;
pub mod parser;

pub use accessors::NodeView;
pub use node::Node;
pub use parser::{Parser, MAX_DOCUMENT_LEN};
