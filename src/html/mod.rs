//! HTML Tag-Soup Normalization
//!
//! Two passes turn loose HTML into markup the XML navigator can walk:
//!
//! 1. [`normalize::rewrite`]: per-tag cleanup (case, attribute quoting,
//!    void elements, script/style bodies, escaping of stray characters).
//! 2. [`wellformed::force_wellformed`]: nesting repair against a stack of
//!    open elements, with a single `html` root when there are several
//!    top-level elements.
//!
//! Neither pass fails; problems are reported as diagnostics.

pub mod normalize;
pub mod wellformed;

use crate::error::SyntaxError;

pub use normalize::rewrite;
pub use wellformed::force_wellformed;

/// Output of the well-formedness repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repair {
    pub output: Vec<u8>,
    /// Structural edits were applied
    pub repaired: bool,
    /// One entry per edit, with offsets into the repaired pass's input
    pub diagnostics: Vec<SyntaxError>,
}

/// Normalize tag-soup HTML into well-formed XHTML
pub fn normalize_html(input: &[u8]) -> Repair {
    let rewritten = rewrite(input);
    tracing::debug!("html rewrite: {} -> {} bytes", input.len(), rewritten.len());
    force_wellformed(&rewritten)
}
