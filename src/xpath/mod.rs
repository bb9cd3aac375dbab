//! XPath subset
//!
//! Location paths over element names with one attribute predicate and
//! one ordinal per step:
//! - `/a/b`, `a/b`, `.`, `..`, `*`
//! - `//` right before the final step
//! - a leading `//` (or `.//`) lets the first of several steps match at
//!   any depth
//! - `[n]`, `[@a]`, `[@a='v']`, `[@a!='v']`, and the extensions
//!   `[@a:='v']` (starts with), `[@a?='v']` (ends with),
//!   `[@a~='v']` (contains), `[@a^='v']` (whole word)
//!
//! Queries compile into immutable [`CompiledQuery`] values shared through
//! the [`cache`]; traversal state lives in [`XPathFilter`].

pub mod cache;
pub mod compiler;
pub mod css;
pub mod eval;
pub mod parser;

pub use cache::compile_cached;
pub use compiler::{compile, CompiledQuery};
pub use css::css_to_xpath;
pub use eval::{ChainLevel, QueryState, XPathFilter};
pub use parser::{AttributePredicate, CompareOp, NameTest, Qualifier};
