//! Parallel Query Evaluation
//!
//! Uses Rayon to run independent queries over one document. Each query
//! gets its own [`Parser::fork`], so the document is shared and only the
//! navigation state is per thread.

use crate::cursor::{Node, NodeView, Parser};
use crate::error::Result;
use rayon::prelude::*;

/// Evaluate multiple queries in parallel, in input order
pub fn select_parallel(parser: &Parser<'_>, queries: &[&str]) -> Vec<Result<Vec<Node>>> {
    queries
        .par_iter()
        .map(|query| parser.fork().select_all(query))
        .collect()
}

/// Evaluate a query and map every selected node
pub fn select_map<F, T>(parser: &Parser<'_>, query: &str, mapper: F) -> Result<Vec<T>>
where
    F: Fn(NodeView<'_>) -> T + Sync + Send,
    T: Send,
{
    let nodes = parser.fork().select_all(query)?;
    Ok(nodes.par_iter().map(|node| mapper(parser.view(node))).collect())
}

/// Evaluate keyed queries in parallel; the first error wins
pub fn xmap(parser: &Parser<'_>, queries: &[(&str, &str)]) -> Result<Vec<(String, Vec<Node>)>> {
    queries
        .par_iter()
        .map(|(key, query)| {
            parser
                .fork()
                .select_all(query)
                .map(|nodes| (key.to_string(), nodes))
        })
        .collect()
}
