//! Query Evaluation
//!
//! [`XPathFilter`] is the tag filter installed by a selection. It pairs a
//! shared, immutable [`CompiledQuery`] with the state of one traversal:
//! the anchor depth, one ordinal counter per relative level, and whether
//! the last node tested satisfied the final step.
//!
//! A floating query (leading `//`) has no fixed level per step. For every
//! node on the path it records which steps end a chain there, and whether
//! the whole chain of steps ends at the node or one of its ancestors.

use super::compiler::CompiledQuery;
use super::parser::Qualifier;
use crate::filter::TagFilter;
use std::sync::Arc;

/// Traversal-scoped state of a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// Absolute depth of the node the query is anchored at (0 = document)
    pub anchor_depth: usize,
    /// `counters[r - 1]`: nodes at relative level `r` that passed the
    /// name and attribute tests under the current parent
    pub counters: Vec<usize>,
    /// The last node tested satisfied the final qualifier
    pub last_satisfied: bool,
    /// `chain[r]`: floating-query matches of the node at relative level
    /// `r` (0 = anchor)
    pub chain: Vec<ChainLevel>,
}

/// Floating-query matches of one node on the path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainLevel {
    /// Indexes of the steps whose chain ends at this node
    pub steps: Vec<usize>,
    /// The full chain of steps ends at this node or an ancestor
    pub complete: bool,
    /// Children that passed each qualifier's name and attribute tests,
    /// indexed by step with the final qualifier last
    pub counts: Vec<usize>,
}

impl ChainLevel {
    fn ends(&self, step: Option<usize>) -> bool {
        step.is_some_and(|k| self.steps.contains(&k))
    }

    /// Count a child passing `qualifier` (step `index`); false when its
    /// ordinal rejects it
    fn count(&mut self, index: usize, qualifier: &Qualifier, name: &[u8], attributes: &[u8], fault_tolerant: bool) -> bool {
        if !qualifier.matches(name, attributes, fault_tolerant) {
            return false;
        }
        if self.counts.len() <= index {
            self.counts.resize(index + 1, 0);
        }
        let seen = self.counts[index];
        self.counts[index] += 1;
        qualifier.ordinal.map_or(true, |ordinal| ordinal == seen)
    }
}

/// Tag filter evaluating a compiled query
#[derive(Clone)]
pub struct XPathFilter {
    query: Arc<CompiledQuery>,
    inner: Option<Arc<dyn TagFilter>>,
    state: QueryState,
    fault_tolerant: bool,
}

impl XPathFilter {
    pub fn new(
        query: Arc<CompiledQuery>,
        inner: Option<Arc<dyn TagFilter>>,
        anchor_depth: usize,
        fault_tolerant: bool,
    ) -> Self {
        let chain = if query.floating {
            vec![ChainLevel::default()]
        } else {
            Vec::new()
        };
        XPathFilter {
            query,
            inner,
            state: QueryState {
                anchor_depth,
                counters: Vec::new(),
                last_satisfied: false,
                chain,
            },
            fault_tolerant,
        }
    }

    #[inline]
    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    #[inline]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[inline]
    pub fn anchor_depth(&self) -> usize {
        self.state.anchor_depth
    }

    #[inline]
    pub fn last_satisfied(&self) -> bool {
        self.state.last_satisfied
    }

    #[inline]
    pub fn clear_satisfied(&mut self) {
        self.state.last_satisfied = false;
    }

    /// Replace the user filter composed under the query
    pub fn set_inner(&mut self, inner: Option<Arc<dyn TagFilter>>) {
        self.inner = inner;
    }

    /// Whether traversal may look at the children of a node at `depth`
    pub fn may_descend(&self, depth: usize) -> bool {
        let Some(relative) = depth.checked_sub(self.state.anchor_depth) else {
            return false;
        };
        relative < self.query.nominal_level() || self.query.include_descendants || self.query.floating
    }

    /// Test a candidate at absolute depth `level`
    pub fn test(&mut self, name: &[u8], attributes: &[u8], level: usize) -> bool {
        if level <= self.state.anchor_depth {
            return false;
        }
        if let Some(inner) = &self.inner {
            if !inner.test(name, attributes, level) {
                return false;
            }
        }

        let relative = level - self.state.anchor_depth;
        let query = Arc::clone(&self.query);
        if query.floating {
            return self.test_floating(&query, relative, name, attributes);
        }
        // Counters below this level belong to the previous parent
        self.state.counters.truncate(relative);

        if relative <= query.steps.len() {
            self.state.last_satisfied = false;
            return self.accept(&query.steps[relative - 1], relative, name, attributes);
        }

        let nominal = query.nominal_level();
        if relative == nominal || (query.include_descendants && relative > nominal) {
            let satisfied = self.accept(&query.last, relative, name, attributes);
            self.state.last_satisfied = satisfied;
            // Under `//` an unsatisfied node is still entered so its
            // subtree can be searched
            return satisfied || query.include_descendants;
        }

        self.state.last_satisfied = false;
        false
    }

    /// Every node is entered; `last_satisfied` tells whether it is selected
    fn test_floating(&mut self, query: &CompiledQuery, relative: usize, name: &[u8], attributes: &[u8]) -> bool {
        let fault_tolerant = self.fault_tolerant;
        let chain = &mut self.state.chain;
        chain.truncate(relative);
        if chain.len() < relative {
            chain.resize(relative, ChainLevel::default());
        }

        let parent = &mut chain[relative - 1];
        let mut node = ChainLevel {
            complete: parent.complete,
            ..ChainLevel::default()
        };
        for (k, step) in query.steps.iter().enumerate() {
            let linked = k == 0 || parent.ends(Some(k - 1));
            if linked && parent.count(k, step, name, attributes, fault_tolerant) {
                node.steps.push(k);
            }
        }

        let final_step = query.steps.len().checked_sub(1);
        let linked = if query.include_descendants {
            parent.complete
        } else {
            parent.ends(final_step)
        };
        let satisfied = linked && parent.count(query.steps.len(), &query.last, name, attributes, fault_tolerant);

        node.complete |= node.ends(final_step);
        chain.push(node);
        self.state.last_satisfied = satisfied;
        true
    }

    /// Name, attribute and ordinal test of `qualifier` at `relative`
    fn accept(&mut self, qualifier: &Qualifier, relative: usize, name: &[u8], attributes: &[u8]) -> bool {
        if !qualifier.matches(name, attributes, self.fault_tolerant) {
            return false;
        }
        let counters = &mut self.state.counters;
        if counters.len() < relative {
            counters.resize(relative, 0);
        }
        let index = counters[relative - 1];
        counters[relative - 1] += 1;
        qualifier.ordinal.map_or(true, |ordinal| ordinal == index)
    }
}

impl std::fmt::Debug for XPathFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XPathFilter")
            .field("query", &self.query)
            .field("inner", &self.inner.as_ref().map(|_| ".."))
            .field("state", &self.state)
            .finish()
    }
}
