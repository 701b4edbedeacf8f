//! Reference counting over a dependency closure.

use hashbrown::HashMap;
use strata_core::{Handle, Result, Store, Visitor};

/// In-degree of every node visited, counted over argument positions.
///
/// Works as a [`Visitor`] for [`strata_core::apply_bottomup`], or directly
/// through [`Occurrences::count`] when only a shared borrow is at hand.
#[derive(Clone, Debug, Default)]
pub struct Occurrences {
    counts: HashMap<Handle, usize>,
    order: Vec<Handle>,
}

impl Occurrences {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts references within the dependency closure of `root`.
    ///
    /// # Errors
    ///
    /// Fails if `root` does not belong to `store`.
    pub fn count(store: &Store, root: Handle) -> Result<Self> {
        let mut occurrences = Self::new();
        for node in store.reachable([root])? {
            occurrences.record(store, node)?;
        }
        Ok(occurrences)
    }

    /// Number of argument positions referencing `node`.
    #[must_use]
    pub fn get(&self, node: Handle) -> usize {
        self.counts.get(&node).copied().unwrap_or(0)
    }

    /// Returns true if `node` is referenced more than once.
    #[must_use]
    pub fn is_shared(&self, node: Handle) -> bool {
        self.get(node) > 1
    }

    /// Visited nodes, in store order.
    #[must_use]
    pub fn order(&self) -> &[Handle] {
        &self.order
    }

    fn record(&mut self, store: &Store, node: Handle) -> Result<()> {
        for child in store.children(node)? {
            *self.counts.entry(child).or_insert(0) += 1;
        }
        self.order.push(node);
        Ok(())
    }
}

impl Visitor for Occurrences {
    fn visit(&mut self, store: &mut Store, node: Handle) -> Result<()> {
        self.record(store, node)
    }
}
