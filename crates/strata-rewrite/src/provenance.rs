//! Reading back rewrite history.
//!
//! Every replacement made by a [`RewritePass`](crate::RewritePass) with
//! history enabled leaves a `(.md.rewrite "<pass>" new original)` record in
//! the store. These helpers find those records again.

use std::sync::Arc;

use hashbrown::HashSet;
use strata_core::{Handle, Result, Store, Value, REWRITE_HISTORY_HEAD};

/// One recorded replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provenance {
    /// Name of the pass that made the replacement.
    pub pass: Arc<str>,
    /// The node that was replaced.
    pub original: Handle,
    /// The metadata record itself.
    pub record: Handle,
}

/// Every recorded replacement that produced `node`, oldest first.
///
/// # Errors
///
/// Fails if `node` does not belong to `store`.
pub fn provenance(store: &Store, node: Handle) -> Result<Vec<Provenance>> {
    let found = store
        .search_parents(node, move |e| {
            e.head() == REWRITE_HISTORY_HEAD && e.args().get(1) == Some(&Value::Node(node))
        })?
        .filter_map(|e| match e.args() {
            [Value::Str(pass), _, Value::Node(original)] => Some(Provenance {
                pass: pass.clone(),
                original: *original,
                record: e.handle(),
            }),
            _ => None,
        })
        .collect();
    Ok(found)
}

/// Follows the first recorded replacement back until reaching a node that
/// no pass produced, or one already on the chain. Returns the chain, most
/// recent first.
///
/// # Errors
///
/// Fails if `node` does not belong to `store`.
pub fn lineage(store: &Store, node: Handle) -> Result<Vec<Provenance>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(node);
    let mut current = node;
    while let Some(step) = provenance(store, current)?.into_iter().next() {
        current = step.original;
        chain.push(step);
        // Passes may map a node back onto an older one.
        if !seen.insert(current) {
            break;
        }
    }
    Ok(chain)
}
