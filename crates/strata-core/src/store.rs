//! Append-only expression store.
//!
//! Records live contiguously in a `Vec` and are never mutated or removed.
//! A record can only reference records appended before it, so store order
//! is always a topological order of the dependency relation.

use std::fmt::Write as _;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Error, Result};
use crate::expr::{Expr, Record, Slot, Value};
use crate::handle::{Handle, StoreId};
use crate::intern::InternTable;

/// Backing memory for one unit of work.
#[derive(Debug)]
pub struct Store {
    id: StoreId,
    records: Vec<Record>,
    /// Heads, strings and symbols.
    tokens: InternTable<Arc<str>>,
}

/// A clone is a new store: it gets a fresh identity, so handles issued by
/// one are foreign to the other.
impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            id: StoreId::fresh(),
            records: self.records.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a new empty store with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: StoreId::fresh(),
            records: Vec::new(),
            tokens: InternTable::new(),
        }
    }

    /// Creates a store with pre-allocated record capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: StoreId::fresh(),
            records: Vec::with_capacity(capacity),
            tokens: InternTable::with_capacity(64),
        }
    }

    /// Identity of this store.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of interned atoms.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Handles of every record, in creation order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Handle> + '_ {
        (0..self.records.len()).map(move |pos| self.handle_at(pos))
    }

    /// Checks that `handle` belongs to this store and returns its position.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignHandle`] or [`Error::DanglingHandle`].
    pub fn check(&self, handle: Handle) -> Result<usize> {
        if handle.store_id() != self.id {
            return Err(Error::ForeignHandle {
                handle,
                expected: self.id,
                found: handle.store_id(),
            });
        }
        let pos = handle.index() as usize;
        if pos >= self.records.len() {
            return Err(Error::DanglingHandle {
                handle,
                len: self.records.len(),
            });
        }
        Ok(pos)
    }

    /// Appends a record and returns its handle.
    ///
    /// # Errors
    ///
    /// Fails if an argument references a node from another store.
    pub fn append<I>(&mut self, head: &str, args: I) -> Result<Handle>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: SmallVec<[Value; 4]> = args.into_iter().map(Into::into).collect();
        // Validate every node before interning anything.
        for value in &values {
            if let Value::Node(h) = value {
                self.check(*h)?;
            }
        }

        let slots = values
            .into_iter()
            .map(|value| match value {
                Value::Int(v) => Slot::Int(v),
                Value::Bool(v) => Slot::Bool(v),
                Value::Str(s) => Slot::Token(self.tokens.intern::<str>(&s)),
                Value::Node(h) => Slot::Node(h.index()),
            })
            .collect();

        let pos = self.records.len();
        assert!(pos < u32::MAX as usize, "Store capacity exceeded");
        let head = self.tokens.intern(head);
        self.records.push(Record { head, args: slots });
        Ok(self.handle_at(pos))
    }

    /// Reads a record back.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn read(&self, handle: Handle) -> Result<Expr> {
        let pos = self.check(handle)?;
        Ok(self.expr_at(pos))
    }

    /// The head of a node, without materializing its arguments.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn head(&self, handle: Handle) -> Result<&str> {
        let pos = self.check(handle)?;
        Ok(self.tokens.resolve(self.records[pos].head))
    }

    /// Node-valued arguments in argument order, duplicates included.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn children(&self, handle: Handle) -> Result<SmallVec<[Handle; 4]>> {
        let pos = self.check(handle)?;
        Ok(self.records[pos]
            .child_positions()
            .map(|p| self.handle_at(p as usize))
            .collect())
    }

    /// Returns true if no argument of `handle` is a node.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn is_simple(&self, handle: Handle) -> Result<bool> {
        let pos = self.check(handle)?;
        Ok(self.records[pos].child_positions().next().is_none())
    }

    /// Lazily yields every record that has `handle` as a direct argument.
    ///
    /// Only records appended after `handle` are scanned.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn parents(&self, handle: Handle) -> Result<Parents<'_>> {
        let pos = self.check(handle)?;
        Ok(Parents {
            store: self,
            target: pos as u32,
            next: pos + 1,
        })
    }

    /// Parents of `handle` whose expression satisfies `pred`.
    ///
    /// # Errors
    ///
    /// Fails if the handle does not belong to this store.
    pub fn search_parents<'a, F>(
        &'a self,
        handle: Handle,
        mut pred: F,
    ) -> Result<impl Iterator<Item = Expr> + 'a>
    where
        F: FnMut(&Expr) -> bool + 'a,
    {
        Ok(self
            .parents(handle)?
            .map(move |p| self.expr_at(p.index() as usize))
            .filter(move |e| pred(e)))
    }

    /// Returns true if `target` is `root` or one of its transitive arguments.
    ///
    /// # Errors
    ///
    /// Fails if either handle does not belong to this store.
    pub fn contains(&self, root: Handle, target: Handle) -> Result<bool> {
        let root = self.check(root)? as u32;
        let target = self.check(target)? as u32;
        if root < target {
            return Ok(false);
        }

        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(pos) = stack.pop() {
            if pos == target {
                return Ok(true);
            }
            if !seen.insert(pos) {
                continue;
            }
            // Anything below `target` cannot lead back up to it.
            stack.extend(
                self.records[pos as usize]
                    .child_positions()
                    .filter(|&c| c >= target),
            );
        }
        Ok(false)
    }

    /// Positions of the dependency closure of `roots`, ascending.
    ///
    /// # Errors
    ///
    /// Fails if a root does not belong to this store.
    pub fn closure<I>(&self, roots: I) -> Result<Vec<u32>>
    where
        I: IntoIterator<Item = Handle>,
    {
        let mut seen = HashSet::new();
        let mut stack = Vec::new();
        for root in roots {
            stack.push(self.check(root)? as u32);
        }
        while let Some(pos) = stack.pop() {
            if seen.insert(pos) {
                stack.extend(self.records[pos as usize].child_positions());
            }
        }

        let mut positions: Vec<u32> = seen.into_iter().collect();
        positions.sort_unstable();
        Ok(positions)
    }

    /// Handles of the dependency closure of `roots`, in store order.
    ///
    /// # Errors
    ///
    /// Fails if a root does not belong to this store.
    pub fn reachable<I>(&self, roots: I) -> Result<Vec<Handle>>
    where
        I: IntoIterator<Item = Handle>,
    {
        let positions = self.closure(roots)?;
        Ok(positions
            .into_iter()
            .map(|pos| self.handle_at(pos as usize))
            .collect())
    }

    /// Copies the dependency closure of `root` into `dest`.
    ///
    /// Each reachable node is appended once, in dependency order, with its
    /// atoms re-interned. Work is proportional to the closure, not to the
    /// size of this store.
    ///
    /// # Errors
    ///
    /// Fails if `root` does not belong to this store.
    pub fn copy_tree_into(&self, root: Handle, dest: &mut Store) -> Result<Handle> {
        let mut out = self.copy_forest_into([root], dest)?;
        Ok(out.remove(0))
    }

    /// Copies the joint closure of several roots, sharing the relocation.
    ///
    /// # Errors
    ///
    /// Fails if a root does not belong to this store.
    pub fn copy_forest_into<I>(&self, roots: I, dest: &mut Store) -> Result<Vec<Handle>>
    where
        I: IntoIterator<Item = Handle>,
    {
        let roots: Vec<Handle> = roots.into_iter().collect();
        let closure = self.closure(roots.iter().copied())?;

        let mut relocated: HashMap<u32, Handle> = HashMap::with_capacity(closure.len());
        for &pos in &closure {
            let record = &self.records[pos as usize];
            let args: SmallVec<[Value; 4]> = record
                .args
                .iter()
                .map(|slot| match *slot {
                    Slot::Node(p) => Value::Node(relocated[&p]),
                    other => self.slot_value(other),
                })
                .collect();
            let head = self.tokens.resolve(record.head).clone();
            relocated.insert(pos, dest.append(&head, args)?);
        }

        debug!(
            from = %self.id,
            to = %dest.id,
            copied = closure.len(),
            total = self.records.len(),
            "copied dependency closure"
        );
        Ok(roots
            .iter()
            .map(|r| relocated[&r.index()])
            .collect())
    }

    /// Renders every record, one per line, as `#pos (head args...)`.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for pos in 0..self.records.len() {
            let _ = writeln!(out, "#{pos} {}", self.expr_at(pos));
        }
        out
    }

    pub(crate) fn handle_at(&self, pos: usize) -> Handle {
        Handle::new(self.id, pos as u32)
    }

    fn slot_value(&self, slot: Slot) -> Value {
        match slot {
            Slot::Int(v) => Value::Int(v),
            Slot::Bool(v) => Value::Bool(v),
            Slot::Token(t) => Value::Str(self.tokens.resolve(t).clone()),
            Slot::Node(p) => Value::Node(self.handle_at(p as usize)),
        }
    }

    fn expr_at(&self, pos: usize) -> Expr {
        let record = &self.records[pos];
        Expr::new(
            self.handle_at(pos),
            self.tokens.resolve(record.head).clone(),
            record.args.iter().map(|s| self.slot_value(*s)).collect(),
        )
    }
}

/// Iterator returned by [`Store::parents`].
#[derive(Debug, Clone)]
pub struct Parents<'a> {
    store: &'a Store,
    target: u32,
    next: usize,
}

impl Iterator for Parents<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        while self.next < self.store.records.len() {
            let pos = self.next;
            self.next += 1;
            if self.store.records[pos]
                .child_positions()
                .any(|c| c == self.target)
            {
                return Some(self.store.handle_at(pos));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Store, [Handle; 4]) {
        let mut store = Store::new();
        let a = store.append("num", [1]).unwrap();
        let b = store.append("num", [2]).unwrap();
        let c = store.append("add", [a, b]).unwrap();
        let d = store.append("sub", [a, a]).unwrap();
        (store, [a, b, c, d])
    }

    #[test]
    fn test_read_round_trip() {
        let mut store = Store::new();
        let n = store.append("num", [7]).unwrap();
        let args = [
            Value::from("heading"),
            Value::Node(n),
            Value::Int(-3),
            Value::Bool(true),
        ];
        let g = store.append("Grouped", args.clone()).unwrap();

        let expr = store.read(g).unwrap();
        assert_eq!(expr.head(), "Grouped");
        assert_eq!(expr.args(), &args);
        assert_eq!(store.read(g).unwrap(), expr);
    }

    #[test]
    fn test_identical_nodes_are_distinct() {
        let mut store = Store::new();
        let x = store.append("num", [1]).unwrap();
        let y = store.append("num", [1]).unwrap();
        assert_ne!(x, y);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_atoms_are_interned() {
        let mut store = Store::new();
        store.append("sym", ["x"]).unwrap();
        store.append("sym", ["x"]).unwrap();
        // "sym" and "x"
        assert_eq!(store.token_count(), 2);
    }

    #[test]
    fn test_parents_and_children() {
        let (store, [a, b, c, d]) = sample();

        let parents: Vec<Handle> = store.parents(a).unwrap().collect();
        assert_eq!(parents, [c, d]);
        assert!(!parents.contains(&b));

        assert_eq!(store.children(d).unwrap().as_slice(), [a, a]);
        assert!(store.is_simple(a).unwrap());
        assert!(!store.is_simple(c).unwrap());
        for p in parents {
            assert!(store.contains(p, a).unwrap());
        }
    }

    #[test]
    fn test_contains() {
        let (store, [a, b, c, d]) = sample();
        assert!(store.contains(c, c).unwrap());
        assert!(store.contains(c, b).unwrap());
        assert!(!store.contains(d, b).unwrap());
        assert!(!store.contains(a, c).unwrap());
    }

    #[test]
    fn test_reachable_in_store_order() {
        let (mut store, [a, b, c, d]) = sample();
        let e = store.append("neg", [c]).unwrap();
        assert_eq!(store.reachable([e]).unwrap(), [a, b, c, e]);
        assert_eq!(store.reachable([d, b]).unwrap(), [a, b, d]);
    }

    #[test]
    fn test_search_parents() {
        let (store, [a, _, _, d]) = sample();
        let subs: Vec<Handle> = store
            .search_parents(a, |e| e.head() == "sub")
            .unwrap()
            .map(|e| e.handle())
            .collect();
        assert_eq!(subs, [d]);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let (_, [a, ..]) = sample();
        let mut other = Store::new();

        let err = other.append("neg", [a]).unwrap_err();
        assert!(matches!(err, Error::ForeignHandle { .. }));
        assert!(matches!(other.read(a), Err(Error::ForeignHandle { .. })));
        assert!(other.is_empty());
    }

    #[test]
    fn test_failed_append_leaves_store_unchanged() {
        let (_, [a, ..]) = sample();
        let mut other = Store::new();

        let err = other
            .append("neg", [Value::from("stray-atom"), Value::Node(a)])
            .unwrap_err();
        assert!(matches!(err, Error::ForeignHandle { .. }));
        assert_eq!(other.token_count(), 0);
        assert!(other.is_empty());
    }

    #[test]
    fn test_clone_has_its_own_identity() {
        let (original, [a, ..]) = sample();
        let mut copy = original.clone();
        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.dump(), original.dump());

        let y = copy.append("y", [2]).unwrap();
        assert!(matches!(original.read(y), Err(Error::ForeignHandle { .. })));
        assert!(matches!(copy.read(a), Err(Error::ForeignHandle { .. })));
        assert_ne!(Handle::new(copy.id(), 0), a);
    }

    #[test]
    fn test_copy_tree_compacts() {
        let mut store = Store::new();
        store.append("num", [0]).unwrap();
        let a = store.append("num", [1]).unwrap();
        let b = store.append("num", [2]).unwrap();
        store.append("num", [3]).unwrap();
        store.append("add", [a, b]).unwrap();
        let d = store.append("sub", [a, a]).unwrap();
        let e = store.append("mul", [b, d]).unwrap();

        let mut fresh = Store::new();
        let new_e = store.copy_tree_into(e, &mut fresh).unwrap();

        assert_ne!(new_e, e);
        assert_eq!(fresh.len(), 4);
        assert!(fresh.len() < store.len());
        assert!(fresh.token_count() < store.token_count());

        let sub = fresh.children(new_e).unwrap()[1];
        let sub_children = fresh.children(sub).unwrap();
        assert_eq!(sub_children[0], sub_children[1]);
    }

    #[test]
    fn test_copy_forest_shares_relocation() {
        let (store, [a, _, c, d]) = sample();
        let mut fresh = Store::new();
        let roots = store.copy_forest_into([c, d], &mut fresh).unwrap();

        assert_eq!(fresh.len(), 4);
        let new_a = fresh.children(roots[0]).unwrap()[0];
        assert_eq!(fresh.children(roots[1]).unwrap()[0], new_a);
        assert_eq!(fresh.read(new_a).unwrap().args(), store.read(a).unwrap().args());
    }

    #[test]
    fn test_dump() {
        let (store, _) = sample();
        assert_eq!(
            store.dump(),
            "#0 (num 1)\n#1 (num 2)\n#2 (add #0 #1)\n#3 (sub #0 #0)\n"
        );
    }
}
