//! Atom interning.
//!
//! Heads, string literals and symbols are stored once per [`Store`](crate::Store)
//! and referenced from records by a small integer token.

use std::borrow::Borrow;
use std::hash::Hash;

use hashbrown::HashMap;

/// Token of an interned atom.
pub type TokenId = u32;

/// Atom table of a store: each distinct atom gets a dense token, in
/// first-seen order.
#[derive(Debug, Clone)]
pub struct InternTable<T> {
    map: HashMap<T, TokenId>,
    values: Vec<T>,
}

impl<T: Clone + Eq + Hash> Default for InternTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> InternTable<T> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            values: Vec::new(),
        }
    }

    /// An empty table with room for `capacity` atoms.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Token for `value`; the atom is copied into the table on first sight.
    pub fn intern<Q>(&mut self, value: &Q) -> TokenId
    where
        T: Borrow<Q> + for<'a> From<&'a Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&id) = self.map.get(value) {
            return id;
        }

        let id = self.values.len() as TokenId;
        let owned = T::from(value);
        self.map.insert(owned.clone(), id);
        self.values.push(owned);
        id
    }

    /// The atom behind `id`, if it was issued here.
    #[must_use]
    pub fn get(&self, id: TokenId) -> Option<&T> {
        self.values.get(id as usize)
    }

    /// The atom behind a token this table issued.
    ///
    /// # Panics
    ///
    /// Panics if the id did not come from this table.
    #[must_use]
    pub fn resolve(&self, id: TokenId) -> &T {
        &self.values[id as usize]
    }

    /// Token of an atom already seen, without adding it.
    #[must_use]
    pub fn get_id<Q>(&self, value: &Q) -> Option<TokenId>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(value).copied()
    }

    /// Number of distinct atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true before the first atom.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(token, atom)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as TokenId, v))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_atoms_get_stable_tokens() {
        let mut table: InternTable<Arc<str>> = InternTable::new();

        let id1 = table.intern("hello");
        let id2 = table.intern("world");
        let id3 = table.intern("hello");

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(id1, id3);

        assert_eq!(table.get(id1).map(|s| &**s), Some("hello"));
        assert_eq!(table.get_id("world"), Some(id2));
        assert_eq!(table.get_id("missing"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_iter_in_first_seen_order() {
        let mut table: InternTable<Arc<str>> = InternTable::new();
        table.intern("b");
        table.intern("a");
        table.intern("b");

        let names: Vec<&str> = table.iter().map(|(_, v)| &**v).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
