//! Store-scoped node handles.
//!
//! A handle is a 32-bit position paired with the identity of the store that
//! produced it. Handles from different stores never compare equal.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_STORE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique identity of a [`Store`](crate::Store).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u32);

impl StoreId {
    /// Allocates a fresh id.
    pub(crate) fn fresh() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store({})", self.0)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store{}", self.0)
    }
}

/// A handle to a node in a [`Store`](crate::Store).
///
/// Equality is positional: two handles are equal if and only if they come
/// from the same store and name the same record. Two separately appended
/// `(num 1)` nodes are different handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    store: StoreId,
    pos: u32,
}

impl Handle {
    /// Creates a handle. Only the store hands these out.
    pub(crate) const fn new(store: StoreId, pos: u32) -> Self {
        Self { store, pos }
    }

    /// Returns the record position of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.pos
    }

    /// Returns the identity of the owning store.
    #[must_use]
    pub const fn store_id(self) -> StoreId {
        self.store
    }
}

impl PartialOrd for Handle {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Handles order by store, then by creation order.
impl Ord for Handle {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.store, self.pos).cmp(&(other.store, other.pos))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}:{})", self.store.0, self.pos)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.pos)
    }
}
