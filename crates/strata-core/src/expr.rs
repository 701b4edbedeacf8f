//! Record and value types.
//!
//! [`Slot`] is the compact form kept inside the store; [`Value`] and [`Expr`]
//! are what callers append and read back.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::handle::Handle;
use crate::intern::TokenId;

/// Head prefix reserved for metadata records.
pub const METADATA_PREFIX: &str = ".md.";

/// Head of the record written for every rewrite replacement.
pub const REWRITE_HISTORY_HEAD: &str = ".md.rewrite";

/// An argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A 64-bit integer literal, stored inline.
    Int(i64),
    /// A boolean literal, stored inline.
    Bool(bool),
    /// A string or symbol atom, stored through the interning table.
    Str(Arc<str>),
    /// A reference to another node.
    Node(Handle),
}

impl Value {
    /// Returns the handle if this value is a node reference.
    #[must_use]
    pub fn as_node(&self) -> Option<Handle> {
        match self {
            Value::Node(h) => Some(*h),
            _ => None,
        }
    }

    /// Returns the integer if this value is an integer literal.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this value is a string atom.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this value is a node reference.
    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::Str(v)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Node(h)
    }
}

/// Literal rendering used by dumps and the pretty-printer.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Node(h) => write!(f, "{h}"),
        }
    }
}

/// An argument as kept inside a store record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Int(i64),
    Bool(bool),
    Token(TokenId),
    Node(u32),
}

/// A stored record.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub(crate) head: TokenId,
    pub(crate) args: SmallVec<[Slot; 4]>,
}

impl Record {
    /// Positions of node-valued arguments, in argument order.
    pub(crate) fn child_positions(&self) -> impl Iterator<Item = u32> + '_ {
        self.args.iter().filter_map(|slot| match slot {
            Slot::Node(pos) => Some(*pos),
            _ => None,
        })
    }
}

/// A node read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    handle: Handle,
    head: Arc<str>,
    args: SmallVec<[Value; 4]>,
}

impl Expr {
    pub(crate) fn new(handle: Handle, head: Arc<str>, args: SmallVec<[Value; 4]>) -> Self {
        Self { handle, head, args }
    }

    /// The handle this expression was read from.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The node kind.
    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    /// The arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Node-valued arguments in argument order, duplicates included.
    pub fn children(&self) -> impl Iterator<Item = Handle> + '_ {
        self.args.iter().filter_map(Value::as_node)
    }

    /// Returns true if no argument is a node.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        !self.args.iter().any(Value::is_node)
    }

    /// Returns true for metadata records such as rewrite history.
    #[must_use]
    pub fn is_metadata(&self) -> bool {
        self.head.starts_with(METADATA_PREFIX)
    }
}

/// Shallow rendering: node arguments print as `#pos`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.head)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, ")")
    }
}
