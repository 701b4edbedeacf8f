//! Errors shared by every strata crate.

use thiserror::Error;

use crate::handle::{Handle, StoreId};

/// Result alias used throughout strata.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Integrity and programming errors raised by the IR substrate.
///
/// All of these abort the current operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A handle from another store was used.
    #[error("handle {handle:?} belongs to {found}, not {expected}")]
    ForeignHandle {
        /// The offending handle.
        handle: Handle,
        /// The store the operation ran on.
        expected: StoreId,
        /// The store that issued the handle.
        found: StoreId,
    },

    /// A handle names a record that does not exist.
    #[error("handle {handle:?} points past the end of the store ({len} records)")]
    DanglingHandle {
        /// The offending handle.
        handle: Handle,
        /// Number of records in the store.
        len: usize,
    },

    /// A node head has no schema in the dialect, or no way to be rewritten.
    #[error("no schema or handler for node kind `{0}`")]
    UnknownNodeKind(String),

    /// Arguments disagree with a schema.
    #[error("schema `{schema}` mismatch: {reason}")]
    SchemaMismatch {
        /// Schema name.
        schema: String,
        /// What disagreed.
        reason: String,
    },

    /// Two families declare the same schema name.
    #[error("schema `{0}` is declared by more than one family")]
    SchemaConflict(String),

    /// A traversal handler demanded a node outside its subgraph.
    #[error("traversal of {node} requested {requested}, which is not one of its descendants")]
    MalformedTraversal {
        /// The node being evaluated.
        node: Handle,
        /// The node it demanded.
        requested: Handle,
    },
}

impl Error {
    /// Shorthand for [`Error::SchemaMismatch`].
    pub fn schema_mismatch(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}
