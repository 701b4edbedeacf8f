//! # strata-core
//!
//! Expression substrate for the strata compiler-pass toolkit.
//!
//! This crate provides:
//! - An append-only [`Store`] of expression records with atom interning
//! - Store-scoped [`Handle`]s with positional identity
//! - Parent, child and reachability queries, and compacting copies
//! - Bottom-up visiting and memoized suspend/resume evaluation
//!
//! ## Design Principles
//!
//! - **Append-only**: records are never mutated, every edit is a new append
//! - **Positional identity**: no hash-consing, sharing is explicit
//! - **Store order is topological**: children always precede their parents

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod expr;
pub mod handle;
pub mod intern;
pub mod store;
pub mod traverse;

#[cfg(test)]
mod proptests;

pub use error::{Error, Result};
pub use expr::{Expr, Value, METADATA_PREFIX, REWRITE_HISTORY_HEAD};
pub use handle::{Handle, StoreId};
pub use store::{Parents, Store};
pub use traverse::{apply_bottomup, traverse, Memo, Reachability, Resume, ResumeAll, Step, Visitor};
