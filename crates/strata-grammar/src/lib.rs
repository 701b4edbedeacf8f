//! # strata-grammar
//!
//! Typed node kinds for strata stores.
//!
//! - [`Schema`]s describe a node kind by name and fields, with an optional
//!   trailing vararg field
//! - [`define_family!`] declares a family of rules as Rust structs
//! - [`dialect!`] merges families into one [`Grammar`]
//! - [`Grammar::bind`] gives a [`Builder`] that writes schema-checked nodes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

#[doc(hidden)]
pub use strata_core as __core;

pub mod family;
pub mod field;
pub mod grammar;
pub mod schema;

pub use family::Family;
pub use field::{FieldKind, FieldValue};
pub use grammar::{Builder, Grammar, Match};
pub use schema::{Field, FieldData, Rule, Schema};
