//! # strata-print
//!
//! Canonical text for expressions in a strata store.
//!
//! Nodes render as `(head arg ...)`. A node referenced more than once inside
//! the printed graph is expanded where it first appears, tagged `[$k]`, and
//! printed as `$k` everywhere after.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod occurrences;
pub mod printer;

pub use occurrences::Occurrences;
pub use printer::pretty_print;
