//! # strata-rewrite
//!
//! Rewrite passes over strata expression graphs.
//!
//! A pass is written as a set of per-node-kind handlers. The framework
//! provides:
//! - Dependency-ordered invocation: handlers see already-rewritten arguments
//! - A default rule that preserves identity and sharing of untouched nodes
//! - Optional provenance records linking each replacement to its original

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod pass;
pub mod provenance;

pub use pass::{rewrite_generic, Fallback, Handler, PassConfig, RewritePass, Term};
pub use provenance::{lineage, provenance, Provenance};
