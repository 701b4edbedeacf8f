//! # Strata
//!
//! An expression IR toolkit for compiler passes.
//!
//! Expressions live in an append-only [`Store`](core::Store) and are
//! referenced by positional handles. On top of that sit a memoized traversal
//! engine, per-node-kind rewrite passes, typed grammars and a sharing-aware
//! printer.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let mut store = Store::new();
//! let one = store.append("num", [1]).unwrap();
//! let two = store.append("num", [2]).unwrap();
//! let sum = store.append("add", [one, two]).unwrap();
//!
//! let mut fold: RewritePass<'_, i64> = RewritePass::new("fold")
//!     .on("num", |_, e, _| Ok(Term::Custom(e.args()[0].as_int().unwrap_or(0))))
//!     .on("add", |_, _, args| {
//!         let total: i64 = args.iter().filter_map(Term::as_custom).sum();
//!         Ok(Term::Custom(total))
//!     });
//! assert_eq!(fold.run(&mut store, sum).unwrap(), Term::Custom(3));
//! assert_eq!(pretty_print(&store, sum).unwrap(), "(add (num 1) (num 2))");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use strata_core as core;
pub use strata_grammar as grammar;
pub use strata_print as print;
pub use strata_rewrite as rewrite;

pub use strata_grammar::{define_family, dialect};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use strata_core::{
        apply_bottomup, traverse, Error, Expr, Handle, Memo, Reachability, Result, Step, Store,
        Value, Visitor,
    };
    pub use strata_grammar::{define_family, dialect, Builder, Family, Grammar, Rule};
    pub use strata_print::pretty_print;
    pub use strata_rewrite::{lineage, provenance, PassConfig, RewritePass, Term};
}
