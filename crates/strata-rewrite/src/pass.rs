//! The rewrite pass driver.
//!
//! A pass is a table of handlers keyed by node head. It runs bottom-up over
//! the dependency closure of a root, so every handler sees arguments that
//! have already been rewritten. Nodes without a handler go through the
//! default rule, which keeps unchanged nodes (and every reference to them)
//! intact and rebuilds nodes whose arguments changed.

use std::convert::Infallible;
use std::fmt;

use hashbrown::HashMap;
use strata_core::{
    apply_bottomup, Error, Expr, Handle, Memo, Reachability, Result, Store, Value, Visitor,
    REWRITE_HISTORY_HEAD,
};
use tracing::{debug, trace};

/// A rewritten result: a storable value, or a pass-specific value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term<T> {
    /// A literal or node that can be written back into the store.
    Value(Value),
    /// A value only meaningful to the pass (a count, a constant, ...).
    Custom(T),
}

impl<T> Term<T> {
    /// A node result.
    #[must_use]
    pub fn node(handle: Handle) -> Self {
        Term::Value(Value::Node(handle))
    }

    /// Returns the handle for node results.
    #[must_use]
    pub fn as_node(&self) -> Option<Handle> {
        match self {
            Term::Value(v) => v.as_node(),
            Term::Custom(_) => None,
        }
    }

    /// Returns the pass-specific value, if any.
    #[must_use]
    pub fn as_custom(&self) -> Option<&T> {
        match self {
            Term::Custom(t) => Some(t),
            Term::Value(_) => None,
        }
    }

    /// Consumes the term, returning the pass-specific value, if any.
    #[must_use]
    pub fn into_custom(self) -> Option<T> {
        match self {
            Term::Custom(t) => Some(t),
            Term::Value(_) => None,
        }
    }
}

impl<T> From<Value> for Term<T> {
    fn from(v: Value) -> Self {
        Term::Value(v)
    }
}

impl<T> From<Handle> for Term<T> {
    fn from(h: Handle) -> Self {
        Term::node(h)
    }
}

/// Handler for one node kind: `(store, original, rewritten args) -> result`.
pub type Handler<'h, T> = Box<dyn FnMut(&mut Store, &Expr, &[Term<T>]) -> Result<Term<T>> + 'h>;

/// Replacement for the default rule: also told whether any argument changed.
pub type Fallback<'h, T> =
    Box<dyn FnMut(&mut Store, &Expr, &[Term<T>], bool) -> Result<Term<T>> + 'h>;

/// Configuration for a rewrite pass.
#[derive(Clone, Debug)]
pub struct PassConfig {
    /// Append a `.md.rewrite` record for every replaced node.
    pub record_history: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            record_history: true,
        }
    }
}

/// The default rule.
///
/// Returns `orig` itself when nothing changed. Otherwise appends a node with
/// the same head and the rewritten arguments.
///
/// # Errors
///
/// [`Error::UnknownNodeKind`] if a changed argument is a [`Term::Custom`]
/// and so cannot be stored.
pub fn rewrite_generic<T>(
    store: &mut Store,
    orig: &Expr,
    args: &[Term<T>],
    updated: bool,
) -> Result<Term<T>> {
    if !updated {
        return Ok(Term::node(orig.handle()));
    }

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Term::Value(v) => values.push(v.clone()),
            Term::Custom(_) => return Err(Error::UnknownNodeKind(orig.head().to_string())),
        }
    }
    Ok(Term::node(store.append(orig.head(), values)?))
}

/// A named, per-node-kind rewrite pass.
///
/// `T` is the pass-specific result type; node-to-node passes leave it at
/// the default.
pub struct RewritePass<'h, T = Infallible> {
    name: String,
    config: PassConfig,
    handlers: HashMap<String, Handler<'h, T>>,
    fallback: Option<Fallback<'h, T>>,
    memo: Memo<Term<T>>,
    replaced: usize,
}

impl<'h, T: Clone> RewritePass<'h, T> {
    /// Creates an empty pass. The name is recorded in rewrite history.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: PassConfig::default(),
            handlers: HashMap::new(),
            fallback: None,
            memo: Memo::new(),
            replaced: 0,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PassConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers the handler for `head`.
    #[must_use]
    pub fn on<F>(mut self, head: &str, handler: F) -> Self
    where
        F: FnMut(&mut Store, &Expr, &[Term<T>]) -> Result<Term<T>> + 'h,
    {
        self.add_handler(head, handler);
        self
    }

    /// Registers the handler for `head`, replacing any earlier one.
    pub fn add_handler<F>(&mut self, head: &str, handler: F)
    where
        F: FnMut(&mut Store, &Expr, &[Term<T>]) -> Result<Term<T>> + 'h,
    {
        self.handlers.insert(head.to_string(), Box::new(handler));
    }

    /// Replaces the default rule for heads without a handler.
    #[must_use]
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: FnMut(&mut Store, &Expr, &[Term<T>], bool) -> Result<Term<T>> + 'h,
    {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// The pass identity written into rewrite history.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Results of every node rewritten so far.
    #[must_use]
    pub fn memo(&self) -> &Memo<Term<T>> {
        &self.memo
    }

    /// The result for one node, if it has been rewritten.
    #[must_use]
    pub fn result(&self, node: Handle) -> Option<&Term<T>> {
        self.memo.get(&node)
    }

    /// Number of nodes replaced by something other than themselves.
    #[must_use]
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    /// Rewrites the dependency closure of `root` and returns its result.
    ///
    /// Results are memoized on the pass, so running it again over an
    /// overlapping graph only visits new nodes.
    ///
    /// # Errors
    ///
    /// Propagates handler errors and [`Error::UnknownNodeKind`] from the
    /// default rule.
    pub fn run(&mut self, store: &mut Store, root: Handle) -> Result<Term<T>> {
        let before = self.replaced;
        apply_bottomup(store, root, self, Reachability::Computed)?;
        debug!(
            pass = %self.name,
            root = %root,
            replaced = self.replaced - before,
            "rewrite pass finished"
        );
        match self.memo.get(&root) {
            Some(term) => Ok(term.clone()),
            None => Err(Error::UnknownNodeKind(store.head(root)?.to_string())),
        }
    }

    fn dispatch(&mut self, store: &mut Store, orig: &Expr) -> Result<Term<T>> {
        let mut updated = false;
        let args: Vec<Term<T>> = orig
            .args()
            .iter()
            .map(|arg| match arg {
                Value::Node(child) => {
                    let term = self.memo[child].clone();
                    if term.as_node() != Some(*child) {
                        updated = true;
                    }
                    term
                }
                literal => Term::Value(literal.clone()),
            })
            .collect();

        if let Some(handler) = self.handlers.get_mut(orig.head()) {
            return handler(store, orig, &args);
        }
        match self.fallback.as_mut() {
            Some(fallback) => fallback(store, orig, &args, updated),
            None => rewrite_generic(store, orig, &args, updated),
        }
    }
}

impl<T: Clone> Visitor for RewritePass<'_, T> {
    fn visit(&mut self, store: &mut Store, node: Handle) -> Result<()> {
        if self.memo.contains_key(&node) {
            return Ok(());
        }

        let orig = store.read(node)?;
        let result = self.dispatch(store, &orig)?;

        if let Some(new) = result.as_node() {
            if new != node {
                self.replaced += 1;
                trace!(pass = %self.name, from = %node, to = %new, "replaced");
                if self.config.record_history {
                    store.append(
                        REWRITE_HISTORY_HEAD,
                        [
                            Value::from(self.name.as_str()),
                            Value::Node(new),
                            Value::Node(node),
                        ],
                    )?;
                }
            }
        }
        self.memo.insert(node, result);
        Ok(())
    }
}

impl<T> fmt::Debug for RewritePass<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut heads: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        heads.sort_unstable();
        f.debug_struct("RewritePass")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("handlers", &heads)
            .field("fallback", &self.fallback.is_some())
            .field("memoized", &self.memo.len())
            .finish()
    }
}
