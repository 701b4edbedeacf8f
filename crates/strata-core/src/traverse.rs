//! Traversal over the store's dependency graph.
//!
//! Two disciplines are provided:
//!
//! - [`apply_bottomup`]: visit nodes in store order, which is always a
//!   topological order, so a visitor can look up results of every argument
//!   of the node it is visiting.
//! - [`traverse`]: memoized evaluation where a handler asks for the values
//!   of children through [`Step::Demand`] and is resumed once they are known.
//!   The engine runs an explicit work stack, so graph depth never turns into
//!   call-stack depth, and every node's handler runs once.

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::store::Store;

/// Which nodes [`apply_bottomup`] visits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reachability {
    /// Every node positioned at or before the root, reachable or not.
    All,
    /// Only the dependency closure of the root.
    #[default]
    Computed,
}

/// Callback for [`apply_bottomup`].
pub trait Visitor {
    /// Called once per visited node, after all of its arguments.
    ///
    /// # Errors
    ///
    /// Any error aborts the walk.
    fn visit(&mut self, store: &mut Store, node: Handle) -> Result<()>;
}

impl<F> Visitor for F
where
    F: FnMut(&mut Store, Handle) -> Result<()>,
{
    fn visit(&mut self, store: &mut Store, node: Handle) -> Result<()> {
        self(store, node)
    }
}

/// Visits nodes up to and including `root`, in store order.
///
/// Nodes appended by the visitor itself are positioned after `root` and are
/// never visited.
///
/// # Errors
///
/// Fails if `root` is foreign to `store` or the visitor fails.
pub fn apply_bottomup<V>(
    store: &mut Store,
    root: Handle,
    visitor: &mut V,
    reachability: Reachability,
) -> Result<()>
where
    V: Visitor + ?Sized,
{
    let root_pos = store.check(root)? as u32;
    let order: Vec<u32> = match reachability {
        Reachability::All => (0..=root_pos).collect(),
        Reachability::Computed => store.closure([root])?,
    };

    trace!(root = %root, ?reachability, nodes = order.len(), "bottom-up walk");
    for pos in order {
        let node = store.handle_at(pos as usize);
        visitor.visit(store, node)?;
    }
    Ok(())
}

/// Results of [`traverse`], keyed by node.
pub type Memo<T> = HashMap<Handle, T>;

/// Continuation receiving one demanded value.
pub type Resume<'a, T, S> = Box<dyn FnOnce(&mut Store, &mut S, T) -> Result<Step<'a, T, S>> + 'a>;

/// Continuation receiving several demanded values, in demand order.
pub type ResumeAll<'a, T, S> =
    Box<dyn FnOnce(&mut Store, &mut S, Vec<T>) -> Result<Step<'a, T, S>> + 'a>;

/// What a [`traverse`] handler does next.
pub enum Step<'a, T, S> {
    /// The node's value is known.
    Done(T),
    /// Suspend until the child's value is known, then resume.
    Demand(Handle, Resume<'a, T, S>),
    /// Suspend until every listed child is known, then resume.
    DemandAll(SmallVec<[Handle; 4]>, ResumeAll<'a, T, S>),
}

impl<'a, T: 'a, S: 'a> Step<'a, T, S> {
    /// Requests the value of `child`.
    pub fn demand<F>(child: Handle, resume: F) -> Self
    where
        F: FnOnce(&mut Store, &mut S, T) -> Result<Step<'a, T, S>> + 'a,
    {
        Step::Demand(child, Box::new(resume))
    }

    /// Requests the values of several children at once.
    pub fn demand_all<I, F>(children: I, resume: F) -> Self
    where
        I: IntoIterator<Item = Handle>,
        F: FnOnce(&mut Store, &mut S, Vec<T>) -> Result<Step<'a, T, S>> + 'a,
    {
        Step::DemandAll(children.into_iter().collect(), Box::new(resume))
    }
}

impl<T: std::fmt::Debug, S> std::fmt::Debug for Step<'_, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Done(v) => f.debug_tuple("Done").field(v).finish(),
            Step::Demand(c, _) => f.debug_tuple("Demand").field(c).finish(),
            Step::DemandAll(cs, _) => f.debug_tuple("DemandAll").field(cs).finish(),
        }
    }
}

enum Pending<'a, T, S> {
    One(Resume<'a, T, S>),
    All(ResumeAll<'a, T, S>),
}

enum Frame<'a, T, S> {
    Start(Handle),
    Wait {
        node: Handle,
        children: SmallVec<[Handle; 4]>,
        resume: Pending<'a, T, S>,
    },
}

/// Evaluates `root` with a suspend/resume handler and returns the memo.
///
/// The handler is invoked once per distinct node that is needed. It either
/// finishes with [`Step::Done`] or suspends with [`Step::Demand`]; demanded
/// children are evaluated first and the continuation is resumed with their
/// values. A child's value is computed once no matter how many nodes demand
/// it.
///
/// # Errors
///
/// [`Error::MalformedTraversal`] if a handler demands a node that is not a
/// strict descendant of the node being evaluated; any handler error is
/// propagated.
pub fn traverse<'a, T, S, H>(
    store: &mut Store,
    root: Handle,
    mut handler: H,
    state: &mut S,
) -> Result<Memo<T>>
where
    T: Clone + 'a,
    S: 'a,
    H: FnMut(&mut Store, Handle, &mut S) -> Result<Step<'a, T, S>>,
{
    store.check(root)?;

    let mut memo: Memo<T> = Memo::new();
    let mut stack: Vec<Frame<'a, T, S>> = vec![Frame::Start(root)];
    let mut runs = 0usize;

    while let Some(frame) = stack.pop() {
        let (node, step) = match frame {
            Frame::Start(node) => {
                if memo.contains_key(&node) {
                    continue;
                }
                runs += 1;
                trace!(node = %node, "evaluating");
                (node, handler(store, node, state)?)
            }
            Frame::Wait {
                node,
                children,
                resume,
            } => {
                let step = match resume {
                    Pending::One(k) => {
                        let value = memo[&children[0]].clone();
                        k(store, state, value)?
                    }
                    Pending::All(k) => {
                        let values = children.iter().map(|c| memo[c].clone()).collect();
                        k(store, state, values)?
                    }
                };
                (node, step)
            }
        };

        let (children, resume) = match step {
            Step::Done(value) => {
                memo.insert(node, value);
                continue;
            }
            Step::Demand(child, k) => (smallvec![child], Pending::One(k)),
            Step::DemandAll(children, k) => (children, Pending::All(k)),
        };

        let direct = store.children(node)?;
        for &child in &children {
            // Only demands that skip a level pay for a reachability search.
            let descendant =
                direct.contains(&child) || (child != node && store.contains(node, child)?);
            if !descendant {
                return Err(Error::MalformedTraversal {
                    node,
                    requested: child,
                });
            }
        }
        let missing: SmallVec<[Handle; 4]> = children
            .iter()
            .rev()
            .copied()
            .filter(|c| !memo.contains_key(c))
            .collect();
        stack.push(Frame::Wait {
            node,
            children,
            resume,
        });
        stack.extend(missing.into_iter().map(Frame::Start));
    }

    debug!(root = %root, nodes = memo.len(), runs, "traversal complete");
    Ok(memo)
}
