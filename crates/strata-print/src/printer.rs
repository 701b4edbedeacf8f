//! Sharing-aware rendering.

use hashbrown::{HashMap, HashSet};
use strata_core::{Handle, Result, Store, Value};
use tracing::trace;

use crate::occurrences::Occurrences;

/// Renders `root` and everything it depends on as one string.
///
/// Literals print as `1`, `true` and `"text"`. Simple nodes always print in
/// full. Any other node referenced more than once is expanded at its first
/// rendering with a `[$k]` suffix and printed as `$k` afterwards; labels are
/// numbered in store order. Metadata roots render shallowly.
///
/// # Errors
///
/// Fails if `root` does not belong to `store`.
///
/// # Examples
///
/// ```
/// use strata_core::Store;
/// use strata_print::pretty_print;
///
/// let mut store = Store::new();
/// let a = store.append("num", [1]).unwrap();
/// let b = store.append("num", [2]).unwrap();
/// let c = store.append("add", [a, b]).unwrap();
/// let d = store.append("mul", [c, c]).unwrap();
///
/// assert_eq!(pretty_print(&store, c).unwrap(), "(add (num 1) (num 2))");
/// assert_eq!(
///     pretty_print(&store, d).unwrap(),
///     "(mul (add (num 1) (num 2))[$0] $0)"
/// );
/// ```
pub fn pretty_print(store: &Store, root: Handle) -> Result<String> {
    let expr = store.read(root)?;
    if expr.is_metadata() {
        return Ok(expr.to_string());
    }

    let occurrences = Occurrences::count(store, root)?;
    let mut printer = Printer {
        occurrences: &occurrences,
        formatted: HashMap::with_capacity(occurrences.order().len()),
        simple: HashSet::new(),
        labels: HashMap::new(),
        seen: HashSet::new(),
    };

    for &node in occurrences.order() {
        let expr = store.read(node)?;
        let mut text = format!("({}", expr.head());
        for arg in expr.args() {
            text.push(' ');
            text.push_str(&printer.arg(arg));
        }
        text.push(')');

        if expr.is_simple() {
            printer.simple.insert(node);
        }
        printer.formatted.insert(node, text);
    }

    trace!(
        root = %root,
        nodes = occurrences.order().len(),
        labels = printer.labels.len(),
        "pretty printed"
    );
    Ok(printer.formatted.remove(&root).unwrap_or_default())
}

struct Printer<'a> {
    occurrences: &'a Occurrences,
    formatted: HashMap<Handle, String>,
    simple: HashSet<Handle>,
    labels: HashMap<Handle, usize>,
    seen: HashSet<Handle>,
}

impl Printer<'_> {
    fn arg(&mut self, value: &Value) -> String {
        let Value::Node(node) = value else {
            return value.to_string();
        };
        let node = *node;
        let text = self.formatted.get(&node).cloned().unwrap_or_else(|| node.to_string());
        if self.simple.contains(&node) {
            return text;
        }

        if !self.seen.insert(node) {
            return match self.labels.get(&node) {
                Some(k) => format!("${k}"),
                None => text,
            };
        }

        if self.occurrences.is_shared(node) {
            let next = self.labels.len();
            let k = *self.labels.entry(node).or_insert(next);
            format!("{text}[${k}]")
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Store, [Handle; 4]) {
        let mut store = Store::new();
        let a = store.append("num", [1]).unwrap();
        let b = store.append("num", [2]).unwrap();
        let c = store.append("add", [a, b]).unwrap();
        let d = store.append("sub", [a, a]).unwrap();
        (store, [a, b, c, d])
    }

    #[test]
    fn test_simple_nodes_print_in_full() {
        let (store, [a, _, c, d]) = sample();
        assert_eq!(pretty_print(&store, a).unwrap(), "(num 1)");
        assert_eq!(pretty_print(&store, c).unwrap(), "(add (num 1) (num 2))");
        assert_eq!(pretty_print(&store, d).unwrap(), "(sub (num 1) (num 1))");
    }

    #[test]
    fn test_shared_node_gets_label() {
        let (mut store, [_, _, c, _]) = sample();
        let e = store.append("sub", [c, c]).unwrap();
        assert_eq!(
            pretty_print(&store, e).unwrap(),
            "(sub (add (num 1) (num 2))[$0] $0)"
        );
    }

    #[test]
    fn test_single_reference_has_no_label() {
        let (mut store, [_, _, c, _]) = sample();
        let f = store.append("neg", [c]).unwrap();
        let g = store.append("neg", [f]).unwrap();
        assert_eq!(pretty_print(&store, g).unwrap(), "(neg (neg (add (num 1) (num 2))))");
    }

    #[test]
    fn test_labels_numbered_by_first_expansion() {
        let (mut store, [a, b, c, _]) = sample();
        let m = store.append("mul", [a, b]).unwrap();
        let p1 = store.append("pair", [c, m]).unwrap();
        let p2 = store.append("pair", [m, c]).unwrap();
        let root = store.append("pair", [p1, p2]).unwrap();
        assert_eq!(
            pretty_print(&store, root).unwrap(),
            "(pair (pair (add (num 1) (num 2))[$0] (mul (num 1) (num 2))[$1]) (pair $1 $0))"
        );
    }

    #[test]
    fn test_literals() {
        let mut store = Store::new();
        let s = store.append("sym", ["x y"]).unwrap();
        let t = store
            .append("lit", [Value::Bool(true), Value::Int(-3), Value::Node(s)])
            .unwrap();
        assert_eq!(pretty_print(&store, t).unwrap(), r#"(lit true -3 (sym "x y"))"#);
    }

    #[test]
    fn test_metadata_root_renders_shallow() {
        let (mut store, [a, _, c, _]) = sample();
        let md = store
            .append(".md.rewrite", [Value::from("fold"), Value::Node(a), Value::Node(c)])
            .unwrap();
        assert_eq!(pretty_print(&store, md).unwrap(), r#"(.md.rewrite "fold" #0 #2)"#);
    }

    #[test]
    fn test_copy_prints_identically() {
        let (mut store, [_, _, c, d]) = sample();
        let root = store.append("pair", [c, d, c]).unwrap();

        let mut fresh = Store::new();
        fresh.append("padding", [0]).unwrap();
        let copied = store.copy_tree_into(root, &mut fresh).unwrap();

        assert_eq!(
            pretty_print(&store, root).unwrap(),
            pretty_print(&fresh, copied).unwrap()
        );
        assert_eq!(
            pretty_print(&fresh, copied).unwrap(),
            "(pair (add (num 1) (num 2))[$0] (sub (num 1) (num 1)) $0)"
        );
    }

    #[test]
    fn test_foreign_root_rejected() {
        let (store, _) = sample();
        let mut other = Store::new();
        let h = other.append("num", [1]).unwrap();
        assert!(pretty_print(&store, h).is_err());
    }
}
