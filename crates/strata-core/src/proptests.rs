//! Property-based tests over randomly shaped DAGs.

#[cfg(test)]
mod tests {
    use hashbrown::{HashMap, HashSet};
    use proptest::prelude::*;

    use crate::{apply_bottomup, traverse, Handle, Reachability, Step, Store, Value};

    /// A node is either a literal leaf or a pair of earlier node indices.
    #[derive(Clone, Debug)]
    enum Shape {
        Leaf(i64),
        Pair(usize, usize),
    }

    fn shapes() -> impl Strategy<Value = Vec<Shape>> {
        prop::collection::vec(
            prop_oneof![
                (-50i64..50).prop_map(Shape::Leaf),
                (any::<usize>(), any::<usize>()).prop_map(|(l, r)| Shape::Pair(l, r)),
            ],
            1..40,
        )
    }

    fn build(shapes: &[Shape]) -> (Store, Vec<Handle>) {
        let mut store = Store::new();
        let mut nodes: Vec<Handle> = Vec::new();
        for shape in shapes {
            let h = match *shape {
                Shape::Pair(l, r) if !nodes.is_empty() => {
                    let (l, r) = (nodes[l % nodes.len()], nodes[r % nodes.len()]);
                    store.append("pair", [l, r]).unwrap()
                }
                Shape::Pair(..) => store.append("leaf", [0]).unwrap(),
                Shape::Leaf(v) => store.append("leaf", [v]).unwrap(),
            };
            nodes.push(h);
        }
        (store, nodes)
    }

    /// Fully expanded tree text, for comparing graphs across stores.
    fn expand(store: &mut Store, root: Handle) -> String {
        let mut text: HashMap<Handle, String> = HashMap::new();
        let mut visit = |store: &mut Store, h: Handle| -> crate::Result<()> {
            let expr = store.read(h)?;
            let args: Vec<String> = expr
                .args()
                .iter()
                .map(|a| match a {
                    Value::Node(c) => text[c].clone(),
                    lit => lit.to_string(),
                })
                .collect();
            text.insert(h, format!("({} {})", expr.head(), args.join(" ")));
            Ok(())
        };
        apply_bottomup(store, root, &mut visit, Reachability::Computed).unwrap();
        text[&root].clone()
    }

    proptest! {
        #[test]
        fn computed_walk_is_closure_in_topological_order(shapes in shapes()) {
            let (mut store, nodes) = build(&shapes);
            let root = *nodes.last().unwrap();

            let mut order = Vec::new();
            let mut visit = |_: &mut Store, h: Handle| -> crate::Result<()> {
                order.push(h);
                Ok(())
            };
            apply_bottomup(&mut store, root, &mut visit, Reachability::Computed).unwrap();

            let unique: HashSet<Handle> = order.iter().copied().collect();
            prop_assert_eq!(unique.len(), order.len());
            for &h in &nodes {
                prop_assert_eq!(unique.contains(&h), store.contains(root, h).unwrap());
            }
            let position: HashMap<Handle, usize> =
                order.iter().enumerate().map(|(i, h)| (*h, i)).collect();
            for &h in &order {
                for child in store.children(h).unwrap() {
                    prop_assert!(position[&child] < position[&h]);
                }
            }
        }

        #[test]
        fn all_walk_is_creation_prefix(shapes in shapes(), pick in any::<usize>()) {
            let (mut store, nodes) = build(&shapes);
            let root = nodes[pick % nodes.len()];

            let mut order = Vec::new();
            let mut visit = |_: &mut Store, h: Handle| -> crate::Result<()> {
                order.push(h);
                Ok(())
            };
            apply_bottomup(&mut store, root, &mut visit, Reachability::All).unwrap();
            prop_assert_eq!(&order[..], &nodes[..=root.index() as usize]);
        }

        #[test]
        fn copy_preserves_shape_and_compacts(shapes in shapes(), pick in any::<usize>()) {
            let (mut store, nodes) = build(&shapes);
            let root = nodes[pick % nodes.len()];

            let mut fresh = Store::new();
            let copied = store.copy_tree_into(root, &mut fresh).unwrap();

            prop_assert!(fresh.len() <= store.len());
            prop_assert!(fresh.token_count() <= store.token_count());
            prop_assert_eq!(fresh.len(), store.closure([root]).unwrap().len());
            prop_assert_eq!(expand(&mut fresh, copied), expand(&mut store, root));
        }

        #[test]
        fn traverse_runs_each_handler_once(shapes in shapes()) {
            let (mut store, nodes) = build(&shapes);
            let root = *nodes.last().unwrap();

            let mut runs: Vec<Handle> = Vec::new();
            let memo = traverse(
                &mut store,
                root,
                |store, h, runs: &mut Vec<Handle>| {
                    runs.push(h);
                    let expr = store.read(h)?;
                    match expr.args() {
                        [Value::Node(l), Value::Node(r)] => {
                            Ok(Step::demand_all([*l, *r], |_, _, v: Vec<i64>| Ok(Step::Done(v[0] + v[1]))))
                        }
                        [Value::Int(v)] => Ok(Step::Done(*v)),
                        _ => Ok(Step::Done(0)),
                    }
                },
                &mut runs,
            )
            .unwrap();

            let unique: HashSet<Handle> = runs.iter().copied().collect();
            prop_assert_eq!(unique.len(), runs.len());
            prop_assert_eq!(memo.len(), store.closure([root]).unwrap().len());
        }

        #[test]
        fn read_round_trips(values in prop::collection::vec(-1000i64..1000, 0..8), name in "[a-z]{1,6}") {
            let mut store = Store::new();
            let mut args: Vec<Value> = values.iter().copied().map(Value::Int).collect();
            args.push(Value::from(name.as_str()));
            let h = store.append("rec", args.clone()).unwrap();

            let expr = store.read(h).unwrap();
            prop_assert_eq!(expr.head(), "rec");
            prop_assert_eq!(expr.args(), &args[..]);
        }
    }
}
