use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use hyterm::args;
use hyterm::expr::placeholder;
use hyterm::fold::{fold_expr, identity};
use hyterm::prelude::*;

fn node() -> Operation {
    Operation::function("node")
        .variadic("children", Ty::Any)
        .keyword_default("label", Ty::Any, ())
        .returns(Ty::class("Term"))
        .build()
}

fn wrap() -> Operation {
    Operation::function("wrap")
        .param("x", Ty::var("T"))
        .returns(Ty::generic("Wrapped", [Ty::var("T")]))
        .build()
}

/// `items(n: int) -> Iterable[int]`
fn items() -> Operation {
    Operation::function("items")
        .param("n", Ty::int())
        .returns(Ty::iterable(Ty::int()))
        .build()
}

fn random_leaf(rng: &mut ChaCha20Rng) -> Value {
    match rng.random_range(0..5) {
        4 => items()
            .call([Value::Int(rng.random_range(0..5))])
            .unwrap()
            .into(),
        0 => Value::Int(rng.random_range(-100..100)),
        1 => Value::Bool(rng.random_bool(0.5)),
        2 => Value::from(format!("s{}", rng.random_range(0..10))),
        _ => Value::from(vec![Value::Int(rng.random_range(0..5))]),
    }
}

fn random_tree(rng: &mut ChaCha20Rng, depth: usize) -> Value {
    if depth == 0 || rng.random_bool(0.2) {
        return random_leaf(rng);
    }
    let children: Vec<Value> = (0..rng.random_range(0..4))
        .map(|_| random_tree(rng, depth - 1))
        .collect();
    let op = node();
    let mut call = op.apply().args(children);
    if rng.random_bool(0.3) {
        let source = items().call([Value::Int(rng.random_range(0..5))]).unwrap();
        call = call.spread(source).arg(random_leaf(rng));
    }
    if rng.random_bool(0.3) {
        call = call.kwarg("label", random_tree(rng, depth - 1));
    }
    let expr = call.build().unwrap();
    if rng.random_bool(0.3) {
        wrap().call(args![expr]).unwrap().into()
    } else {
        expr.into()
    }
}

fn count_nodes(value: &Value) -> usize {
    value
        .as_expr()
        .map(|expr| expr.descendants().count())
        .unwrap_or(0)
}

#[test]
fn identity_fold_preserves_fixed_trees() {
    let inner = node()
        .apply()
        .args(args![1, "x"])
        .kwarg("label", true)
        .build()
        .unwrap();
    let tree: Value = wrap().call(args![node().call(args![inner, 2.5]).unwrap()]).unwrap().into();

    let folded = fold(&tree, &mut identity).unwrap();
    assert_eq!(folded, tree);
    assert_eq!(
        folded.as_expr().unwrap().ty(),
        &Ty::generic("Wrapped", [Ty::class("Term")])
    );
    assert_eq!(fold(&Value::Int(4), &mut identity).unwrap(), Value::Int(4));
}

#[test]
fn identity_fold_preserves_placeholders_and_spreads() {
    let source = items().call(args![3]).unwrap();
    assert!(source.is_placeholder());

    // wrap(node(1, *items(3), 2, label=items(3)))
    let op = node();
    let spread = op
        .apply()
        .arg(1)
        .spread(source.clone())
        .arg(2)
        .kwarg("label", source.clone())
        .build()
        .unwrap();
    let tree: Value = wrap().call([Value::Expr(spread)]).unwrap().into();

    let folded = fold(&tree, &mut identity).unwrap();
    assert_eq!(folded, tree);
    let before: Vec<Ty> = tree.as_expr().unwrap().descendants().map(|e| e.ty().clone()).collect();
    let after: Vec<Ty> = folded.as_expr().unwrap().descendants().map(|e| e.ty().clone()).collect();
    assert_eq!(before, after);

    let inner = folded.as_expr().unwrap().arg(0).and_then(Value::as_expr).unwrap();
    assert_eq!(inner.args().len(), 3);
    assert!(placeholder::is_iterated(&inner.args()[1]));
    let iterated = inner.args()[1].as_expr().unwrap();
    assert_eq!(placeholder::iterated_source(iterated), Some(&source));
    assert_eq!(inner.kwarg("label"), Some(&Value::Expr(source)));
}

#[test]
fn identity_fold_preserves_random_trees() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let tree = random_tree(&mut rng, 5);
        let folded = fold(&tree, &mut identity).unwrap();
        assert_eq!(folded, tree);
        if let (Some(before), Some(after)) = (tree.as_expr(), folded.as_expr()) {
            let before: Vec<Ty> = before.descendants().map(|e| e.ty().clone()).collect();
            let after: Vec<Ty> = after.descendants().map(|e| e.ty().clone()).collect();
            assert_eq!(before, after);
        }
    }
}

#[test]
fn folders_see_every_node_once_children_first() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    for _ in 0..50 {
        let tree = random_tree(&mut rng, 4);
        let mut seen = 0usize;
        fold(&tree, &mut |parts: Parts| -> HyResult<Value> {
            seen += 1;
            Ok(Value::Expr(parts.rebuild()))
        })
        .unwrap();
        assert_eq!(seen, count_nodes(&tree));
    }

    let tree = node()
        .call(args![node().call(args![1]).unwrap()])
        .unwrap();
    let mut order = Vec::new();
    fold_expr(&tree, &mut |parts: Parts| -> HyResult<Value> {
        order.push(parts.args.len());
        Ok(Value::Expr(parts.rebuild()))
    })
    .unwrap();
    // Inner `node(1)` first, then the root.
    assert_eq!(order, vec![1, 1]);
}

#[test]
fn folders_can_replace_nodes() {
    // Replace every `wrap(x)` by `x`.
    let wrap = wrap();
    let tree: Value = node()
        .call(args![
            wrap.call(args![1]).unwrap(),
            wrap.call(args![wrap.call(args!["s"]).unwrap()]).unwrap()
        ])
        .unwrap()
        .into();

    let unwrapped = fold(&tree, &mut |parts: Parts| -> HyResult<Value> {
        if parts.operation == wrap {
            Ok(parts.args[0].clone())
        } else {
            Ok(Value::Expr(parts.construct()?))
        }
    })
    .unwrap();
    assert_eq!(unwrapped, node().call(args![1, "s"]).unwrap().into());
}

#[test]
fn struct_folders_are_supported() {
    struct Relabel;

    impl Folder for Relabel {
        fn transform(&mut self, mut parts: Parts) -> HyResult<Value> {
            if parts.kwargs.contains_key("label") {
                parts.kwargs.insert("label".into(), "relabelled".into());
            }
            Ok(Value::Expr(parts.rebuild()))
        }
    }

    let tree = node()
        .apply()
        .arg(node().apply().kwarg("label", 1).build().unwrap())
        .kwarg("label", 2)
        .build()
        .unwrap();
    let folded = fold_expr(&tree, &mut Relabel).unwrap();
    let folded = folded.as_expr().unwrap();
    assert_eq!(folded.kwarg("label"), Some(&Value::from("relabelled")));
    let inner = folded.arg(0).and_then(Value::as_expr).unwrap();
    assert_eq!(inner.kwarg("label"), Some(&Value::from("relabelled")));
}

#[test]
fn errors_abort_the_fold() {
    let tree = node().call(args![node().call([]).unwrap()]).unwrap();
    let err = fold_expr(&tree, &mut |_: Parts| -> HyResult<Value> {
        Err(HyError::RegistryNotFound("none".to_string()))
    })
    .unwrap_err();
    assert!(err.is_registry_not_found());
}

#[test]
fn deep_trees_fold_without_recursion() {
    let node = node();
    let mut tree = Value::Int(0);
    for _ in 0..1_000 {
        tree = node.call([tree]).unwrap().into();
    }
    let folded = fold(&tree, &mut identity).unwrap();
    assert_eq!(folded, tree);
}
