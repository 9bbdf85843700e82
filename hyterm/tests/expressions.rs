use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use hyterm::args;
use hyterm::convert::convert_request;
use hyterm::prelude::*;

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn term() -> Ty {
    Ty::class("Term")
}

fn node() -> Operation {
    Operation::function("node")
        .variadic("children", Ty::Any)
        .keyword_default("label", Ty::Any, ())
        .returns(term())
        .build()
}

fn leaf(i: i64) -> Expression {
    node().call(args![i]).unwrap()
}

#[test]
fn structurally_equal_trees_are_equal_and_hash_alike() {
    let a = node().call(args![leaf(1), leaf(2), "x"]).unwrap();
    let b = node().call(args![leaf(1), leaf(2), "x"]).unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let c = node().call(args![leaf(1), leaf(3), "x"]).unwrap();
    assert_ne!(a, c);
}

#[test]
fn operations_are_identified_by_qualified_name() {
    let first = Operation::function("same_name").returns(term()).build();
    let second = Operation::function("same_name").returns(term()).build();
    let other = Operation::function("other_name").returns(term()).build();
    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(first.call([]).unwrap(), second.call([]).unwrap());
}

#[test]
fn keyword_order_does_not_matter() {
    let pair = Operation::function("pair")
        .param("a", Ty::Any)
        .param("b", Ty::Any)
        .returns(term())
        .build();
    let ab = pair.apply().kwarg("a", 1).kwarg("b", 2).build().unwrap();
    let ba = pair.apply().kwarg("b", 2).kwarg("a", 1).build().unwrap();
    assert_eq!(ab, ba);
    assert_eq!(hash_of(&ab), hash_of(&ba));

    // Keyword and positional forms are different calls.
    let positional = pair.call(args![1, 2]).unwrap();
    assert_ne!(ab, positional);
}

#[test]
fn declared_type_does_not_take_part_in_equality() {
    let e = leaf(1);
    let retyped = Expression::from_parts(
        e.operation().clone(),
        e.args().iter().cloned().collect(),
        e.kwargs().clone(),
        Ty::class("Other"),
    );
    assert_eq!(e, retyped);
    assert_ne!(e.ty(), retyped.ty());
}

#[test]
fn class_method_receivers_distinguish_calls() {
    let to_boolean = convert_request(Ty::class("Boolean"), 1).unwrap();
    let to_integer = convert_request(Ty::class("Integer"), 1).unwrap();
    assert_eq!(to_boolean.operation(), to_integer.operation());
    assert_ne!(to_boolean, to_integer);
    assert_eq!(
        to_boolean.ty(),
        &Ty::generic("Maybe", [Ty::class("Boolean")])
    );
}

#[test]
fn expressions_can_be_set_members() {
    let set: HashSet<Expression> = [leaf(1), leaf(2), leaf(1)].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert!(set.contains(&leaf(2)));

    let values: HashSet<Value> = args![1, 1.5, "s", leaf(1), leaf(1)].into_iter().collect();
    assert_eq!(values.len(), 4);
}

#[test]
fn floats_compare_by_bit_pattern() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    assert_ne!(Value::Int(1), Value::Float(1.0));
}

#[test]
fn value_types() {
    assert_eq!(Value::None.ty(), Ty::none());
    assert_eq!(Value::from(true).ty(), Ty::bool());
    assert_eq!(Value::from(vec![Value::Int(1)]).ty(), Ty::list());
    assert_eq!(
        Value::Type(Ty::int()).ty(),
        Ty::type_of(Ty::int())
    );
    assert_eq!(Value::from(leaf(1)).ty(), term());
}

#[derive(Debug, PartialEq, Hash)]
struct Color(u8);

impl NativeType for Color {
    fn native_ty(&self) -> Ty {
        Ty::native("Color")
    }
}

#[test]
fn native_values_compare_dynamically() {
    let red = NativeValue::new(Color(1));
    let also_red = NativeValue::new(Color(1));
    let blue = NativeValue::new(Color(2));

    assert_eq!(red, also_red);
    assert_ne!(red, blue);
    assert_eq!(hash_of(&red), hash_of(&also_red));
    assert_eq!(red.ty(), Ty::native("Color"));
    assert_eq!(red.downcast_ref::<Color>(), Some(&Color(1)));

    let paint = Operation::function("paint")
        .param("color", Ty::native("Color"))
        .returns(term())
        .build();
    assert!(paint.call([Value::Native(red)]).is_ok());
    assert!(paint.call(args![1]).is_err());
}

#[test]
fn descendants_are_visited_in_pre_order() {
    let inner = node().call(args![leaf(2)]).unwrap();
    let root = node()
        .apply()
        .args(args![leaf(1), inner.clone()])
        .kwarg("label", leaf(3))
        .build()
        .unwrap();

    let order: Vec<Expression> = root.descendants().collect();
    assert_eq!(
        order,
        vec![root.clone(), leaf(1), inner, leaf(2), leaf(3)]
    );
}

#[test]
fn with_slot_keeps_the_parent_type() {
    let root = node().call(args![leaf(1), leaf(2)]).unwrap();
    let replaced = root.with_slot(&Slot::Arg(1), Value::Int(7));
    assert_eq!(replaced.arg(1), Some(&Value::Int(7)));
    assert_eq!(replaced.ty(), root.ty());
    assert_eq!(replaced.get(&Slot::Arg(0)), root.get(&Slot::Arg(0)));
}

#[test]
fn rebind_recomputes_the_declared_type() {
    let identity = Operation::function("identity")
        .param("x", Ty::var("T"))
        .returns(Ty::var("T"))
        .build();
    let e = identity.call(args![1]).unwrap();
    let changed = e.with_slot(&Slot::Arg(0), Value::from("s"));
    assert_eq!(changed.ty(), &Ty::int());
    assert_eq!(changed.rebind().unwrap().ty(), &Ty::str());
}

expr_class! {
    /// Terms built by `node`.
    pub struct Term = "Term";
}

impl Term {
    fn children(&self) -> &[Value] {
        self.expr().args()
    }
}

#[test]
fn typed_wrappers_check_the_declared_class() {
    let e = node().call(args![leaf(1), 2]).unwrap();
    let term = e.downcast::<Term>().unwrap();
    assert_eq!(term.children().len(), 2);
    assert_eq!(Expression::from(term.clone()), e);

    let maybe = convert_request(Ty::class("Boolean"), 1).unwrap();
    assert!(maybe.downcast::<Term>().is_none());
}

#[test]
fn native_implementations_evaluate_literals() {
    let add = Operation::function("add")
        .param("a", Ty::int())
        .param("b", Ty::int())
        .returns(Ty::int())
        .implementation(|args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => Err("expected two ints".to_string()),
        })
        .build();
    assert!(add.has_implementation());
    assert_eq!(add.evaluate(&args![1, 2]).unwrap(), Value::Int(3));

    let err = add.evaluate(&args![1, "x"]).unwrap_err();
    assert!(matches!(
        err,
        HyError::Evaluation { ref operation, ref message }
            if operation == "add" && message == "expected two ints"
    ));

    let stub = Operation::function("stub").returns(term()).build();
    assert!(stub.evaluate(&[]).unwrap_err().is_evaluation());
}

#[test]
fn placeholders_are_native_typed_expressions() {
    let length = Operation::function("length")
        .param("xs", Ty::Any)
        .returns(Ty::int())
        .build();
    let placeholder = length.call(args![leaf(1)]).unwrap();
    assert!(placeholder.is_placeholder());
    assert!(!leaf(1).is_placeholder());
}
