use hyterm::args;
use hyterm::prelude::*;
use hyterm::rules::pattern::{self, Wildcard};

fn term() -> Ty {
    Ty::class("Term")
}

fn seq() -> Operation {
    Operation::function("seq")
        .variadic("items", Ty::Any)
        .returns(term())
        .build()
}

fn pair() -> Operation {
    Operation::function("pair")
        .param("a", Ty::Any)
        .param("b", Ty::Any)
        .returns(term())
        .build()
}

fn length() -> Operation {
    Operation::function("length")
        .param("xs", Ty::Any)
        .returns(Ty::int())
        .build()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

fn captured_ints(bindings: &Bindings, name: &str) -> Vec<i64> {
    bindings
        .values(name)
        .unwrap()
        .iter()
        .map(|v| v.as_int().unwrap())
        .collect()
}

#[test]
fn single_wildcards_bind_whole_subtrees() {
    let inner = seq().call(args![1, 2]).unwrap();
    let subject: Value = pair().call(args![inner.clone(), "x"]).unwrap().into();
    let pattern: Value = pair()
        .call([wildcard("left"), wildcard("right")])
        .unwrap()
        .into();

    let bindings = pattern::match_first(&pattern, &subject).unwrap();
    assert_eq!(bindings.expr("left").unwrap(), &inner);
    assert_eq!(bindings.str("right").unwrap(), "x");
    assert_eq!(bindings.len(), 2);
}

#[test]
fn repeated_names_must_capture_equal_values() {
    let pattern: Value = pair().call([wildcard("x"), wildcard("x")]).unwrap().into();

    let same: Value = pair().call(args![1, 1]).unwrap().into();
    let bindings = pattern::match_first(&pattern, &same).unwrap();
    assert_eq!(bindings.int("x").unwrap(), 1);

    let different: Value = pair().call(args![1, 2]).unwrap().into();
    assert!(pattern::match_first(&pattern, &different).is_none());
}

#[test]
fn heads_and_literals_must_agree() {
    let pattern: Value = pair().call([wildcard("x"), 3.into()]).unwrap().into();
    let subject: Value = pair().call(args![1, 4]).unwrap().into();
    assert!(pattern::match_first(&pattern, &subject).is_none());

    let other_head: Value = seq().call(args![1, 3]).unwrap().into();
    assert!(pattern::match_first(&pattern, &other_head).is_none());
}

#[test]
fn variadic_wildcards_capture_runs() {
    let pattern: Value = seq()
        .call([variadic("before"), 3.into(), variadic("after")])
        .unwrap()
        .into();
    let subject: Value = seq().call(ints(&[1, 2, 3, 4, 3])).unwrap().into();

    // Shortest prefix first.
    let bindings = pattern::match_first(&pattern, &subject).unwrap();
    assert_eq!(captured_ints(&bindings, "before"), vec![1, 2]);
    assert_eq!(captured_ints(&bindings, "after"), vec![4, 3]);

    let empty: Value = seq().call([]).unwrap().into();
    let all: Value = seq().call([variadic("xs")]).unwrap().into();
    let bindings = pattern::match_first(&all, &empty).unwrap();
    assert!(bindings.values("xs").unwrap().is_empty());
}

#[test]
fn constraints_backtrack_into_later_splits() {
    let rule = Rule::new(
        "last_three",
        seq()
            .call([variadic("before"), 3.into(), variadic("after")])
            .unwrap(),
        Replacement::template(seq().call([variadic("before")]).unwrap()),
    )
    .with_constraint(Constraint::predicate(["after"], |bindings| {
        bindings.values("after").is_ok_and(<[Value]>::is_empty)
    }));

    let subject: Value = seq().call(ints(&[1, 2, 3, 4, 3])).unwrap().into();
    let bindings = rule.matches(&subject).unwrap();
    assert_eq!(captured_ints(&bindings, "before"), vec![1, 2, 3, 4]);

    let rewritten = rule.apply(&subject).unwrap().unwrap();
    assert_eq!(rewritten, seq().call(ints(&[1, 2, 3, 4])).unwrap().into());
}

#[test]
fn repeated_variadic_names_capture_equal_runs() {
    let pattern: Value = seq()
        .call([variadic("xs"), variadic("xs")])
        .unwrap()
        .into();

    let doubled: Value = seq().call(ints(&[1, 2, 1, 2])).unwrap().into();
    let bindings = pattern::match_first(&pattern, &doubled).unwrap();
    assert_eq!(captured_ints(&bindings, "xs"), vec![1, 2]);

    let odd: Value = seq().call(ints(&[1, 2, 3])).unwrap().into();
    assert!(pattern::match_first(&pattern, &odd).is_none());
}

#[test]
fn variadic_element_types_restrict_matches() {
    let pattern: Value = seq()
        .call([variadic_of("xs", Ty::int())])
        .unwrap()
        .into();

    let numbers: Value = seq().call(args![1, 2]).unwrap().into();
    assert!(pattern::match_first(&pattern, &numbers).is_some());

    let mixed: Value = seq().call(args![1, "s"]).unwrap().into();
    assert!(pattern::match_first(&pattern, &mixed).is_none());
}

#[test]
fn native_typed_wildcards_only_match_literals() {
    let pattern: Value = pair()
        .call([var("n", Ty::int()), wildcard("_")])
        .unwrap()
        .into();

    let literal: Value = pair().call(args![4, 0]).unwrap().into();
    let bindings = pattern::match_first(&pattern, &literal).unwrap();
    assert_eq!(bindings.int("n").unwrap(), 4);
    assert!(!bindings.contains("_"));

    // An int-typed placeholder is not a literal.
    let unknown = length().call(args!["xs"]).unwrap();
    let placeholder: Value = pair().call(args![unknown, 0]).unwrap().into();
    assert!(pattern::match_first(&pattern, &placeholder).is_none());
}

#[test]
fn selectors_pick_operations_and_classes() {
    let by_operation: Value = pair()
        .call([typed("s", Selector::Operation(seq())), wildcard("_")])
        .unwrap()
        .into();
    let by_class: Value = pair()
        .call([typed("t", Selector::Type(term())), wildcard("_")])
        .unwrap()
        .into();

    let with_seq: Value = pair()
        .call(args![seq().call([]).unwrap(), 0])
        .unwrap()
        .into();
    let with_pair: Value = pair()
        .call(args![pair().call(args![1, 2]).unwrap(), 0])
        .unwrap()
        .into();
    let with_int: Value = pair().call(args![1, 0]).unwrap().into();

    assert!(pattern::match_first(&by_operation, &with_seq).is_some());
    assert!(pattern::match_first(&by_operation, &with_pair).is_none());

    assert!(pattern::match_first(&by_class, &with_seq).is_some());
    assert!(pattern::match_first(&by_class, &with_pair).is_some());
    assert!(pattern::match_first(&by_class, &with_int).is_none());
}

#[test]
fn class_selectors_need_a_definite_type() {
    let by_class: Value = pair()
        .call([typed("b", Selector::Type(Ty::class("Boolean"))), wildcard("_")])
        .unwrap()
        .into();

    let mystery = Operation::function("mystery").returns(Ty::Any).build();
    let untyped: Value = pair()
        .call(args![mystery.call([]).unwrap(), 0])
        .unwrap()
        .into();
    assert!(pattern::match_first(&by_class, &untyped).is_none());

    let truth = Operation::function("truth")
        .returns(Ty::class("Boolean"))
        .build();
    let typed_subject: Value = pair()
        .call(args![truth.call([]).unwrap(), 0])
        .unwrap()
        .into();
    assert!(pattern::match_first(&by_class, &typed_subject).is_some());

    // The lenient binding still lets an untyped value fill a Boolean slot.
    assert!(Ty::class("Boolean").accepts(&Ty::Any));
}

#[test]
fn client_operations_never_pose_as_wildcards() {
    let imposter = Operation::function("wildcard")
        .param("name", Ty::str())
        .returns(Ty::Any)
        .build();
    let f = Operation::function("f").param("x", Ty::Any).returns(term()).build();

    let lookalike = imposter.call(args!["k"]).unwrap();
    assert!(!lookalike.operation().is_builtin());
    assert!(pattern::classify(&lookalike).is_none());
    assert_ne!(lookalike.operation(), wildcard("k").as_expr().unwrap().operation());

    // A call of the client operation is a literal part of the pattern.
    let pattern: Value = f.call([Value::Expr(lookalike.clone())]).unwrap().into();
    let subject: Value = f.call(args![99]).unwrap().into();
    assert!(pattern::match_first(&pattern, &subject).is_none());
    assert!(pattern::match_first(&pattern, &pattern).is_some());

    let real: Value = f.call([wildcard("k")]).unwrap().into();
    let bindings = pattern::match_first(&real, &subject).unwrap();
    assert_eq!(bindings.int("k").unwrap(), 99);
}

#[test]
fn keyword_arguments_match_by_name() {
    let tagged = Operation::function("tagged")
        .param("value", Ty::Any)
        .keyword_default("tag", Ty::Any, ())
        .returns(term())
        .build();

    let pattern: Value = tagged
        .apply()
        .arg(wildcard("v"))
        .kwarg("tag", wildcard("t"))
        .build()
        .unwrap()
        .into();

    let subject: Value = tagged
        .apply()
        .arg(1)
        .kwarg("tag", "red")
        .build()
        .unwrap()
        .into();
    let bindings = pattern::match_first(&pattern, &subject).unwrap();
    assert_eq!(bindings.str("t").unwrap(), "red");

    // The keyword sets differ.
    let untagged: Value = tagged.call(args![1]).unwrap().into();
    assert!(pattern::match_first(&pattern, &untagged).is_none());
}

#[test]
fn match_with_enumerates_every_split() {
    let pattern: Value = seq()
        .call([variadic("a"), variadic("b")])
        .unwrap()
        .into();
    let subject: Value = seq().call(ints(&[1, 2, 3])).unwrap().into();

    let mut splits = Vec::new();
    let accepted = pattern::match_with(&pattern, &subject, &mut |bindings| {
        splits.push(bindings.values("a").unwrap().len());
        false
    });
    assert!(!accepted);
    assert_eq!(splits, vec![0, 1, 2, 3]);
}

#[test]
fn substitution_splices_variadic_captures() {
    let pattern: Value = pair()
        .call([
            seq().call([variadic("xs")]).unwrap().into(),
            wildcard("y"),
        ])
        .unwrap()
        .into();
    let template: Value = seq()
        .call([0.into(), variadic("xs"), wildcard("y")])
        .unwrap()
        .into();

    let subject: Value = pair()
        .call(args![seq().call(args![1, 2]).unwrap(), 9])
        .unwrap()
        .into();
    let bindings = pattern::match_first(&pattern, &subject).unwrap();
    let result = pattern::substitute(&template, &bindings).unwrap();
    assert_eq!(result, seq().call(ints(&[0, 1, 2, 9])).unwrap().into());
}

#[test]
fn substitution_rebinds_declared_types() {
    let identity = Operation::function("identity")
        .param("x", Ty::var("T"))
        .returns(Ty::var("T"))
        .build();
    let template: Value = identity.call([wildcard("x")]).unwrap().into();

    let mut bindings = Bindings::new();
    bindings.insert("x", Captured::One("s".into()));
    let result = pattern::substitute(&template, &bindings).unwrap();
    assert_eq!(result.as_expr().unwrap().ty(), &Ty::str());
}

#[test]
fn wildcards_are_listed_in_pre_order() {
    let pattern: Value = pair()
        .call([
            seq().call([wildcard("a"), variadic("rest")]).unwrap().into(),
            var("n", Ty::int()),
        ])
        .unwrap()
        .into();
    let names: Vec<(&str, bool)> = pattern::wildcards(&pattern)
        .into_iter()
        .map(|w| (w.name(), w.is_variadic()))
        .collect();
    assert_eq!(names, vec![("a", false), ("rest", true), ("n", false)]);
    assert!(pattern::classify(pattern.as_expr().unwrap()).is_none());
    assert_eq!(
        pattern::classify(wildcard("z").as_expr().unwrap()),
        Some(Wildcard::Single("z"))
    );
}

#[test]
fn malformed_rules_are_rejected() {
    let bare = Rule::new("bare", wildcard("x"), Replacement::template(wildcard("x")));
    assert!(bare.validate().unwrap_err().is_no_concrete_head());

    let unbound = Rule::new(
        "unbound",
        pair().call([wildcard("x"), wildcard("y")]).unwrap(),
        Replacement::template(wildcard("z")),
    );
    assert_eq!(
        unbound.validate().unwrap_err(),
        RuleError::UnboundTemplateName {
            rule: "unbound".to_string(),
            name: "z".to_string(),
        }
    );

    let mixed = Rule::new(
        "mixed",
        seq().call([wildcard("x"), variadic("x")]).unwrap(),
        Replacement::template(0),
    );
    assert!(mixed.validate().unwrap_err().is_mixed_wildcard_arity());

    let spliced_single = Rule::new(
        "spliced_single",
        pair().call([wildcard("x"), wildcard("y")]).unwrap(),
        Replacement::template(seq().call([variadic("x")]).unwrap()),
    );
    assert!(spliced_single.validate().unwrap_err().is_mixed_wildcard_arity());

    let constrained = Rule::new(
        "constrained",
        pair().call([wildcard("x"), wildcard("y")]).unwrap(),
        Replacement::template(wildcard("x")),
    )
    .with_constraint(Constraint::equal("x", "w"));
    assert!(
        constrained
            .validate()
            .unwrap_err()
            .is_unbound_constraint_name()
    );

    let mut library = RuleLibrary::new();
    assert!(library.register(DEFAULT, bare).unwrap_err().is_rule());
}

#[test]
fn equality_constraints_compare_captures() {
    let rule = Rule::new(
        "same_pair",
        pair().call([wildcard("a"), wildcard("b")]).unwrap(),
        Replacement::template(wildcard("a")),
    )
    .with_constraint(Constraint::equal("a", "b"));
    assert!(rule.validate().is_ok());

    let same: Value = pair().call(args!["k", "k"]).unwrap().into();
    let different: Value = pair().call(args!["k", "l"]).unwrap().into();
    assert_eq!(rule.apply(&same).unwrap(), Some("k".into()));
    assert_eq!(rule.apply(&different).unwrap(), None);
}

#[test]
fn binding_accessors_report_mismatches() {
    let mut bindings = Bindings::new();
    bindings.insert("one", Captured::One(Value::Int(1)));
    bindings.insert("many", Captured::Many(ints(&[1, 2])));

    assert_eq!(bindings.int("one").unwrap(), 1);
    assert!(bindings.str("one").unwrap_err().is_binding_mismatch());
    assert!(bindings.value("many").unwrap_err().is_binding_mismatch());
    assert!(bindings.values("one").unwrap_err().is_binding_mismatch());
    assert!(bindings.expr("missing").unwrap_err().is_binding_mismatch());
    assert_eq!(
        bindings.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["many", "one"]
    );
}
