//! Patterns and the backtracking matcher.
//!
//! A pattern is an ordinary expression in which free positions are wildcard nodes:
//! - [`wildcard`] matches any single value;
//! - [`var`] matches any single value and gives the node a declared type, so that the binder
//!   resolves the pattern's own type; a native type additionally restricts matches to literals
//!   of that type;
//! - [`typed`] matches a single value selected by operation or by type;
//! - [`variadic`] and [`variadic_of`] match zero or more consecutive positional arguments.
//!
//! Names repeat at will: every occurrence of a name must match equal values. The name `_` is
//! anonymous and never binds.
use std::{collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;

use crate::{
    error::{HyError, HyResult},
    expr::{ArgVec, Expression, KwArgs, Operation, Value},
    fold::{self, Parts},
    types::Ty,
};

/// Name matching anything without binding.
pub const ANONYMOUS: &str = "_";

static WILDCARD: Lazy<Operation> = Lazy::new(|| {
    Operation::function("wildcard")
        .param("name", Ty::str())
        .returns(Ty::Any)
        .builtin()
        .build()
});

static TYPED_WILDCARD: Lazy<Operation> = Lazy::new(|| {
    Operation::function("typed_wildcard")
        .param("name", Ty::str())
        .param("selector", Ty::Any)
        .returns(Ty::Any)
        .builtin()
        .build()
});

static VARIADIC_WILDCARD: Lazy<Operation> = Lazy::new(|| {
    Operation::function("variadic_wildcard")
        .param("name", Ty::str())
        .param_default("element", Ty::Any, Value::None)
        .returns(Ty::Any)
        .builtin()
        .build()
});

/// What a [`typed`] wildcard accepts.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Expressions applying this operation.
    Operation(Operation),

    /// Values whose declared type is accepted by this type. Native types only select literals.
    Type(Ty),
}

/// A wildcard node, as recognized in a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wildcard<'a> {
    Single(&'a str),
    /// Name and selector (a qualified operation name as `Str`, or a `Type`).
    Typed(&'a str, &'a Value),
    /// Name and optional element type.
    Variadic(&'a str, Option<&'a Ty>),
}

impl<'a> Wildcard<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Wildcard::Single(name) | Wildcard::Typed(name, _) | Wildcard::Variadic(name, _) => {
                name
            }
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Wildcard::Variadic(..))
    }
}

/// Recognize a wildcard node.
pub fn classify(expr: &Expression) -> Option<Wildcard<'_>> {
    classify_node(expr.operation(), expr.args())
}

fn classify_node<'a>(op: &Operation, args: &'a [Value]) -> Option<Wildcard<'a>> {
    let name = args.first().and_then(Value::as_str)?;
    if op == &*WILDCARD {
        Some(Wildcard::Single(name))
    } else if op == &*TYPED_WILDCARD {
        Some(Wildcard::Typed(name, args.get(1)?))
    } else if op == &*VARIADIC_WILDCARD {
        Some(Wildcard::Variadic(name, args.get(1).and_then(Value::as_type)))
    } else {
        None
    }
}

fn classify_value(value: &Value) -> Option<Wildcard<'_>> {
    value.as_expr().and_then(classify)
}

fn node(operation: &Operation, args: ArgVec, ty: Ty) -> Value {
    Value::Expr(Expression::from_parts(
        operation.clone(),
        args,
        KwArgs::new(),
        ty,
    ))
}

/// A wildcard matching any single value.
pub fn wildcard(name: impl Into<Arc<str>>) -> Value {
    node(&WILDCARD, ArgVec::from_iter([Value::Str(name.into())]), Ty::Any)
}

/// A wildcard of declared type `ty`.
///
/// With a native `ty` (`int`, `bool`, ...), only literals of that type match.
pub fn var(name: impl Into<Arc<str>>, ty: Ty) -> Value {
    if ty.is_native() {
        return typed(name, Selector::Type(ty));
    }
    node(&WILDCARD, ArgVec::from_iter([Value::Str(name.into())]), ty)
}

/// A wildcard matching values chosen by `selector`.
pub fn typed(name: impl Into<Arc<str>>, selector: Selector) -> Value {
    let (selector, ty) = match selector {
        Selector::Operation(op) => {
            let ret = &op.signature().ret;
            let ty = if ret.is_concrete() { ret.clone() } else { Ty::Any };
            (Value::Str(op.qualified().into()), ty)
        }
        Selector::Type(ty) => (Value::Type(ty.clone()), ty),
    };
    node(
        &TYPED_WILDCARD,
        ArgVec::from_iter([Value::Str(name.into()), selector]),
        ty,
    )
}

/// A wildcard matching zero or more consecutive positional arguments.
pub fn variadic(name: impl Into<Arc<str>>) -> Value {
    node(
        &VARIADIC_WILDCARD,
        ArgVec::from_iter([Value::Str(name.into())]),
        Ty::Any,
    )
}

/// A variadic wildcard whose every element must have a type accepted by `element`.
pub fn variadic_of(name: impl Into<Arc<str>>, element: Ty) -> Value {
    node(
        &VARIADIC_WILDCARD,
        ArgVec::from_iter([Value::Str(name.into()), Value::Type(element.clone())]),
        element,
    )
}

/// What a wildcard captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Captured {
    One(Value),
    Many(Vec<Value>),
}

/// Values captured by the wildcards of a successful match, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    captures: BTreeMap<Arc<str>, Captured>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Captured> {
        self.captures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.captures.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<Arc<str>>, captured: Captured) {
        self.captures.insert(name.into(), captured);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Captured)> {
        self.captures.iter().map(|(name, captured)| (&**name, captured))
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    fn mismatch(name: &str, expected: &'static str) -> HyError {
        HyError::BindingMismatch {
            name: name.to_string(),
            expected,
        }
    }

    /// The value captured by a single wildcard.
    pub fn value(&self, name: &str) -> HyResult<&Value> {
        match self.get(name) {
            Some(Captured::One(value)) => Ok(value),
            _ => Err(Self::mismatch(name, "a single value")),
        }
    }

    /// The values captured by a variadic wildcard.
    pub fn values(&self, name: &str) -> HyResult<&[Value]> {
        match self.get(name) {
            Some(Captured::Many(values)) => Ok(values),
            _ => Err(Self::mismatch(name, "a sequence of values")),
        }
    }

    pub fn expr(&self, name: &str) -> HyResult<&Expression> {
        self.value(name)?
            .as_expr()
            .ok_or_else(|| Self::mismatch(name, "an expression"))
    }

    pub fn bool(&self, name: &str) -> HyResult<bool> {
        self.value(name)?
            .as_bool()
            .ok_or_else(|| Self::mismatch(name, "a bool"))
    }

    pub fn int(&self, name: &str) -> HyResult<i64> {
        self.value(name)?
            .as_int()
            .ok_or_else(|| Self::mismatch(name, "an int"))
    }

    pub fn str(&self, name: &str) -> HyResult<&str> {
        self.value(name)?
            .as_str()
            .ok_or_else(|| Self::mismatch(name, "a str"))
    }
}

/// Receives the bindings of a structural match; returning `false` asks for the next one.
type Cont<'k> = &'k mut dyn FnMut(Bindings) -> bool;

/// Enumerate the structural matches of `pattern` against `subject`, in order, until `accept`
/// returns `true`. Returns whether some match was accepted.
pub fn match_with(
    pattern: &Value,
    subject: &Value,
    accept: &mut dyn FnMut(&Bindings) -> bool,
) -> bool {
    match_value(pattern, subject, Bindings::new(), &mut |bindings| {
        accept(&bindings)
    })
}

/// First structural match of `pattern` against `subject`.
pub fn match_first(pattern: &Value, subject: &Value) -> Option<Bindings> {
    let mut found = None;
    match_value(pattern, subject, Bindings::new(), &mut |bindings| {
        found = Some(bindings);
        true
    });
    found
}

fn selects(selector: &Value, subject: &Value) -> bool {
    match selector {
        Value::Type(ty) if ty.is_native() => subject.is_literal() && ty.accepts(&subject.ty()),
        Value::Type(ty) => {
            // The subject must carry a definite tag; `Any` or a variable is not selected.
            let actual = subject.ty();
            matches!(actual, Ty::Con(_) | Ty::TypeOf(_))
                && actual.is_concrete()
                && ty.accepts(&actual)
        }
        Value::Str(qualified) => subject
            .as_expr()
            .is_some_and(|expr| expr.operation().qualified() == &**qualified),
        _ => false,
    }
}

fn bind_one(name: &str, subject: &Value, mut bindings: Bindings, k: Cont<'_>) -> bool {
    if name == ANONYMOUS {
        return k(bindings);
    }
    match bindings.get(name) {
        Some(Captured::One(bound)) if bound == subject => k(bindings),
        Some(_) => false,
        None => {
            bindings.insert(name, Captured::One(subject.clone()));
            k(bindings)
        }
    }
}

fn bind_many(name: &str, subjects: &[Value], mut bindings: Bindings) -> Option<Bindings> {
    if name == ANONYMOUS {
        return Some(bindings);
    }
    match bindings.get(name) {
        Some(Captured::Many(bound)) if bound.as_slice() == subjects => Some(bindings),
        Some(_) => None,
        None => {
            bindings.insert(name, Captured::Many(subjects.to_vec()));
            Some(bindings)
        }
    }
}

fn match_value(pattern: &Value, subject: &Value, bindings: Bindings, k: Cont<'_>) -> bool {
    let Value::Expr(pattern) = pattern else {
        return pattern == subject && k(bindings);
    };

    match classify(pattern) {
        Some(Wildcard::Single(name)) => return bind_one(name, subject, bindings, k),
        Some(Wildcard::Typed(name, selector)) => {
            return selects(selector, subject) && bind_one(name, subject, bindings, k);
        }
        // Variadic wildcards only match inside argument lists.
        Some(Wildcard::Variadic(..)) => return false,
        None => {}
    }

    let Value::Expr(subject) = subject else {
        return false;
    };
    if pattern.ptr_eq(subject) {
        return k(bindings);
    }
    if pattern.operation() != subject.operation()
        || pattern.kwargs().len() != subject.kwargs().len()
        || !pattern
            .kwargs()
            .keys()
            .zip(subject.kwargs().keys())
            .all(|(a, b)| a == b)
    {
        return false;
    }

    let kwargs: Vec<(&Value, &Value)> = pattern
        .kwargs()
        .values()
        .zip(subject.kwargs().values())
        .collect();
    match_seq(pattern.args(), subject.args(), bindings, &mut |bindings| {
        match_pairs(&kwargs, bindings, &mut *k)
    })
}

fn match_pairs(pairs: &[(&Value, &Value)], bindings: Bindings, k: Cont<'_>) -> bool {
    match pairs.split_first() {
        None => k(bindings),
        Some(((pattern, subject), rest)) => {
            match_value(pattern, subject, bindings, &mut |bindings| {
                match_pairs(rest, bindings, &mut *k)
            })
        }
    }
}

fn match_seq(patterns: &[Value], subjects: &[Value], bindings: Bindings, k: Cont<'_>) -> bool {
    let Some((pattern, rest)) = patterns.split_first() else {
        return subjects.is_empty() && k(bindings);
    };

    if let Some(Wildcard::Variadic(name, element)) = classify_value(pattern) {
        // Every remaining non-variadic pattern consumes exactly one subject.
        let reserved = rest
            .iter()
            .filter(|p| !classify_value(p).is_some_and(|w| w.is_variadic()))
            .count();
        let available = subjects.len().saturating_sub(reserved);
        for take in 0..=available {
            let (head, tail) = subjects.split_at(take);
            if element.is_some_and(|element| !head.iter().all(|v| element.accepts(&v.ty()))) {
                break;
            }
            let Some(bindings) = bind_many(name, head, bindings.clone()) else {
                continue;
            };
            if match_seq(rest, tail, bindings, &mut *k) {
                return true;
            }
        }
        return false;
    }

    let Some((subject, tail)) = subjects.split_first() else {
        return false;
    };
    match_value(pattern, subject, bindings, &mut |bindings| {
        match_seq(rest, tail, bindings, &mut *k)
    })
}

/// Collect the wildcards of a pattern or template, in pre-order.
pub fn wildcards(value: &Value) -> Vec<Wildcard<'_>> {
    let mut found = Vec::new();
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        let Value::Expr(expr) = value else {
            continue;
        };
        if let Some(wildcard) = classify(expr) {
            found.push(wildcard);
            continue;
        }
        stack.extend(expr.args().iter().chain(expr.kwargs().values()).rev());
    }
    found
}

/// Instantiate a template with captured bindings.
///
/// Single wildcards are replaced by their value, variadic wildcards are spliced into the
/// argument list holding them, and every rebuilt node goes through the binder again so its
/// declared type reflects the substituted arguments.
pub fn substitute(template: &Value, bindings: &Bindings) -> HyResult<Value> {
    fold::fold(template, &mut |parts: Parts| -> HyResult<Value> {
        if let Some(wildcard) = classify_node(&parts.operation, &parts.args) {
            if !wildcard.is_variadic() {
                return Ok(bindings.value(wildcard.name())?.clone());
            }
            // Spliced by the enclosing node.
            return Ok(Value::Expr(parts.rebuild()));
        }

        let mut args = ArgVec::new();
        for arg in parts.args {
            match classify_value(&arg) {
                Some(Wildcard::Variadic(name, _)) => {
                    args.extend(bindings.values(name)?.iter().cloned())
                }
                _ => args.push(arg),
            }
        }
        let rebuilt = Parts { args, ..parts }.construct()?;
        Ok(Value::Expr(rebuilt))
    })
}
