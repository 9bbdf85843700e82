//! Placeholders and spreads.
//!
//! A placeholder is an expression whose declared type is a native type: it stands for a value
//! (an `int`, an `Iterable[int]`, ...) that has not been computed. Spreading an
//! `Iterable[T]` placeholder into a call wraps it into a single iterated placeholder node of
//! type `T`, which takes the place of every element it stands for.
use once_cell::sync::Lazy;

use crate::{
    error::TypeError,
    expr::{Expression, Operation, Value},
    types::Ty,
};

/// Wraps an `Iterable[T]` placeholder spread into the arguments of a call.
pub static ITERATED_PLACEHOLDER: Lazy<Operation> = Lazy::new(|| {
    Operation::function("create_iterated_placeholder")
        .param("source", Ty::iterable(Ty::var("T")))
        .returns(Ty::var("T"))
        .builtin()
        .build()
});

/// Build the iterated placeholder standing for the elements of `source`.
pub fn iterate(source: impl Into<Value>) -> Result<Expression, TypeError> {
    iterate_for(ITERATED_PLACEHOLDER.qualified(), source.into())
}

/// Like [`iterate`], reporting errors against `operation`.
pub(crate) fn iterate_for(operation: &str, source: Value) -> Result<Expression, TypeError> {
    let iterable = source
        .as_expr()
        .is_some_and(|expr| expr.ty().iterable_element().is_some());
    if !iterable {
        return Err(TypeError::NotIterable {
            operation: operation.to_string(),
            found: source.ty(),
        });
    }
    ITERATED_PLACEHOLDER.call([source])
}

/// Whether `value` is an iterated placeholder.
pub fn is_iterated(value: &Value) -> bool {
    value
        .as_expr()
        .is_some_and(|expr| expr.operation() == &*ITERATED_PLACEHOLDER)
}

/// The iterable placeholder an iterated placeholder was built from.
pub fn iterated_source(expr: &Expression) -> Option<&Expression> {
    if expr.operation() != &*ITERATED_PLACEHOLDER {
        return None;
    }
    expr.arg(0).and_then(Value::as_expr)
}
