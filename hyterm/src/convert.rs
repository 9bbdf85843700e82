//! Conversion of values into expressions of a requested type.
//!
//! A conversion request is the expression `Converter[T].convert(value)` of type `Maybe[T]`.
//! Client domains register rules in the [`CONVERT`] registry rewriting requests into
//! `Maybe.just(result)`; [`Rewriter::convert`] builds the request, executes it and extracts the
//! payload. Requests no rule answers stay unresolved and convert to `None`.
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::{
    error::{HyResult, TypeError},
    expr::{Expression, Operation, Value},
    expr_class,
    rules::{CONVERT, Replacement, Rule, engine::Rewriter},
    types::Ty,
};

/// Name of the optional-value class.
pub const MAYBE: &str = "Maybe";

/// Name of the conversion-request class.
pub const CONVERTER: &str = "Converter";

/// `Maybe[inner]`
pub fn maybe_ty(inner: Ty) -> Ty {
    Ty::generic(MAYBE, [inner])
}

/// `Converter[target]`
pub fn converter_ty(target: Ty) -> Ty {
    Ty::generic(CONVERTER, [target])
}

/// `Maybe.just(value: T) -> Maybe[T]`
pub static MAYBE_JUST: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&maybe_ty(Ty::var("T")), "just")
        .param("value", Ty::var("T"))
        .returns(maybe_ty(Ty::var("T")))
        .build()
});

/// `Maybe[T].nothing() -> Maybe[T]`
pub static MAYBE_NOTHING: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&maybe_ty(Ty::var("T")), "nothing")
        .returns(maybe_ty(Ty::var("T")))
        .build()
});

/// `Converter[T].convert(value) -> Maybe[T]`
pub static CONVERTER_CONVERT: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&converter_ty(Ty::var("T")), "convert")
        .param("value", Ty::Any)
        .returns(maybe_ty(Ty::var("T")))
        .build()
});

expr_class! {
    /// An optional value: `Maybe.just(x)` or `Maybe[T].nothing()`.
    pub struct Maybe = "Maybe";
}

impl Maybe {
    /// The wrapped value of a `just`.
    pub fn payload(&self) -> Option<&Value> {
        if self.0.operation() == &*MAYBE_JUST {
            self.0.arg(1)
        } else {
            None
        }
    }

    pub fn is_nothing(&self) -> bool {
        self.0.operation() == &*MAYBE_NOTHING
    }
}

/// `Maybe.just(value)`
pub fn just(value: impl Into<Value>) -> Result<Expression, TypeError> {
    let value: Value = value.into();
    MAYBE_JUST.call_class(&Ty::class(MAYBE), [value])
}

/// `Maybe[inner].nothing()`
pub fn nothing(inner: Ty) -> Result<Expression, TypeError> {
    MAYBE_NOTHING.call_class(&maybe_ty(inner), [])
}

/// `Converter[target].convert(value)`
pub fn convert_request(target: Ty, value: impl Into<Value>) -> Result<Expression, TypeError> {
    let value: Value = value.into();
    CONVERTER_CONVERT.call_class(&converter_ty(target), [value])
}

/// The payload of a `Maybe.just(..)` value.
pub fn unwrap_just(value: &Value) -> Option<Value> {
    value
        .as_expr()
        .and_then(Expression::downcast::<Maybe>)
        .and_then(|maybe| maybe.payload().cloned())
}

/// A [`CONVERT`] rule answering `Converter[target].convert(source)` with
/// `Maybe.just(result)`.
///
/// `source` is a pattern and `result` a template over its wildcards.
pub fn conversion_rule(
    name: impl Into<Arc<str>>,
    target: Ty,
    source: impl Into<Value>,
    result: impl Into<Value>,
) -> Result<Rule, TypeError> {
    Ok(Rule::new(
        name,
        convert_request(target, source)?,
        Replacement::template(just(result)?),
    ))
}

impl Rewriter<'_> {
    /// Convert `value` into a value of type `target` with the [`CONVERT`] registry.
    ///
    /// Values already of type `target` are returned as is. Returns `None` when no rule answers
    /// the request.
    pub fn convert(&self, value: impl Into<Value>, target: &Ty) -> HyResult<Option<Value>> {
        let value = value.into();
        if value.ty() == *target {
            return Ok(Some(value));
        }
        let request = convert_request(target.clone(), value)?;
        let result = self.execute(request, CONVERT)?;
        Ok(unwrap_just(&result))
    }
}
