//! Integer arithmetic.
//!
//! Literal integers are `Integer.from_int(i)`. Arithmetic on two literals is folded by the
//! [`DEFAULT`] rules; `unbox_integer(x)` is an `int` placeholder the [`UNBOX`] registry answers
//! once `x` is a literal.
use hyterm::{
    convert::conversion_rule,
    error::{HyError, HyResult, TypeError},
    expr::{ExprClass, Expression, Operation, Value},
    expr_class,
    rules::{
        CONVERT, DEFAULT, Replacement, Rule, RuleLibrary, UNBOX,
        engine::Rewriter,
        pattern::{var, wildcard},
    },
    types::Ty,
};
use log::debug;
use once_cell::sync::Lazy;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::boolean::{Boolean, boolean_ty};

/// Name of the integer class.
pub const INTEGER: &str = "Integer";

pub fn integer_ty() -> Ty {
    Ty::class(INTEGER)
}

/// `Integer.from_int(i: int) -> Integer`
pub static FROM_INT: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&integer_ty(), "from_int")
        .param("i", Ty::int())
        .returns(integer_ty())
        .build()
});

/// `Integer.add(self, other: Integer) -> Integer`
pub static ADD: Lazy<Operation> = Lazy::new(|| binary("add", integer_ty()));

/// `Integer.mul(self, other: Integer) -> Integer`
pub static MUL: Lazy<Operation> = Lazy::new(|| binary("mul", integer_ty()));

/// `Integer.eq(self, other: Integer) -> Boolean`
pub static EQ: Lazy<Operation> = Lazy::new(|| binary("eq", boolean_ty()));

/// `unbox_integer(i: Integer) -> int`
pub static UNBOX_INTEGER: Lazy<Operation> = Lazy::new(|| {
    Operation::function("unbox_integer")
        .param("i", integer_ty())
        .returns(Ty::int())
        .build()
});

fn binary(name: &str, ret: Ty) -> Operation {
    Operation::method(&integer_ty(), name)
        .param("other", integer_ty())
        .returns(ret)
        .build()
}

/// Integer operations folded on literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Arithmetic {
    Add,
    Mul,
}

impl Arithmetic {
    pub fn operation(self) -> &'static Operation {
        match self {
            Arithmetic::Add => &*ADD,
            Arithmetic::Mul => &*MUL,
        }
    }

    /// `None` on overflow.
    pub fn eval(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Arithmetic::Add => a.checked_add(b),
            Arithmetic::Mul => a.checked_mul(b),
        }
    }
}

expr_class! {
    /// An integer expression.
    pub struct Integer = "Integer";
}

impl Integer {
    pub fn from_int(i: i64) -> Result<Self, TypeError> {
        FROM_INT
            .call_class(&integer_ty(), [Value::Int(i)])
            .map(Self::from_expr_unchecked)
    }

    fn binary(&self, operation: &Operation, other: &Integer) -> Result<Expression, TypeError> {
        operation.invoke(self.0.clone(), [Value::Expr(other.0.clone())])
    }

    pub fn add(&self, other: &Integer) -> Result<Self, TypeError> {
        self.binary(&ADD, other).map(Self::from_expr_unchecked)
    }

    pub fn mul(&self, other: &Integer) -> Result<Self, TypeError> {
        self.binary(&MUL, other).map(Self::from_expr_unchecked)
    }

    pub fn equals(&self, other: &Integer) -> Result<Boolean, TypeError> {
        self.binary(&EQ, other).map(Boolean::from_expr_unchecked)
    }

    /// The native value of this integer, as an `int` placeholder.
    pub fn unbox(&self) -> Result<Expression, TypeError> {
        UNBOX_INTEGER.call([Value::Expr(self.0.clone())])
    }

    /// The literal of an `Integer.from_int(i)` expression.
    pub fn literal(&self) -> Option<i64> {
        if self.0.operation() == &*FROM_INT {
            self.0.arg(1).and_then(Value::as_int)
        } else {
            None
        }
    }
}

/// `Integer.from_int(?name:int)`
fn literal_pattern(name: &str) -> Result<Expression, TypeError> {
    FROM_INT.call_class(&integer_ty(), [var(name, Ty::int())])
}

fn arithmetic_rule(op: Arithmetic) -> HyResult<Rule> {
    let name: &'static str = op.into();
    let operation = op.operation();
    Ok(Rule::new(
        format!("integer_{name}"),
        operation.invoke(literal_pattern("a")?, [Value::Expr(literal_pattern("b")?)])?,
        Replacement::lazy(move |bindings| {
            let (a, b) = (bindings.int("a")?, bindings.int("b")?);
            let result = op.eval(a, b).ok_or_else(|| HyError::Evaluation {
                operation: operation.qualified().to_string(),
                message: format!("{a} {name} {b} overflows"),
            })?;
            Ok(Integer::from_int(result)?.into())
        }),
    ))
}

/// The rules of the integer domain, with the registry each one belongs to.
pub fn rules() -> HyResult<Vec<(&'static str, Rule)>> {
    let mut rules = Arithmetic::iter()
        .map(|op| Ok((DEFAULT, arithmetic_rule(op)?)))
        .collect::<HyResult<Vec<_>>>()?;

    let eq = Rule::new(
        "integer_eq",
        EQ.invoke(literal_pattern("a")?, [Value::Expr(literal_pattern("b")?)])?,
        Replacement::lazy(|bindings| {
            Ok(Boolean::create(bindings.int("a")? == bindings.int("b")?)?.into())
        }),
    );
    let add_zero = Rule::new(
        "integer_add_zero",
        ADD.invoke(wildcard("x"), [Value::from(Integer::from_int(0)?)])?,
        Replacement::template(wildcard("x")),
    );
    let mul_one = Rule::new(
        "integer_mul_one",
        MUL.invoke(wildcard("x"), [Value::from(Integer::from_int(1)?)])?,
        Replacement::template(wildcard("x")),
    );
    let unbox = Rule::new(
        "unbox_integer",
        UNBOX_INTEGER.call([Value::Expr(literal_pattern("i")?)])?,
        Replacement::template(wildcard("i")),
    );
    let convert = conversion_rule(
        "convert_int",
        integer_ty(),
        var("i", Ty::int()),
        FROM_INT.call_class(&integer_ty(), [wildcard("i")])?,
    )?;

    rules.extend([
        (DEFAULT, eq),
        (DEFAULT, add_zero),
        (DEFAULT, mul_one),
        (UNBOX, unbox),
        (CONVERT, convert),
    ]);
    Ok(rules)
}

/// Register the integer rules into `library`.
pub fn register(library: &mut RuleLibrary) -> HyResult<()> {
    for (registry, rule) in rules()? {
        library.register(registry, rule)?;
    }
    debug!("Registered the integer domain");
    Ok(())
}

/// Evaluate `value` with the default rules and extract its native value.
///
/// Returns `None` when `value` does not reduce to a literal.
pub fn unbox(rewriter: &Rewriter<'_>, value: &Integer) -> HyResult<Option<i64>> {
    let result = rewriter.execute_all(value.unbox()?, &[DEFAULT, UNBOX])?;
    Ok(result.as_int())
}
