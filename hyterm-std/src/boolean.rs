//! Boolean logic.
//!
//! `Boolean.create(b)` lifts a native `bool`; `if_`, `and_`, `or_` and `not_` are folded by
//! the [`DEFAULT`] rules once their operands are literal. The conditional is lazy: only the
//! selected branch survives, the other one is dropped before anything inside it is rewritten.
use hyterm::{
    convert::conversion_rule,
    error::{HyResult, TypeError},
    expr::{ExprClass, Expression, Operation, Value},
    expr_class,
    rules::{
        CONVERT, DEFAULT, Replacement, Rule, RuleLibrary,
        pattern::{var, wildcard},
    },
    types::Ty,
};
use log::debug;
use once_cell::sync::Lazy;

/// Name of the boolean class.
pub const BOOLEAN: &str = "Boolean";

pub fn boolean_ty() -> Ty {
    Ty::class(BOOLEAN)
}

/// `Boolean.create(b: bool) -> Boolean`
pub static CREATE: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&boolean_ty(), "create")
        .param("b", Ty::bool())
        .returns(boolean_ty())
        .build()
});

/// `Boolean.if_(self, true_: T, false_: T) -> T`
pub static IF: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&boolean_ty(), "if_")
        .param("true_", Ty::var("T"))
        .param("false_", Ty::var("T"))
        .returns(Ty::var("T"))
        .build()
});

/// `Boolean.and_(self, other: Boolean) -> Boolean`
pub static AND: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&boolean_ty(), "and_")
        .param("other", boolean_ty())
        .returns(boolean_ty())
        .build()
});

/// `Boolean.or_(self, other: Boolean) -> Boolean`
pub static OR: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&boolean_ty(), "or_")
        .param("other", boolean_ty())
        .returns(boolean_ty())
        .build()
});

/// `Boolean.not_(self) -> Boolean`
pub static NOT: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&boolean_ty(), "not_")
        .returns(boolean_ty())
        .build()
});

expr_class! {
    /// A boolean expression.
    pub struct Boolean = "Boolean";
}

impl Boolean {
    pub fn create(b: bool) -> Result<Self, TypeError> {
        CREATE
            .call_class(&boolean_ty(), [Value::Bool(b)])
            .map(Self::from_expr_unchecked)
    }

    /// `self.if_(true_, false_)`, typed after the branches.
    pub fn if_(
        &self,
        true_: impl Into<Value>,
        false_: impl Into<Value>,
    ) -> Result<Expression, TypeError> {
        let branches: [Value; 2] = [true_.into(), false_.into()];
        IF.invoke(self.0.clone(), branches)
    }

    pub fn and_(&self, other: &Boolean) -> Result<Self, TypeError> {
        AND.invoke(self.0.clone(), [Value::Expr(other.0.clone())])
            .map(Self::from_expr_unchecked)
    }

    pub fn or_(&self, other: &Boolean) -> Result<Self, TypeError> {
        OR.invoke(self.0.clone(), [Value::Expr(other.0.clone())])
            .map(Self::from_expr_unchecked)
    }

    pub fn not_(&self) -> Result<Self, TypeError> {
        NOT.invoke(self.0.clone(), []).map(Self::from_expr_unchecked)
    }

    /// The literal of a `Boolean.create(b)` expression.
    pub fn literal(&self) -> Option<bool> {
        if self.0.operation() == &*CREATE {
            self.0.arg(1).and_then(Value::as_bool)
        } else {
            None
        }
    }
}

/// `Boolean.create(?name:bool)`
fn literal_pattern(name: &str) -> Result<Value, TypeError> {
    CREATE
        .call_class(&boolean_ty(), [var(name, Ty::bool())])
        .map(Value::from)
}

fn create_value(b: bool) -> HyResult<Value> {
    Ok(Boolean::create(b)?.into())
}

/// The rules of the boolean domain, with the registry each one belongs to.
pub fn rules() -> HyResult<Vec<(&'static str, Rule)>> {
    let if_ = Rule::new(
        "boolean_if",
        IF.invoke(literal_pattern("b")?, [wildcard("true_"), wildcard("false_")])?,
        Replacement::lazy(|bindings| {
            let branch = if bindings.bool("b")? { "true_" } else { "false_" };
            Ok(bindings.value(branch)?.clone())
        }),
    );
    let and_ = Rule::new(
        "boolean_and",
        AND.invoke(literal_pattern("l")?, [literal_pattern("r")?])?,
        Replacement::lazy(|bindings| create_value(bindings.bool("l")? && bindings.bool("r")?)),
    );
    let or_ = Rule::new(
        "boolean_or",
        OR.invoke(literal_pattern("l")?, [literal_pattern("r")?])?,
        Replacement::lazy(|bindings| create_value(bindings.bool("l")? || bindings.bool("r")?)),
    );
    // A literal on the left decides these whatever the right side is.
    let and_false = Rule::new(
        "boolean_and_false",
        AND.invoke(Boolean::create(false)?, [wildcard("_")])?,
        Replacement::template(Boolean::create(false)?),
    );
    let or_true = Rule::new(
        "boolean_or_true",
        OR.invoke(Boolean::create(true)?, [wildcard("_")])?,
        Replacement::template(Boolean::create(true)?),
    );
    let not_ = Rule::new(
        "boolean_not",
        NOT.invoke(literal_pattern("b")?, [])?,
        Replacement::lazy(|bindings| create_value(!bindings.bool("b")?)),
    );
    let convert = conversion_rule(
        "convert_bool",
        boolean_ty(),
        var("b", Ty::bool()),
        CREATE.call_class(&boolean_ty(), [wildcard("b")])?,
    )?;

    Ok(vec![
        (DEFAULT, if_),
        (DEFAULT, and_),
        (DEFAULT, or_),
        (DEFAULT, and_false),
        (DEFAULT, or_true),
        (DEFAULT, not_),
        (CONVERT, convert),
    ])
}

/// Register the boolean rules into `library`.
pub fn register(library: &mut RuleLibrary) -> HyResult<()> {
    for (registry, rule) in rules()? {
        library.register(registry, rule)?;
    }
    debug!("Registered the boolean domain");
    Ok(())
}
