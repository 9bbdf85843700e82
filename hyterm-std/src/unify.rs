//! Unification of equal alternatives.
//!
//! `unify(*args)` stands for a value that all of its arguments agree on. Adjacent equal
//! arguments collapse into one; a single argument is the unified value.
use hyterm::{
    error::{HyResult, TypeError},
    expr::{Expression, Operation, Value},
    rules::{
        Constraint, DEFAULT, Replacement, Rule, RuleLibrary,
        pattern::{variadic, wildcard},
    },
    types::Ty,
};
use log::debug;
use once_cell::sync::Lazy;

/// `unify(*args: T) -> T`
pub static UNIFY: Lazy<Operation> = Lazy::new(|| {
    Operation::function("unify")
        .variadic("args", Ty::var("T"))
        .returns(Ty::var("T"))
        .build()
});

/// `unify(*args)`
pub fn unify(args: impl IntoIterator<Item = Value>) -> Result<Expression, TypeError> {
    UNIFY.call(args)
}

/// The rules of the unification domain, with the registry each one belongs to.
pub fn rules() -> HyResult<Vec<(&'static str, Rule)>> {
    let single = Rule::new(
        "unify_single",
        UNIFY.call([wildcard("x")])?,
        Replacement::template(wildcard("x")),
    );
    let collapse = Rule::new(
        "unify_collapse",
        UNIFY.call([
            variadic("before"),
            wildcard("a"),
            wildcard("b"),
            variadic("after"),
        ])?,
        Replacement::template(UNIFY.call([
            variadic("before"),
            wildcard("a"),
            variadic("after"),
        ])?),
    )
    .with_constraint(Constraint::equal("a", "b"));

    Ok(vec![(DEFAULT, single), (DEFAULT, collapse)])
}

/// Register the unification rules into `library`.
pub fn register(library: &mut RuleLibrary) -> HyResult<()> {
    for (registry, rule) in rules()? {
        library.register(registry, rule)?;
    }
    debug!("Registered the unification domain");
    Ok(())
}
