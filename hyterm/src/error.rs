use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::types::{Ty, TyVar};

/// Failure to resolve the concrete result type of a call.
///
/// Raised synchronously while an expression is being constructed; a call that
/// fails to bind never produces an expression.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum TypeError {
    /// Two variadic arguments resolved a type variable to different types.
    #[error(
        "Variadic argument #{index} of `{operation}` resolves `{var}` to `{found}`, but earlier variadic arguments resolved it to `{expected}`."
    )]
    VariadicMismatch {
        operation: String,
        index: usize,
        var: TyVar,
        expected: Ty,
        found: Ty,
    },

    /// A variable of the return type was never bound by any argument.
    #[error(
        "The return type of `{operation}` mentions `{var}`, which is not bound by any argument."
    )]
    UnboundVariable { operation: String, var: TyVar },

    /// An argument's type does not fit its declared parameter type.
    #[error(
        "Parameter `{param}` of `{operation}` is declared as `{expected}` but received a value of type `{found}`."
    )]
    Incompatible {
        operation: String,
        param: String,
        expected: Ty,
        found: Ty,
    },

    /// Two (non-variadic) parameters resolved the same variable differently.
    #[error(
        "Parameter `{param}` of `{operation}` resolves `{var}` to `{found}`, but it was already resolved to `{expected}`."
    )]
    Conflict {
        operation: String,
        param: String,
        var: TyVar,
        expected: Ty,
        found: Ty,
    },

    /// A required parameter was neither supplied nor defaulted.
    #[error("Missing argument for parameter `{param}` of `{operation}`.")]
    MissingArgument { operation: String, param: String },

    /// A parameter was supplied both positionally and by keyword.
    #[error("Parameter `{param}` of `{operation}` is supplied more than once.")]
    DuplicateArgument { operation: String, param: String },

    /// A keyword does not name any parameter.
    #[error("`{operation}` has no parameter named `{keyword}`.")]
    UnexpectedKeyword { operation: String, keyword: String },

    /// More positional arguments than parameters and no variadic parameter.
    #[error("`{operation}` takes {expected} positional arguments but {found} were given.")]
    TooManyArguments {
        operation: String,
        expected: usize,
        found: usize,
    },

    /// The source of a spread is not an iterable placeholder.
    #[error("Cannot spread a value of type `{found}` into a call of `{operation}`: expected `Iterable[..]`.")]
    NotIterable { operation: String, found: Ty },

    /// A call holds more than one spread.
    #[error("A call of `{operation}` may contain at most one spread argument.")]
    MultipleSpreads { operation: String },

    /// A spread landed on a fixed (non-variadic) parameter.
    #[error(
        "A spread argument of `{operation}` lands on parameter `{param}`; spreads may only fill the variadic parameter."
    )]
    SpreadOutsideVariadic { operation: String, param: String },
}

/// A rule that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum RuleError {
    /// The pattern is a bare wildcard or otherwise has no operation at its root.
    #[error("Rule `{rule}` has no concrete head: its pattern must apply an operation, found `{found}`.")]
    NoConcreteHead { rule: String, found: String },

    /// A constraint mentions a name the pattern never binds.
    #[error("A constraint of rule `{rule}` references `{name}`, which its pattern does not bind.")]
    UnboundConstraintName { rule: String, name: String },

    /// The replacement template mentions a name the pattern never binds.
    #[error("The replacement of rule `{rule}` references `{name}`, which its pattern does not bind.")]
    UnboundTemplateName { rule: String, name: String },

    /// A wildcard name is used both as a single and a variadic wildcard.
    #[error("Rule `{rule}` uses `{name}` both as a single-value and as a variadic wildcard.")]
    MixedWildcardArity { rule: String, name: String },
}

#[derive(Debug, EnumIs, EnumTryAs, Error)]
pub enum HyError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("No rule registry named `{0}`.")]
    RegistryNotFound(String),

    #[error("Binding `{name}` is missing or does not hold {expected}.")]
    BindingMismatch { name: String, expected: &'static str },

    #[error("Native evaluation of `{operation}` failed: {message}")]
    Evaluation { operation: String, message: String },

    #[error("Rewriting did not settle within {limit} steps.")]
    StepLimitExceeded { limit: usize },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
}

pub type HyResult<T> = Result<T, HyError>;
