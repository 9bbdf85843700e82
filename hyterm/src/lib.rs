//! Hyterm: a typed term-rewriting substrate.
//!
//! Programs are represented as immutable expression trees whose nodes are calls of typed
//! operation stubs. Every node carries the concrete type its call resolves to, computed from
//! the operation's signature and the declared types of its arguments (type variables, generic
//! classes, `Type[T]` parameters and variadic arguments included). Trees are rewritten by rules
//! (pattern + replacement) stored in named registries.
//!
//! Layout
//!  - [`types`]: type tags, signatures and the binder resolving call types.
//!  - [`expr`]: values, operations, expressions, placeholders and pretty printing.
//!  - [`fold`]: bottom-up rebuilding of trees.
//!  - [`rules`]: patterns, rules, registries and the [`Rewriter`](rules::engine::Rewriter).
//!  - [`convert`]: conversion requests answered by the `convert` registry.
//!  - [`config`]: engine settings loaded from TOML.
//!
//! Example
//! ```
//! use hyterm::prelude::*;
//!
//! // class Generic[T]: def get(self) -> T
//! let generic = Ty::generic("Generic", [Ty::var("T")]);
//! let create = Operation::class_method(&generic, "create")
//!     .param("value", Ty::var("T"))
//!     .returns(generic.clone())
//!     .build();
//! let get = Operation::method(&generic, "get").returns(Ty::var("T")).build();
//!
//! let boxed = create.call_class(&Ty::class("Generic"), [Value::Int(1)]).unwrap();
//! assert_eq!(boxed.ty(), &Ty::generic("Generic", [Ty::int()]));
//!
//! let inner = get.invoke(boxed, []).unwrap();
//! assert_eq!(inner.ty(), &Ty::int());
//! assert!(inner.is_placeholder());
//! ```

/// Engine configuration.
pub mod config;
/// Conversion requests and the built-in `Maybe` / `Converter` classes.
pub mod convert;
/// Error types shared by the crate.
pub mod error;
/// Expressions API: values, operations, expressions and pretty printing.
pub mod expr;
/// Bottom-up tree rebuilding.
pub mod fold;
/// Patterns, rules, registries and the rewriting engine.
pub mod rules;
/// Type tags, signatures and type binding.
pub mod types;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::config::EngineConfig;
    pub use crate::convert::{Maybe, conversion_rule, convert_request, just, nothing};
    pub use crate::error::{HyError, HyResult, RuleError, TypeError};
    pub use crate::expr::{
        ExprClass, Expression, KwArgs, NativeType, NativeValue, Operation, OperationKind, Slot,
        Value, placeholder::iterate, pretty::PrettyExpr,
    };
    pub use crate::fold::{Folder, Parts, fold};
    pub use crate::rules::{
        CONVERT, Constraint, DEFAULT, Replacement, Rule, RuleLibrary, RuleRegistry, UNBOX,
        engine::{Rewriter, default_rule},
        pattern::{Bindings, Captured, Selector, typed, var, variadic, variadic_of, wildcard},
    };
    pub use crate::types::{Ty, TyVar, signature::Signature};
    pub use crate::{args, expr_class};
}
