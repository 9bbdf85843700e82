//! Type tags carried by every expression.
//!
//! Role
//! - [`Ty`] is the explicit type tag attached to every [`Expression`](crate::expr::Expression)
//!   at construction time. It replaces runtime introspection of generic classes: a node built
//!   by `Generic.get` on a `Generic[int]` receiver carries `int`, and a node whose declared type
//!   is `Generic[int]` carries that instantiation verbatim.
//! - [`signature`] describes the typed stub of an operation, and [`binding`] resolves the type
//!   variables of a signature against the actual arguments of a call.
//!
//! Kinds
//! - [`TyKind::Expression`] constructors name expression classes (`Boolean`, `Maybe[T]`, ...).
//!   Calls returning such a type build an ordinary expression node.
//! - [`TyKind::Native`] constructors name host values (`int`, `str`, `Iterable[int]`, ...).
//!   Calls returning such a type build a placeholder: a node standing in for a value that is not
//!   computed yet.
//!
//! Example
//! ```
//! use hyterm::types::Ty;
//!
//! let generic = Ty::generic("Generic", [Ty::int()]);
//! assert_eq!(generic.to_string(), "Generic[int]");
//! assert_ne!(generic, Ty::class("Generic"));
//! assert!(Ty::class("Generic").accepts(&generic));
//! ```
use std::{collections::BTreeSet, fmt, sync::Arc};

use smallvec::SmallVec;
use strum::EnumIs;

use crate::types::binding::TypeBinding;

pub mod binding;
pub mod signature;

/// Name of the root expression class. Every expression class is compatible with it.
pub const EXPRESSION_CLASS: &str = "Expression";

/// Name of the native iterable constructor used by spreads.
pub const ITERABLE: &str = "Iterable";

/// A type variable symbol such as `T`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TyVar(Arc<str>);

impl TyVar {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// Whether a type constructor describes host values or expression classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum TyKind {
    Native,
    Expression,
}

/// A named type constructor applied to its (possibly empty) type arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TyCon {
    name: Arc<str>,
    kind: TyKind,
    args: Arc<[Ty]>,
}

impl TyCon {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TyKind {
        self.kind
    }

    pub fn args(&self) -> &[Ty] {
        &self.args
    }

    /// Whether this constructor is the root `Expression` class.
    pub fn is_root_expression(&self) -> bool {
        self.kind.is_expression() && &*self.name == EXPRESSION_CLASS && self.args.is_empty()
    }

    fn same_constructor(&self, other: &TyCon) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

/// Type tag of a value or expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Ty {
    /// The top type; compatible with everything (`object`).
    Any,

    /// A type variable, resolved per call by the [`binding`] module.
    Var(TyVar),

    /// A (possibly generic) type constructor.
    Con(TyCon),

    /// The type of a type object: `Type[T]`.
    TypeOf(Box<Ty>),
}

impl Ty {
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Ty::Var(TyVar::new(name))
    }

    /// A non-generic native type such as `int`.
    pub fn native(name: impl Into<Arc<str>>) -> Self {
        Self::constructor(name, TyKind::Native, [])
    }

    /// A native type applied to type arguments, such as `Iterable[int]`.
    pub fn native_generic(name: impl Into<Arc<str>>, args: impl IntoIterator<Item = Ty>) -> Self {
        Self::constructor(name, TyKind::Native, args)
    }

    /// A non-generic expression class (or the bare, unparameterized form of a generic one).
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::constructor(name, TyKind::Expression, [])
    }

    /// A generic expression class instantiated with the given arguments.
    pub fn generic(name: impl Into<Arc<str>>, args: impl IntoIterator<Item = Ty>) -> Self {
        Self::constructor(name, TyKind::Expression, args)
    }

    fn constructor(
        name: impl Into<Arc<str>>,
        kind: TyKind,
        args: impl IntoIterator<Item = Ty>,
    ) -> Self {
        Ty::Con(TyCon {
            name: name.into(),
            kind,
            args: args.into_iter().collect(),
        })
    }

    pub fn type_of(inner: Ty) -> Self {
        Ty::TypeOf(Box::new(inner))
    }

    /// The root expression class.
    pub fn expression() -> Self {
        Self::class(EXPRESSION_CLASS)
    }

    pub fn none() -> Self {
        Self::native("NoneType")
    }

    pub fn bool() -> Self {
        Self::native("bool")
    }

    pub fn int() -> Self {
        Self::native("int")
    }

    pub fn float() -> Self {
        Self::native("float")
    }

    pub fn str() -> Self {
        Self::native("str")
    }

    pub fn list() -> Self {
        Self::native("list")
    }

    pub fn iterable(element: Ty) -> Self {
        Self::native_generic(ITERABLE, [element])
    }

    /// Constructor name, if this is a constructor type.
    pub fn name(&self) -> Option<&str> {
        match self {
            Ty::Con(con) => Some(con.name()),
            _ => None,
        }
    }

    /// Type arguments of a constructor type; empty for every other type.
    pub fn args(&self) -> &[Ty] {
        match self {
            Ty::Con(con) => con.args(),
            _ => &[],
        }
    }

    /// Re-instantiate this constructor with new arguments. Other types are returned unchanged.
    pub fn with_args(&self, args: impl IntoIterator<Item = Ty>) -> Ty {
        match self {
            Ty::Con(con) => Ty::Con(TyCon {
                name: con.name.clone(),
                kind: con.kind,
                args: args.into_iter().collect(),
            }),
            other => other.clone(),
        }
    }

    /// Whether this is an expression class (generic or not).
    pub fn is_expression_class(&self) -> bool {
        matches!(self, Ty::Con(con) if con.kind.is_expression())
    }

    /// Whether this is a native (host value) type.
    pub fn is_native(&self) -> bool {
        matches!(self, Ty::Con(con) if con.kind.is_native())
    }

    /// Element type of an `Iterable[T]`.
    pub fn iterable_element(&self) -> Option<&Ty> {
        match self {
            Ty::Con(con) if con.kind.is_native() && &*con.name == ITERABLE => con.args.first(),
            _ => None,
        }
    }

    /// Whether a value of type `actual` may be passed where `self` is declared.
    ///
    /// Type variables on either side are treated as wildcards.
    pub fn accepts(&self, actual: &Ty) -> bool {
        TypeBinding::new().unify(self, actual).is_ok()
    }

    /// Whether two types name the same constructor, ignoring type arguments.
    pub fn same_class(&self, other: &Ty) -> bool {
        match (self, other) {
            (Ty::Con(a), Ty::Con(b)) => a.same_constructor(b),
            _ => false,
        }
    }

    /// Replace every type variable by its binding.
    ///
    /// Returns the first variable that has no binding.
    pub fn substitute(&self, binding: &TypeBinding) -> Result<Ty, TyVar> {
        Ok(match self {
            Ty::Any => Ty::Any,
            Ty::Var(var) => binding.get(var).cloned().ok_or_else(|| var.clone())?,
            Ty::Con(con) => Ty::Con(TyCon {
                name: con.name.clone(),
                kind: con.kind,
                args: con
                    .args
                    .iter()
                    .map(|arg| arg.substitute(binding))
                    .collect::<Result<_, _>>()?,
            }),
            Ty::TypeOf(inner) => Ty::type_of(inner.substitute(binding)?),
        })
    }

    /// Collect the type variables mentioned by this type.
    pub fn free_vars(&self) -> BTreeSet<TyVar> {
        let mut vars = BTreeSet::new();
        let mut stack: SmallVec<[&Ty; 8]> = SmallVec::new();
        stack.push(self);
        while let Some(ty) = stack.pop() {
            match ty {
                Ty::Any => {}
                Ty::Var(var) => {
                    vars.insert(var.clone());
                }
                Ty::Con(con) => stack.extend(con.args.iter()),
                Ty::TypeOf(inner) => stack.push(inner),
            }
        }
        vars
    }

    /// Whether this type mentions no type variable.
    pub fn is_concrete(&self) -> bool {
        self.free_vars().is_empty()
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => write!(f, "Any"),
            Ty::Var(var) => write!(f, "{var}"),
            Ty::Con(con) => {
                write!(f, "{}", con.name)?;
                if !con.args.is_empty() {
                    write!(f, "[")?;
                    for (i, arg) in con.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Ty::TypeOf(inner) => write!(f, "Type[{inner}]"),
        }
    }
}
