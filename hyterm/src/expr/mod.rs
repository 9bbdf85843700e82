//! Immutable expression trees.
//!
//! An [`Expression`] is an [`Operation`] applied to positional and keyword [`Value`]s, tagged
//! with the concrete type computed by the binder when the node was constructed. Nodes are
//! shared through [`Arc`] so cloning is cheap; structural equality and hashing ignore the
//! declared type and use a hash cached at construction time.
//!
//! Example
//! ```
//! use hyterm::expr::{Operation, Value};
//! use hyterm::types::Ty;
//!
//! let boolean = Ty::class("Boolean");
//! let create = Operation::class_method(&boolean, "create")
//!     .param("value", Ty::bool())
//!     .returns(boolean.clone())
//!     .build();
//!
//! let a = create.call_class(&boolean, [Value::Bool(true)]).unwrap();
//! let b = create.call_class(&boolean, [Value::Bool(true)]).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.ty(), &boolean);
//! ```
use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use smallvec::SmallVec;

use crate::{error::TypeError, types::binding};

pub mod operation;
pub mod placeholder;
pub mod pretty;
pub mod value;

pub use operation::{Call, NativeFn, Operation, OperationBuilder, OperationKind};
pub use value::{ArgVec, KwArgs, NativeObject, NativeType, NativeValue, Value};

use crate::types::Ty;

struct ExprNode {
    operation: Operation,
    args: ArgVec,
    kwargs: KwArgs,
    ty: Ty,
    hash: u64,
}

/// An operation applied to arguments, tagged with its declared type.
#[derive(Clone)]
pub struct Expression(Arc<ExprNode>);

/// Position of a child inside its parent expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Arg(usize),
    Kwarg(Arc<str>),
}

impl Expression {
    /// Build a node, computing its declared type from the operation's signature.
    pub fn construct(
        operation: Operation,
        args: ArgVec,
        kwargs: KwArgs,
    ) -> Result<Expression, TypeError> {
        let ty = binding::infer(operation.qualified(), operation.signature(), &args, &kwargs)?;
        Ok(Self::from_parts(operation, args, kwargs, ty))
    }

    /// Build a node with an already known declared type. The binder is not consulted.
    pub fn from_parts(operation: Operation, args: ArgVec, kwargs: KwArgs, ty: Ty) -> Expression {
        let mut hasher = DefaultHasher::new();
        operation.hash(&mut hasher);
        args.len().hash(&mut hasher);
        for arg in &args {
            arg.hash(&mut hasher);
        }
        for (name, value) in &kwargs {
            name.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        let hash = hasher.finish();

        Expression(Arc::new(ExprNode {
            operation,
            args,
            kwargs,
            ty,
            hash,
        }))
    }

    pub fn operation(&self) -> &Operation {
        &self.0.operation
    }

    pub fn args(&self) -> &[Value] {
        &self.0.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.0.args.get(index)
    }

    pub fn kwargs(&self) -> &KwArgs {
        &self.0.kwargs
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.0.kwargs.get(name)
    }

    /// The concrete type computed when this node was constructed.
    pub fn ty(&self) -> &Ty {
        &self.0.ty
    }

    /// Whether this node stands for a deferred native value rather than an expression class.
    pub fn is_placeholder(&self) -> bool {
        self.0.ty.is_native()
    }

    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    pub fn ptr_eq(&self, other: &Expression) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, slot: &Slot) -> Option<&Value> {
        match slot {
            Slot::Arg(i) => self.arg(*i),
            Slot::Kwarg(name) => self.kwarg(name),
        }
    }

    /// Replace one child, keeping the declared type of this node.
    pub fn with_slot(&self, slot: &Slot, value: Value) -> Expression {
        let mut args = self.0.args.clone();
        let mut kwargs = self.0.kwargs.clone();
        match slot {
            Slot::Arg(i) => {
                if let Some(arg) = args.get_mut(*i) {
                    *arg = value;
                }
            }
            Slot::Kwarg(name) => {
                kwargs.insert(name.clone(), value);
            }
        }
        Self::from_parts(self.0.operation.clone(), args, kwargs, self.0.ty.clone())
    }

    /// Reconstruct this node through the binder, recomputing its declared type.
    pub fn rebind(&self) -> Result<Expression, TypeError> {
        Self::construct(
            self.0.operation.clone(),
            self.0.args.clone(),
            self.0.kwargs.clone(),
        )
    }

    /// Pre-order iterator over this node and every expression below it.
    ///
    /// Children are visited positional arguments first (left to right), then keyword arguments
    /// in name order. Literal leaves (including lists) are not entered.
    pub fn descendants(&self) -> Descendants {
        let mut stack = SmallVec::new();
        stack.push(self.clone());
        Descendants { stack }
    }

    /// View this expression through a typed wrapper, if its declared class matches.
    pub fn downcast<C: ExprClass>(&self) -> Option<C> {
        C::try_from_expr(self.clone())
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        let mut stack: SmallVec<[(&Expression, &Expression); 16]> = SmallVec::new();
        stack.push((self, other));

        while let Some((a, b)) = stack.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            if a.0.hash != b.0.hash
                || a.0.operation != b.0.operation
                || a.0.args.len() != b.0.args.len()
                || a.0.kwargs.len() != b.0.kwargs.len()
            {
                return false;
            }

            let args = a.0.args.iter().zip(b.0.args.iter());
            let kwargs = a.0.kwargs.iter().zip(b.0.kwargs.iter()).map(|((ka, va), (kb, vb))| {
                if ka == kb { Some((va, vb)) } else { None }
            });
            for pair in args.map(Some).chain(kwargs) {
                let Some((va, vb)) = pair else {
                    return false;
                };
                match (va, vb) {
                    (Value::Expr(ea), Value::Expr(eb)) => stack.push((ea, eb)),
                    _ => {
                        if va != vb {
                            return false;
                        }
                    }
                }
            }
        }

        true
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({self}: {})", self.0.ty)
    }
}

/// Iterator returned by [`Expression::descendants`].
pub struct Descendants {
    stack: SmallVec<[Expression; 8]>,
}

impl Iterator for Descendants {
    type Item = Expression;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.stack.pop()?;
        let children = expr
            .args()
            .iter()
            .chain(expr.kwargs().values())
            .filter_map(Value::as_expr)
            .cloned()
            .collect::<SmallVec<[Expression; 8]>>();
        self.stack.extend(children.into_iter().rev());
        Some(expr)
    }
}

/// A typed view on the expressions of one expression class.
///
/// Client domains declare wrappers with [`expr_class!`](crate::expr_class) and attach their
/// operations as inherent methods.
pub trait ExprClass: Sized {
    /// Name of the class constructor (without type arguments).
    const CLASS: &'static str;

    fn from_expr_unchecked(expr: Expression) -> Self;

    fn expr(&self) -> &Expression;

    fn into_expr(self) -> Expression;

    fn try_from_expr(expr: Expression) -> Option<Self> {
        let ty = expr.ty();
        if ty.is_expression_class() && ty.name() == Some(Self::CLASS) {
            Some(Self::from_expr_unchecked(expr))
        } else {
            None
        }
    }

    /// The declared type of the wrapped expression.
    fn ty(&self) -> &Ty {
        self.expr().ty()
    }
}

/// Declare a newtype wrapper implementing [`ExprClass`].
///
/// ```
/// hyterm::expr_class! {
///     /// Boolean expressions.
///     pub struct Boolean = "Boolean";
/// }
/// ```
#[macro_export]
macro_rules! expr_class {
    ($(#[$meta:meta])* $vis:vis struct $name:ident = $class:literal;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis struct $name($crate::expr::Expression);

        impl $crate::expr::ExprClass for $name {
            const CLASS: &'static str = $class;

            fn from_expr_unchecked(expr: $crate::expr::Expression) -> Self {
                Self(expr)
            }

            fn expr(&self) -> &$crate::expr::Expression {
                &self.0
            }

            fn into_expr(self) -> $crate::expr::Expression {
                self.0
            }
        }

        impl ::std::convert::From<$name> for $crate::expr::Expression {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl ::std::convert::From<$name> for $crate::expr::Value {
            fn from(value: $name) -> Self {
                $crate::expr::Value::Expr(value.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

/// Build an array of [`Value`]s from heterogeneous arguments.
///
/// ```
/// use hyterm::{args, expr::Value};
///
/// let values = args![1, true, "x"];
/// assert_eq!(values[1], Value::Bool(true));
/// ```
#[macro_export]
macro_rules! args {
    ($($value:expr),* $(,)?) => {
        [$($crate::expr::Value::from($value)),*]
    };
}
