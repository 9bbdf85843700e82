//! Bottom-up rebuilding of expression trees.
//!
//! [`fold`] visits every expression of a value in post-order (positional arguments left to
//! right, then keyword arguments in name order), handing each node's already-folded [`Parts`]
//! to a [`Folder`]. The traversal uses an explicit frame stack so arbitrarily deep trees do not
//! exhaust the call stack. Literal leaves (lists included) are passed through untouched.
//!
//! Folding with [`identity`] yields a value equal to the input, with the same declared types.
use crate::{
    error::{HyResult, TypeError},
    expr::{ArgVec, Expression, KwArgs, Operation, Value},
    types::Ty,
};

/// The components of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Parts {
    pub operation: Operation,
    pub args: ArgVec,
    pub kwargs: KwArgs,
    pub ty: Ty,
}

impl Parts {
    /// Recompose the node, keeping the declared type as is.
    pub fn rebuild(self) -> Expression {
        Expression::from_parts(self.operation, self.args, self.kwargs, self.ty)
    }

    /// Recompose the node through the binder, recomputing the declared type.
    pub fn construct(self) -> Result<Expression, TypeError> {
        Expression::construct(self.operation, self.args, self.kwargs)
    }
}

impl Expression {
    /// Decompose this node into its parts.
    pub fn parts(&self) -> Parts {
        Parts {
            operation: self.operation().clone(),
            args: self.args().iter().cloned().collect(),
            kwargs: self.kwargs().clone(),
            ty: self.ty().clone(),
        }
    }
}

/// A node transformation applied by [`fold`].
pub trait Folder {
    fn transform(&mut self, parts: Parts) -> HyResult<Value>;
}

impl<F> Folder for F
where
    F: FnMut(Parts) -> HyResult<Value>,
{
    fn transform(&mut self, parts: Parts) -> HyResult<Value> {
        self(parts)
    }
}

/// The transformation rebuilding every node unchanged.
pub fn identity(parts: Parts) -> HyResult<Value> {
    Ok(Value::Expr(parts.rebuild()))
}

enum Frame<'a> {
    Enter(&'a Value),
    Exit(&'a Expression),
}

/// Rebuild `value` bottom-up through `folder`.
pub fn fold<F: Folder + ?Sized>(value: &Value, folder: &mut F) -> HyResult<Value> {
    let mut frames = vec![Frame::Enter(value)];
    let mut results: Vec<Value> = Vec::new();

    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Enter(Value::Expr(expr)) => {
                frames.push(Frame::Exit(expr));
                for child in expr
                    .args()
                    .iter()
                    .chain(expr.kwargs().values())
                    .rev()
                {
                    frames.push(Frame::Enter(child));
                }
            }
            Frame::Enter(leaf) => results.push(leaf.clone()),
            Frame::Exit(expr) => {
                let arity = expr.args().len() + expr.kwargs().len();
                let mut children = results.split_off(results.len() - arity).into_iter();
                let args: ArgVec = children.by_ref().take(expr.args().len()).collect();
                let kwargs: KwArgs = expr.kwargs().keys().cloned().zip(children).collect();
                let parts = Parts {
                    operation: expr.operation().clone(),
                    args,
                    kwargs,
                    ty: expr.ty().clone(),
                };
                results.push(folder.transform(parts)?);
            }
        }
    }

    debug_assert_eq!(results.len(), 1);
    Ok(results.pop().unwrap_or(Value::None))
}

/// Fold an expression, returning the transformed value.
pub fn fold_expr<F: Folder + ?Sized>(expr: &Expression, folder: &mut F) -> HyResult<Value> {
    fold(&Value::Expr(expr.clone()), folder)
}
