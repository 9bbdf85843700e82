//! Resolution of type variables against the actual arguments of a call.
//!
//! The binder walks the parameters of a [`Signature`] in declaration order (receiver first,
//! then the other positional-or-keyword parameters, the variadic slot and finally keyword-only
//! parameters), unifying every declared type with the declared type of the argument that fills
//! it. The resulting [`TypeBinding`] is substituted into the return type.
use std::collections::BTreeMap;

use crate::{
    error::TypeError,
    expr::{KwArgs, Value, placeholder},
    types::{Ty, TyVar, signature::Signature},
};

/// Why a declared type does not accept an actual type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The two types have incompatible shapes.
    Incompatible,

    /// A variable was already bound to a type that cannot be merged with the new one.
    Conflict { var: TyVar, bound: Ty, found: Ty },
}

/// Per-call map from type variables to the types they were resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeBinding {
    vars: BTreeMap<TyVar, Ty>,
}

impl TypeBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &TyVar) -> Option<&Ty> {
        self.vars.get(var)
    }

    /// Bind a variable unconditionally, overwriting any previous binding.
    pub fn bind(&mut self, var: TyVar, ty: Ty) {
        self.vars.insert(var, ty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TyVar, &Ty)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Unify a declared type with the actual type of an argument, extending the binding.
    ///
    /// Variables of `declared` are bound to the matching position of `actual`. Variables and
    /// `Any` on the actual side are compatible with everything and bind nothing new.
    pub fn unify(&mut self, declared: &Ty, actual: &Ty) -> Result<(), Mismatch> {
        match (declared, actual) {
            (Ty::Any, _) => Ok(()),
            (Ty::Var(var), _) => self.assign(var, actual),
            (_, Ty::Any | Ty::Var(_)) => Ok(()),
            (Ty::TypeOf(declared), Ty::TypeOf(actual)) => self.unify(declared, actual),
            // An instance passed for `Type[T]` binds `T` to the instance's type.
            (Ty::TypeOf(declared), actual) => self.unify(declared, actual),
            (Ty::Con(declared), Ty::Con(found)) => {
                if declared.is_root_expression() && found.kind().is_expression() {
                    return Ok(());
                }
                if declared.kind() != found.kind() || declared.name() != found.name() {
                    return Err(Mismatch::Incompatible);
                }
                // A bare generic accepts (and is accepted by) every instantiation of itself.
                if declared.args().is_empty() || found.args().is_empty() {
                    return Ok(());
                }
                if declared.args().len() != found.args().len() {
                    return Err(Mismatch::Incompatible);
                }
                for (d, a) in declared.args().iter().zip(found.args()) {
                    self.unify(d, a)?;
                }
                Ok(())
            }
            (Ty::Con(_), Ty::TypeOf(_)) => Err(Mismatch::Incompatible),
        }
    }

    fn assign(&mut self, var: &TyVar, actual: &Ty) -> Result<(), Mismatch> {
        let merged = match self.vars.get(var) {
            None => actual.clone(),
            Some(bound) => merge(bound, actual).ok_or_else(|| Mismatch::Conflict {
                var: var.clone(),
                bound: bound.clone(),
                found: actual.clone(),
            })?,
        };
        self.vars.insert(var.clone(), merged);
        Ok(())
    }
}

/// The most specific type agreeing with both arguments, if any.
fn merge(bound: &Ty, found: &Ty) -> Option<Ty> {
    match (bound, found) {
        _ if bound == found => Some(bound.clone()),
        (_, Ty::Any | Ty::Var(_)) => Some(bound.clone()),
        (Ty::Any | Ty::Var(_), _) => Some(found.clone()),
        (Ty::TypeOf(a), Ty::TypeOf(b)) => merge(a, b).map(Ty::type_of),
        (Ty::Con(_), Ty::Con(_)) if bound.same_class(found) => {
            match (bound.args().is_empty(), found.args().is_empty()) {
                (true, _) => Some(found.clone()),
                (_, true) => Some(bound.clone()),
                _ if bound.args().len() == found.args().len() => {
                    let args = bound
                        .args()
                        .iter()
                        .zip(found.args())
                        .map(|(a, b)| merge(a, b))
                        .collect::<Option<Vec<_>>>()?;
                    Some(bound.with_args(args))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Compute the concrete return type of a call of `operation` with the given arguments.
///
/// `args` are the positional arguments as stored in the expression (receiver first for
/// methods and class methods); a spread appears as a single iterated placeholder whose
/// declared type is the element type of its source.
pub fn infer(
    operation: &str,
    signature: &Signature,
    args: &[Value],
    kwargs: &KwArgs,
) -> Result<Ty, TypeError> {
    let fixed = signature.params.len();
    if args.len() > fixed && signature.variadic.is_none() {
        return Err(TypeError::TooManyArguments {
            operation: operation.to_string(),
            expected: fixed,
            found: args.len(),
        });
    }

    if args.iter().filter(|value| placeholder::is_iterated(value)).count() > 1 {
        return Err(TypeError::MultipleSpreads {
            operation: operation.to_string(),
        });
    }

    let mut assigned: Vec<Option<&Value>> = args.iter().take(fixed).map(Some).collect();
    assigned.resize(fixed, None);
    let mut keyword_assigned: Vec<Option<&Value>> = vec![None; signature.keyword_only.len()];

    for (keyword, value) in kwargs {
        let slot = if let Some(i) = signature.params.iter().position(|p| p.name == *keyword) {
            &mut assigned[i]
        } else if let Some(i) = signature
            .keyword_only
            .iter()
            .position(|p| p.name == *keyword)
        {
            &mut keyword_assigned[i]
        } else {
            return Err(TypeError::UnexpectedKeyword {
                operation: operation.to_string(),
                keyword: keyword.to_string(),
            });
        };
        if slot.is_some() {
            return Err(TypeError::DuplicateArgument {
                operation: operation.to_string(),
                param: keyword.to_string(),
            });
        }
        *slot = Some(value);
    }

    let mut binding = TypeBinding::new();
    let fixed_params = signature
        .params
        .iter()
        .zip(assigned)
        .chain(signature.keyword_only.iter().zip(keyword_assigned));
    for (param, value) in fixed_params {
        let actual = match (value, &param.default) {
            (Some(value), _) if placeholder::is_iterated(value) => {
                return Err(TypeError::SpreadOutsideVariadic {
                    operation: operation.to_string(),
                    param: param.name.to_string(),
                });
            }
            (Some(value), _) => value.ty(),
            (None, Some(default)) => default.ty(),
            (None, None) => {
                return Err(TypeError::MissingArgument {
                    operation: operation.to_string(),
                    param: param.name.to_string(),
                });
            }
        };
        binding
            .unify(&param.ty, &actual)
            .map_err(|mismatch| match mismatch {
                Mismatch::Incompatible => TypeError::Incompatible {
                    operation: operation.to_string(),
                    param: param.name.to_string(),
                    expected: param.ty.clone(),
                    found: actual.clone(),
                },
                Mismatch::Conflict { var, bound, found } => TypeError::Conflict {
                    operation: operation.to_string(),
                    param: param.name.to_string(),
                    var,
                    expected: bound,
                    found,
                },
            })?;
    }

    if let Some(variadic) = &signature.variadic {
        for (index, value) in args.iter().enumerate().skip(fixed) {
            let actual = value.ty();
            binding
                .unify(&variadic.ty, &actual)
                .map_err(|mismatch| match mismatch {
                    Mismatch::Incompatible => TypeError::Incompatible {
                        operation: operation.to_string(),
                        param: variadic.name.to_string(),
                        expected: variadic.ty.clone(),
                        found: actual.clone(),
                    },
                    Mismatch::Conflict { var, bound, found } => TypeError::VariadicMismatch {
                        operation: operation.to_string(),
                        index: index - fixed,
                        var,
                        expected: bound,
                        found,
                    },
                })?;
        }
    }

    signature
        .ret
        .substitute(&binding)
        .map_err(|var| TypeError::UnboundVariable {
            operation: operation.to_string(),
            var,
        })
}
