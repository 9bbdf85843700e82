//! Driving rule registries over expression trees.
//!
//! A [`Rewriter`] performs one rewrite per step: it searches the tree in pre-order (the root
//! first, then positional arguments left to right, then keyword arguments in name order) and
//! rewrites the first node some rule matches, trying the given registries in order at every
//! node. Because the search is top-down, a rule can discard a subtree before anything inside it
//! is rewritten; this is what makes lazy conditionals lazy.
//!
//! Ancestors of a rewritten node are rebuilt around the replacement with their declared types
//! preserved.
use log::{debug, info, trace};

use crate::{
    config::EngineConfig,
    error::{HyError, HyResult},
    expr::{ArgVec, Expression, KwArgs, Operation, Slot, Value},
    rules::{
        Constraint, Replacement, Rule, RuleLibrary, RuleRegistry,
        pattern::{self, Captured},
    },
};

/// Applies the rules of a [`RuleLibrary`].
#[derive(Debug, Clone)]
pub struct Rewriter<'a> {
    library: &'a RuleLibrary,
    config: EngineConfig,
}

impl<'a> Rewriter<'a> {
    pub fn new(library: &'a RuleLibrary) -> Self {
        Self::with_config(library, EngineConfig::default())
    }

    pub fn with_config(library: &'a RuleLibrary, config: EngineConfig) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &'a RuleLibrary {
        self.library
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn registries(&self, names: &[&str]) -> HyResult<Vec<&'a RuleRegistry>> {
        names.iter().map(|name| self.library.registry(name)).collect()
    }

    /// Rewrite the first matching node of `value`, or return `None` when no rule applies.
    pub fn step(&self, value: &Value, registries: &[&RuleRegistry]) -> HyResult<Option<Value>> {
        let Value::Expr(root) = value else {
            return Ok(None);
        };

        // (depth, slot in the parent, node)
        let mut stack: Vec<(usize, Option<Slot>, Expression)> = vec![(0, None, root.clone())];
        let mut ancestors: Vec<Expression> = Vec::new();
        let mut path: Vec<Slot> = Vec::new();

        while let Some((depth, slot, expr)) = stack.pop() {
            ancestors.truncate(depth);
            path.truncate(depth.saturating_sub(1));
            path.extend(slot);

            for registry in registries {
                if let Some((rule, replacement)) = registry.rewrite_node(&expr)? {
                    trace!(
                        "Rule `{}` of `{}` rewrote {} into {}",
                        rule.name(),
                        registry.name(),
                        expr,
                        replacement
                    );
                    let rebuilt = ancestors
                        .iter()
                        .zip(path.iter())
                        .rev()
                        .fold(replacement, |child, (parent, slot)| {
                            Value::Expr(parent.with_slot(slot, child))
                        });
                    return Ok(Some(rebuilt));
                }
            }

            for (name, child) in expr.kwargs().iter().rev() {
                if let Value::Expr(child) = child {
                    stack.push((depth + 1, Some(Slot::Kwarg(name.clone())), child.clone()));
                }
            }
            for (index, child) in expr.args().iter().enumerate().rev() {
                if let Value::Expr(child) = child {
                    stack.push((depth + 1, Some(Slot::Arg(index)), child.clone()));
                }
            }
            ancestors.push(expr);
        }

        Ok(None)
    }

    /// Perform a single rewrite with `registry`; `value` is returned unchanged if no rule
    /// matches anywhere in it.
    pub fn match_and_rewrite(&self, value: Value, registry: &str) -> HyResult<Value> {
        let registries = self.registries(&[registry])?;
        Ok(self.step(&value, &registries)?.unwrap_or(value))
    }

    /// Rewrite with `registry` until no rule applies or the value is no longer an expression.
    pub fn execute(&self, value: impl Into<Value>, registry: &str) -> HyResult<Value> {
        self.execute_until(value, &[registry], |value| !value.is_expr())
    }

    /// Rewrite with the given registries, tried in order at every node, until no rule applies
    /// or the value is no longer an expression.
    pub fn execute_all(&self, value: impl Into<Value>, registries: &[&str]) -> HyResult<Value> {
        self.execute_until(value, registries, |value| !value.is_expr())
    }

    /// Rewrite until no rule applies or `done` accepts the current value.
    pub fn execute_until<F>(
        &self,
        value: impl Into<Value>,
        registries: &[&str],
        done: F,
    ) -> HyResult<Value>
    where
        F: Fn(&Value) -> bool,
    {
        let registries = self.registries(registries)?;
        let mut value = value.into();
        let mut steps = 0usize;

        loop {
            if done(&value) {
                debug!("Execution extracted {value} after {steps} steps");
                return Ok(value);
            }
            match self.step(&value, &registries)? {
                Some(next) => {
                    steps += 1;
                    if let Some(limit) = self.config.max_steps.filter(|&limit| steps > limit) {
                        return Err(HyError::StepLimitExceeded { limit });
                    }
                    if self.config.trace_steps {
                        debug!("Step {steps}: {next}");
                    }
                    value = next;
                }
                None => {
                    info!("Execution reached a fixpoint after {steps} steps");
                    return Ok(value);
                }
            }
        }
    }
}

/// A rule evaluating `operation` with its native implementation once every positional
/// argument is a literal.
///
/// Calls carrying keyword arguments are left alone.
pub fn default_rule(operation: &Operation) -> Rule {
    let args = ArgVec::from_iter([pattern::variadic("args")]);
    let head = Expression::from_parts(
        operation.clone(),
        args,
        KwArgs::new(),
        operation.signature().ret.clone(),
    );
    let evaluated = operation.clone();
    Rule::new(
        format!("{}.default", operation.qualified()),
        head,
        Replacement::lazy(move |bindings| evaluated.evaluate(bindings.values("args")?)),
    )
    .with_constraint(Constraint::predicate(["args"], |bindings| {
        matches!(
            bindings.get("args"),
            Some(Captured::Many(values)) if values.iter().all(Value::is_literal)
        )
    }))
}
