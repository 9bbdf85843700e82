//! Rewrite rules and named rule registries.
//!
//! A [`Rule`] pairs a pattern with a replacement: either a template value instantiated with the
//! captured bindings, or a [`Thunk`] forced only when the rule is selected. Rules live in named
//! [`RuleRegistry`] partitions of a [`RuleLibrary`]; within a registry they are tried in
//! registration order and the first match wins.
//!
//! ## Typical usage
//! ```
//! use hyterm::expr::Operation;
//! use hyterm::rules::{RuleLibrary, Rule, Replacement, DEFAULT, pattern::wildcard};
//! use hyterm::rules::engine::Rewriter;
//! use hyterm::types::Ty;
//! use hyterm::args;
//!
//! let double = Operation::function("double").param("x", Ty::Any).returns(Ty::Any).build();
//! let rule = Rule::new(
//!     "double_is_identity",
//!     double.call([wildcard("x")]).unwrap(),
//!     Replacement::template(wildcard("x")),
//! );
//!
//! let mut library = RuleLibrary::new();
//! library.register(DEFAULT, rule).unwrap();
//!
//! let value = double.call(args![3]).unwrap();
//! let result = Rewriter::new(&library).execute(value, DEFAULT).unwrap();
//! assert_eq!(result, 3.into());
//! ```
use std::{collections::BTreeMap, fmt, sync::Arc};

use either::Either;
use log::debug;

use crate::{
    error::{HyError, HyResult, RuleError},
    expr::{Expression, Value},
    rules::pattern::Bindings,
};

pub mod engine;
pub mod pattern;

/// Registry evaluating operations (literal folding, simplifications).
pub const DEFAULT: &str = "default";

/// Registry answering `Converter[T].convert(..)` requests.
pub const CONVERT: &str = "convert";

/// Registry extracting native values out of placeholders.
pub const UNBOX: &str = "unbox";

/// A deferred replacement body.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn(&Bindings) -> HyResult<Value> + Send + Sync>);

impl Thunk {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Bindings) -> HyResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Compute the replacement for the given bindings.
    pub fn force(&self, bindings: &Bindings) -> HyResult<Value> {
        (self.0)(bindings)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Replacement {
    /// A value whose wildcards are substituted with the captured bindings.
    Template(Value),

    /// A body computed from the bindings, only when the rule is selected.
    Thunk(Thunk),
}

impl Replacement {
    pub fn template(value: impl Into<Value>) -> Self {
        Replacement::Template(value.into())
    }

    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn(&Bindings) -> HyResult<Value> + Send + Sync + 'static,
    {
        Replacement::Thunk(Thunk::new(f))
    }
}

/// A cross-variable condition checked after a structural match.
#[derive(Clone)]
pub enum Constraint {
    /// Both names captured equal values.
    Equal(Arc<str>, Arc<str>),

    /// A predicate over the bindings; `names` lists the bindings it reads.
    Predicate {
        names: Vec<Arc<str>>,
        check: Arc<dyn Fn(&Bindings) -> bool + Send + Sync>,
    },
}

impl Constraint {
    pub fn equal(a: impl Into<Arc<str>>, b: impl Into<Arc<str>>) -> Self {
        Constraint::Equal(a.into(), b.into())
    }

    pub fn predicate<F>(names: impl IntoIterator<Item = impl Into<Arc<str>>>, check: F) -> Self
    where
        F: Fn(&Bindings) -> bool + Send + Sync + 'static,
    {
        Constraint::Predicate {
            names: names.into_iter().map(Into::into).collect(),
            check: Arc::new(check),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Constraint::Equal(a, b) => vec![&**a, &**b],
            Constraint::Predicate { names, .. } => names.iter().map(|name| &**name).collect(),
        }
    }

    pub fn holds(&self, bindings: &Bindings) -> bool {
        match self {
            Constraint::Equal(a, b) => match (bindings.get(a), bindings.get(b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Constraint::Predicate { check, .. } => check(bindings),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equal(a, b) => write!(f, "Equal({a}, {b})"),
            Constraint::Predicate { names, .. } => write!(f, "Predicate({names:?})"),
        }
    }
}

/// An immutable rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: Arc<str>,
    pattern: Value,
    replacement: Replacement,
    constraints: Vec<Constraint>,
}

impl Rule {
    pub fn new(name: impl Into<Arc<str>>, pattern: impl Into<Value>, replacement: Replacement) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replacement,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Value {
        &self.pattern
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The operation applied at the root of the pattern.
    pub fn head(&self) -> Option<&Expression> {
        self.pattern
            .as_expr()
            .filter(|expr| pattern::classify(expr).is_none())
    }

    /// Check that the rule is well formed.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.head().is_none() {
            return Err(RuleError::NoConcreteHead {
                rule: self.name.to_string(),
                found: self.pattern.to_string(),
            });
        }

        // Wildcard name -> whether it is variadic.
        let mut arity: BTreeMap<&str, bool> = BTreeMap::new();
        for wildcard in pattern::wildcards(&self.pattern) {
            let name = wildcard.name();
            if name == pattern::ANONYMOUS {
                continue;
            }
            let previous = arity.insert(name, wildcard.is_variadic());
            if previous.is_some_and(|variadic| variadic != wildcard.is_variadic()) {
                return Err(RuleError::MixedWildcardArity {
                    rule: self.name.to_string(),
                    name: name.to_string(),
                });
            }
        }

        for constraint in &self.constraints {
            if let Some(name) = constraint.names().into_iter().find(|n| !arity.contains_key(n)) {
                return Err(RuleError::UnboundConstraintName {
                    rule: self.name.to_string(),
                    name: name.to_string(),
                });
            }
        }

        if let Replacement::Template(template) = &self.replacement {
            for wildcard in pattern::wildcards(template) {
                match arity.get(wildcard.name()) {
                    None => {
                        return Err(RuleError::UnboundTemplateName {
                            rule: self.name.to_string(),
                            name: wildcard.name().to_string(),
                        });
                    }
                    Some(&variadic) if variadic != wildcard.is_variadic() => {
                        return Err(RuleError::MixedWildcardArity {
                            rule: self.name.to_string(),
                            name: wildcard.name().to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Match the pattern against `subject`, returning the first bindings satisfying every
    /// constraint.
    pub fn matches(&self, subject: &Value) -> Option<Bindings> {
        let mut found = None;
        pattern::match_with(&self.pattern, subject, &mut |bindings| {
            if self.constraints.iter().all(|c| c.holds(bindings)) {
                found = Some(bindings.clone());
                true
            } else {
                false
            }
        });
        found
    }

    /// Rewrite `subject` with this rule, if it matches.
    pub fn apply(&self, subject: &Value) -> HyResult<Option<Value>> {
        let Some(bindings) = self.matches(subject) else {
            return Ok(None);
        };
        let replacement = match &self.replacement {
            Replacement::Template(template) => pattern::substitute(template, &bindings)?,
            Replacement::Thunk(thunk) => thunk.force(&bindings)?,
        };
        Ok(Some(replacement))
    }
}

/// An ordered, named collection of rules.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    name: Arc<str>,
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite the root of `expr` with the first matching rule, in registration order.
    pub fn rewrite_node(&self, expr: &Expression) -> HyResult<Option<(&Rule, Value)>> {
        let subject = Value::Expr(expr.clone());
        for rule in &self.rules {
            if let Some(replacement) = rule.apply(&subject)? {
                return Ok(Some((rule, replacement)));
            }
        }
        Ok(None)
    }
}

/// Every rule registry of a program, by name.
#[derive(Debug, Clone)]
pub struct RuleLibrary {
    registries: BTreeMap<Arc<str>, RuleRegistry>,
}

impl Default for RuleLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLibrary {
    /// A library holding the empty `default`, `convert` and `unbox` registries.
    pub fn new() -> Self {
        let registries = [DEFAULT, CONVERT, UNBOX]
            .into_iter()
            .map(|name| (Arc::from(name), RuleRegistry::new(name)))
            .collect();
        Self { registries }
    }

    /// Validate `rule` and append it to `registry`, creating the registry if needed.
    pub fn register(&mut self, registry: &str, rule: Rule) -> HyResult<()> {
        rule.validate()?;
        debug!(
            "Registered rule `{}` into registry `{}`: {}",
            rule.name(),
            registry,
            rule.pattern()
        );
        self.registries
            .entry(Arc::from(registry))
            .or_insert_with(|| RuleRegistry::new(registry))
            .rules
            .push(rule);
        Ok(())
    }

    pub fn registry(&self, name: &str) -> HyResult<&RuleRegistry> {
        self.registries
            .get(name)
            .ok_or_else(|| HyError::RegistryNotFound(name.to_string()))
    }

    pub fn registry_names(&self) -> impl Iterator<Item = &str> {
        self.registries.keys().map(|name| &**name)
    }

    /// Rules of `registry` in registration order; empty when no such registry exists.
    pub fn rules(&self, registry: &str) -> impl Iterator<Item = &Rule> {
        if let Some(registry) = self.registries.get(registry) {
            Either::Left(registry.rules.iter())
        } else {
            Either::Right(std::iter::empty())
        }
    }
}
