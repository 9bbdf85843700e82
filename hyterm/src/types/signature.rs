use std::{fmt, sync::Arc};

use crate::{expr::Value, types::Ty};

/// A named, typed parameter, optionally defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Arc<str>,
    pub ty: Ty,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// The typed stub of an operation.
///
/// Positional-or-keyword parameters come first (for methods, the receiver is the first of
/// them), then an optional variadic parameter collecting the remaining positional arguments,
/// then keyword-only parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub variadic: Option<Param>,
    pub keyword_only: Vec<Param>,
    pub ret: Ty,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            variadic: None,
            keyword_only: Vec::new(),
            ret: Ty::expression(),
        }
    }
}

impl Signature {
    /// Look a parameter up by name, among positional-or-keyword and keyword-only parameters.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params
            .iter()
            .chain(self.keyword_only.iter())
            .find(|param| &*param.name == name)
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params
            .iter()
            .chain(self.variadic.iter())
            .chain(self.keyword_only.iter())
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !std::mem::take(&mut first) {
                write!(f, ", ")?;
            }
            Ok(())
        };
        for param in &self.params {
            sep(f)?;
            write!(f, "{param}")?;
        }
        if let Some(variadic) = &self.variadic {
            sep(f)?;
            write!(f, "*{variadic}")?;
        } else if !self.keyword_only.is_empty() {
            sep(f)?;
            write!(f, "*")?;
        }
        for param in &self.keyword_only {
            sep(f)?;
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}
