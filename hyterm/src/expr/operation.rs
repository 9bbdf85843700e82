use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use strum::EnumIs;

use crate::{
    error::{HyError, HyResult, TypeError},
    expr::{ArgVec, Expression, KwArgs, Value, placeholder},
    types::{
        Ty,
        signature::{Param, Signature},
    },
};

/// Native implementation of an operation, used when every argument is a literal.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum OperationKind {
    /// A free function.
    Function,

    /// An instance method; the receiver is the first positional argument.
    Method,

    /// A class method; the class type object is the first positional argument.
    ClassMethod,
}

struct OperationDef {
    name: Arc<str>,
    qualified: Arc<str>,
    owner: Option<Ty>,
    kind: OperationKind,
    signature: Signature,
    implementation: Option<NativeFn>,
    builtin: bool,
}

/// A typed operation stub. Its qualified name is its identity; the substrate's built-in
/// operations live apart from client operations of the same name.
///
/// Operations are declared once (typically in a `Lazy` static) and called to build
/// expressions; calling never evaluates anything.
#[derive(Clone)]
pub struct Operation(Arc<OperationDef>);

impl Operation {
    /// Declare a free function.
    pub fn function(name: impl Into<Arc<str>>) -> OperationBuilder {
        let name = name.into();
        OperationBuilder::new(name.clone(), name, None, OperationKind::Function)
    }

    /// Declare a method of `owner`; adds the `self: owner` receiver parameter.
    pub fn method(owner: &Ty, name: impl Into<Arc<str>>) -> OperationBuilder {
        let name = name.into();
        let qualified = qualify(owner, &name);
        OperationBuilder::new(name, qualified, Some(owner.clone()), OperationKind::Method)
            .param("self", owner.clone())
    }

    /// Declare a class method of `owner`; adds the `cls: Type[owner]` receiver parameter.
    pub fn class_method(owner: &Ty, name: impl Into<Arc<str>>) -> OperationBuilder {
        let name = name.into();
        let qualified = qualify(owner, &name);
        OperationBuilder::new(
            name,
            qualified,
            Some(owner.clone()),
            OperationKind::ClassMethod,
        )
        .param("cls", Ty::type_of(owner.clone()))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// `Owner.name` for methods and class methods, `name` for free functions.
    pub fn qualified(&self) -> &str {
        &self.0.qualified
    }

    pub fn owner(&self) -> Option<&Ty> {
        self.0.owner.as_ref()
    }

    pub fn kind(&self) -> OperationKind {
        self.0.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    /// Whether this is one of the substrate's own operations.
    pub fn is_builtin(&self) -> bool {
        self.0.builtin
    }

    pub fn has_implementation(&self) -> bool {
        self.0.implementation.is_some()
    }

    /// Build an expression from positional arguments.
    pub fn call(&self, args: impl IntoIterator<Item = Value>) -> Result<Expression, TypeError> {
        Expression::construct(self.clone(), args.into_iter().collect(), KwArgs::new())
    }

    /// Build a method call on `receiver`.
    pub fn invoke(
        &self,
        receiver: impl Into<Value>,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Expression, TypeError> {
        let args = std::iter::once(receiver.into()).chain(args).collect();
        Expression::construct(self.clone(), args, KwArgs::new())
    }

    /// Build a class method call on the class `class` (e.g. `Converter[Boolean]`).
    pub fn call_class(
        &self,
        class: &Ty,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Expression, TypeError> {
        self.invoke(Value::Type(class.clone()), args)
    }

    /// Start a call with keyword arguments or a spread.
    pub fn apply(&self) -> Call<'_> {
        Call {
            operation: self,
            args: ArgVec::new(),
            kwargs: KwArgs::new(),
            spread: false,
            error: None,
        }
    }

    /// Run the native implementation on literal arguments.
    pub fn evaluate(&self, args: &[Value]) -> HyResult<Value> {
        let implementation =
            self.0
                .implementation
                .as_ref()
                .ok_or_else(|| HyError::Evaluation {
                    operation: self.qualified().to_string(),
                    message: "no native implementation".to_string(),
                })?;
        implementation(args).map_err(|message| HyError::Evaluation {
            operation: self.qualified().to_string(),
            message,
        })
    }
}

fn qualify(owner: &Ty, name: &str) -> Arc<str> {
    match owner.name() {
        Some(owner) => format!("{owner}.{name}").into(),
        None => name.into(),
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.qualified == other.0.qualified && self.0.builtin == other.0.builtin)
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.qualified.hash(state);
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation({}{})", self.qualified(), self.signature())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified())
    }
}

/// Builder returned by [`Operation::function`], [`Operation::method`] and
/// [`Operation::class_method`].
pub struct OperationBuilder {
    name: Arc<str>,
    qualified: Arc<str>,
    owner: Option<Ty>,
    kind: OperationKind,
    signature: Signature,
    implementation: Option<NativeFn>,
    builtin: bool,
}

impl OperationBuilder {
    fn new(name: Arc<str>, qualified: Arc<str>, owner: Option<Ty>, kind: OperationKind) -> Self {
        Self {
            name,
            qualified,
            owner,
            kind,
            signature: Signature::default(),
            implementation: None,
            builtin: false,
        }
    }

    pub fn param(mut self, name: impl Into<Arc<str>>, ty: Ty) -> Self {
        self.signature.params.push(Param::new(name, ty));
        self
    }

    pub fn param_default(
        mut self,
        name: impl Into<Arc<str>>,
        ty: Ty,
        default: impl Into<Value>,
    ) -> Self {
        self.signature
            .params
            .push(Param::new(name, ty).with_default(default));
        self
    }

    /// Set the `*name: ty` parameter collecting extra positional arguments.
    pub fn variadic(mut self, name: impl Into<Arc<str>>, ty: Ty) -> Self {
        self.signature.variadic = Some(Param::new(name, ty));
        self
    }

    pub fn keyword_only(mut self, name: impl Into<Arc<str>>, ty: Ty) -> Self {
        self.signature.keyword_only.push(Param::new(name, ty));
        self
    }

    pub fn keyword_default(
        mut self,
        name: impl Into<Arc<str>>,
        ty: Ty,
        default: impl Into<Value>,
    ) -> Self {
        self.signature
            .keyword_only
            .push(Param::new(name, ty).with_default(default));
        self
    }

    pub fn returns(mut self, ty: Ty) -> Self {
        self.signature.ret = ty;
        self
    }

    pub fn implementation<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.implementation = Some(Arc::new(f));
        self
    }

    /// Mark the operation as one of the substrate's own (wildcards, iterated placeholders).
    /// Built-ins never equal a client operation of the same name.
    pub(crate) fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    pub fn build(self) -> Operation {
        Operation(Arc::new(OperationDef {
            name: self.name,
            qualified: self.qualified,
            owner: self.owner,
            kind: self.kind,
            signature: self.signature,
            implementation: self.implementation,
            builtin: self.builtin,
        }))
    }
}

/// A call under construction; see [`Operation::apply`].
///
/// Errors raised while adding arguments are reported by [`Call::build`].
pub struct Call<'a> {
    operation: &'a Operation,
    args: ArgVec,
    kwargs: KwArgs,
    spread: bool,
    error: Option<TypeError>,
}

impl Call<'_> {
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn args(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.args.extend(values);
        self
    }

    /// Spread an `Iterable[T]` placeholder into the positional arguments (`f(a, *it, b)`).
    ///
    /// The spread is kept as a single iterated placeholder argument; it is never unrolled.
    pub fn spread(mut self, source: impl Into<Value>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.spread {
            self.error = Some(TypeError::MultipleSpreads {
                operation: self.operation.qualified().to_string(),
            });
            return self;
        }
        self.spread = true;
        match placeholder::iterate_for(self.operation.qualified(), source.into()) {
            Ok(iterated) => self.args.push(Value::Expr(iterated)),
            Err(err) => self.error = Some(err),
        }
        self
    }

    pub fn kwarg(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if self.kwargs.contains_key(&name) && self.error.is_none() {
            self.error = Some(TypeError::DuplicateArgument {
                operation: self.operation.qualified().to_string(),
                param: name.to_string(),
            });
        }
        self.kwargs.insert(name, value.into());
        self
    }

    pub fn build(self) -> Result<Expression, TypeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Expression::construct(self.operation.clone(), self.args, self.kwargs)
    }
}
