use std::{
    any::TypeId,
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use downcast_rs::{DowncastSync, impl_downcast};
use smallvec::SmallVec;
use strum::EnumIs;

use crate::{expr::Expression, types::Ty};

/// Keyword arguments of a call, ordered by name.
pub type KwArgs = BTreeMap<Arc<str>, Value>;

/// Positional arguments of a call.
pub type ArgVec = SmallVec<[Value; 4]>;

/// A host object embedded in an expression tree.
///
/// Implemented automatically for every [`NativeType`] that is `PartialEq + Hash + Debug`.
pub trait NativeObject: DowncastSync + fmt::Debug {
    /// Declared (native) type of the object.
    fn ty(&self) -> Ty;

    /// Dynamic equality; objects of different concrete types are never equal.
    fn eq_native(&self, other: &dyn NativeObject) -> bool;

    fn hash_native(&self, state: &mut dyn Hasher);
}
impl_downcast!(sync NativeObject);

/// Client host types that may be wrapped into a [`Value::Native`].
pub trait NativeType {
    fn native_ty(&self) -> Ty;
}

impl<T> NativeObject for T
where
    T: NativeType + PartialEq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn ty(&self) -> Ty {
        self.native_ty()
    }

    fn eq_native(&self, other: &dyn NativeObject) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }

    fn hash_native(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Shared handle on a [`NativeObject`].
#[derive(Clone)]
pub struct NativeValue(Arc<dyn NativeObject>);

impl NativeValue {
    pub fn new<T: NativeObject>(object: T) -> Self {
        Self(Arc::new(object))
    }

    pub fn ty(&self) -> Ty {
        self.0.ty()
    }

    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn object(&self) -> &dyn NativeObject {
        &*self.0
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_native(&*other.0)
    }
}

impl Eq for NativeValue {}

impl Hash for NativeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_native(state);
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An argument of an expression: either a literal leaf or a nested expression.
#[derive(Debug, Clone, EnumIs)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<[Value]>),
    Type(Ty),
    Native(NativeValue),
    Expr(Expression),
}

impl Value {
    /// The declared type of this value.
    pub fn ty(&self) -> Ty {
        match self {
            Value::None => Ty::none(),
            Value::Bool(_) => Ty::bool(),
            Value::Int(_) => Ty::int(),
            Value::Float(_) => Ty::float(),
            Value::Str(_) => Ty::str(),
            Value::List(_) => Ty::list(),
            Value::Type(ty) => Ty::type_of(ty.clone()),
            Value::Native(native) => native.ty(),
            Value::Expr(expr) => expr.ty().clone(),
        }
    }

    /// Whether this value is a literal (anything but an expression).
    pub fn is_literal(&self) -> bool {
        !self.is_expr()
    }

    pub fn as_expr(&self) -> Option<&Expression> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn into_expr(self) -> Option<Expression> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Ty> {
        match self {
            Value::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeValue> {
        match self {
            Value::Native(native) => Some(native),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Expr(a), Value::Expr(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Type(ty) => ty.hash(state),
            Value::Native(native) => native.hash(state),
            Value::Expr(expr) => expr.hash(state),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value.into())
    }
}

impl From<Ty> for Value {
    fn from(value: Ty) -> Self {
        Value::Type(value)
    }
}

impl From<NativeValue> for Value {
    fn from(value: NativeValue) -> Self {
        Value::Native(value)
    }
}

impl From<Expression> for Value {
    fn from(value: Expression) -> Self {
        Value::Expr(value)
    }
}

impl From<&Expression> for Value {
    fn from(value: &Expression) -> Self {
        Value::Expr(value.clone())
    }
}
