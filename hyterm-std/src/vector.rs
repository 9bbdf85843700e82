//! Homogeneous vectors.
//!
//! `Vec[T]` is built with `Vec.create(*items)`; every item must resolve `T` to the same type.
//! An empty vector names its element type through the class receiver: `Vec[int].create()`.
//! The rules reduce structural operations (`concat`, `push`, `first`, `rest`, `length`,
//! `getitem`) on vectors whose items are known. A vector holding a spread has an unknown
//! number of items; only `concat` and `push` apply to it, and `concat` only while the joined
//! vector holds a single spread.
use hyterm::{
    error::{HyResult, TypeError},
    expr::{ExprClass, Expression, Operation, Value, placeholder},
    expr_class,
    rules::{
        Constraint, DEFAULT, Replacement, Rule, RuleLibrary,
        pattern::{Bindings, var, variadic, variadic_of, wildcard},
    },
    types::Ty,
};
use log::debug;
use once_cell::sync::Lazy;

use crate::integer::{Integer, integer_ty};

/// Name of the vector class.
pub const VEC: &str = "Vec";

/// `Vec[element]`
pub fn vec_ty(element: Ty) -> Ty {
    Ty::generic(VEC, [element])
}

fn t() -> Ty {
    Ty::var("T")
}

/// `Vec[T].create(*items: T) -> Vec[T]`
pub static CREATE: Lazy<Operation> = Lazy::new(|| {
    Operation::class_method(&vec_ty(t()), "create")
        .variadic("items", t())
        .returns(vec_ty(t()))
        .build()
});

/// `Vec[T].concat(self, other: Vec[T]) -> Vec[T]`
pub static CONCAT: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&vec_ty(t()), "concat")
        .param("other", vec_ty(t()))
        .returns(vec_ty(t()))
        .build()
});

/// `Vec[T].push(self, item: T) -> Vec[T]`
pub static PUSH: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&vec_ty(t()), "push")
        .param("item", t())
        .returns(vec_ty(t()))
        .build()
});

/// `Vec[T].first(self) -> T`
pub static FIRST: Lazy<Operation> =
    Lazy::new(|| Operation::method(&vec_ty(t()), "first").returns(t()).build());

/// `Vec[T].rest(self) -> Vec[T]`
pub static REST: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&vec_ty(t()), "rest")
        .returns(vec_ty(t()))
        .build()
});

/// `Vec[T].length(self) -> Integer`
pub static LENGTH: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&vec_ty(t()), "length")
        .returns(integer_ty())
        .build()
});

/// `Vec[T].getitem(self, i: int) -> T`
pub static GETITEM: Lazy<Operation> = Lazy::new(|| {
    Operation::method(&vec_ty(t()), "getitem")
        .param("i", Ty::int())
        .returns(t())
        .build()
});

expr_class! {
    /// A vector expression.
    pub struct Vector = "Vec";
}

impl Vector {
    /// `Vec.create(*items)`; the element type is taken from the items.
    pub fn create(items: impl IntoIterator<Item = Value>) -> Result<Self, TypeError> {
        CREATE
            .call_class(&Ty::class(VEC), items)
            .map(Self::from_expr_unchecked)
    }

    /// `Vec[element].create()`
    pub fn empty(element: Ty) -> Result<Self, TypeError> {
        CREATE
            .call_class(&vec_ty(element), [])
            .map(Self::from_expr_unchecked)
    }

    /// `Vec.create(*items, *source, *after)` with `source` an `Iterable[T]` placeholder.
    pub fn spread(
        items: impl IntoIterator<Item = Value>,
        source: impl Into<Value>,
        after: impl IntoIterator<Item = Value>,
    ) -> Result<Self, TypeError> {
        CREATE
            .apply()
            .arg(Ty::class(VEC))
            .args(items)
            .spread(source)
            .args(after)
            .build()
            .map(Self::from_expr_unchecked)
    }

    /// The element type, once resolved.
    pub fn element(&self) -> Option<&Ty> {
        self.0.ty().args().first()
    }

    pub fn concat(&self, other: &Vector) -> Result<Self, TypeError> {
        CONCAT
            .invoke(self.0.clone(), [Value::Expr(other.0.clone())])
            .map(Self::from_expr_unchecked)
    }

    pub fn push(&self, item: impl Into<Value>) -> Result<Self, TypeError> {
        let item: Value = item.into();
        PUSH.invoke(self.0.clone(), [item])
            .map(Self::from_expr_unchecked)
    }

    pub fn first(&self) -> Result<Expression, TypeError> {
        FIRST.invoke(self.0.clone(), [])
    }

    pub fn rest(&self) -> Result<Self, TypeError> {
        REST.invoke(self.0.clone(), [])
            .map(Self::from_expr_unchecked)
    }

    pub fn length(&self) -> Result<Integer, TypeError> {
        LENGTH
            .invoke(self.0.clone(), [])
            .map(Integer::from_expr_unchecked)
    }

    pub fn getitem(&self, i: i64) -> Result<Expression, TypeError> {
        GETITEM.invoke(self.0.clone(), [Value::Int(i)])
    }

    /// The items of a `Vec.create(..)` expression, if none of them is a spread.
    pub fn items(&self) -> Option<&[Value]> {
        if self.0.operation() != &*CREATE {
            return None;
        }
        let items = self.0.args().get(1..)?;
        (!items.iter().any(placeholder::is_iterated)).then_some(items)
    }
}

/// `Vec.create(?class, *?items)`
fn vec_pattern(class: &str, items: &str) -> Result<Expression, TypeError> {
    CREATE.invoke(wildcard(class), [variadic_of(items, t())])
}

/// The captured items contain no spread.
fn known_items(names: &'static [&'static str]) -> Constraint {
    Constraint::predicate(names.iter().copied(), move |bindings: &Bindings| {
        names.iter().all(|name| match bindings.values(name) {
            Ok(values) => !values.iter().any(placeholder::is_iterated),
            Err(_) => bindings
                .value(name)
                .is_ok_and(|value| !placeholder::is_iterated(value)),
        })
    })
}

/// The captured items hold at most one spread between them.
fn one_spread(names: &'static [&'static str]) -> Constraint {
    Constraint::predicate(names.iter().copied(), move |bindings: &Bindings| {
        let spreads: usize = names
            .iter()
            .filter_map(|name| bindings.values(name).ok())
            .map(|values| values.iter().filter(|value| placeholder::is_iterated(value)).count())
            .sum();
        spreads <= 1
    })
}

/// Index into `len` items; negative indices count from the end.
fn resolve_index(i: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { i + len } else { i };
    (0..len).contains(&i).then_some(i as usize)
}

/// The rules of the vector domain, with the registry each one belongs to.
pub fn rules() -> HyResult<Vec<(&'static str, Rule)>> {
    let concat = Rule::new(
        "vec_concat",
        CONCAT.invoke(vec_pattern("cls", "xs")?, [Value::Expr(vec_pattern("_", "ys")?)])?,
        Replacement::template(CREATE.invoke(
            wildcard("cls"),
            [variadic_of("xs", t()), variadic_of("ys", t())],
        )?),
    )
    .with_constraint(one_spread(&["xs", "ys"]));

    let push = Rule::new(
        "vec_push",
        PUSH.invoke(vec_pattern("cls", "xs")?, [wildcard("item")])?,
        Replacement::template(CREATE.invoke(wildcard("cls"), [variadic("xs"), wildcard("item")])?),
    );

    let first = Rule::new(
        "vec_first",
        FIRST.invoke(
            CREATE.invoke(wildcard("_"), [wildcard("head"), variadic("_")])?,
            [],
        )?,
        Replacement::template(wildcard("head")),
    )
    .with_constraint(known_items(&["head"]));

    // The class of the rest is pinned to the type of the dropped head so that an empty rest
    // still knows its element type.
    let rest = Rule::new(
        "vec_rest",
        REST.invoke(
            CREATE.invoke(wildcard("_"), [wildcard("head"), variadic_of("tail", t())])?,
            [],
        )?,
        Replacement::lazy(|bindings| {
            let class = vec_ty(bindings.value("head")?.ty());
            let tail = bindings.values("tail")?.iter().cloned();
            Ok(CREATE.call_class(&class, tail)?.into())
        }),
    )
    .with_constraint(known_items(&["head", "tail"]));

    let length = Rule::new(
        "vec_length",
        LENGTH.invoke(vec_pattern("_", "xs")?, [])?,
        Replacement::lazy(|bindings| {
            let len = i64::try_from(bindings.values("xs")?.len()).unwrap_or(i64::MAX);
            Ok(Integer::from_int(len)?.into())
        }),
    )
    .with_constraint(known_items(&["xs"]));

    let getitem = Rule::new(
        "vec_getitem",
        GETITEM.invoke(vec_pattern("_", "xs")?, [var("i", Ty::int())])?,
        Replacement::lazy(|bindings| {
            let items = bindings.values("xs")?;
            let index = resolve_index(bindings.int("i")?, items.len());
            // Guarded by the constraint below.
            Ok(index.and_then(|i| items.get(i)).cloned().unwrap_or(Value::None))
        }),
    )
    .with_constraint(known_items(&["xs"]))
    .with_constraint(Constraint::predicate(["xs", "i"], |bindings| {
        match (bindings.values("xs"), bindings.int("i")) {
            (Ok(items), Ok(i)) => resolve_index(i, items.len()).is_some(),
            _ => false,
        }
    }));

    Ok(vec![
        (DEFAULT, concat),
        (DEFAULT, push),
        (DEFAULT, first),
        (DEFAULT, rest),
        (DEFAULT, length),
        (DEFAULT, getitem),
    ])
}

/// Register the vector rules into `library`.
pub fn register(library: &mut RuleLibrary) -> HyResult<()> {
    for (registry, rule) in rules()? {
        library.register(registry, rule)?;
    }
    debug!("Registered the vector domain");
    Ok(())
}
