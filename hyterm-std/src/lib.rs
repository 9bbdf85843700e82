//! Client domains built on [`hyterm`].
//!
//! Each domain declares its classes as [`expr_class!`](hyterm::expr_class) wrappers, its
//! operations as lazily built statics and its rules through a `rules()` / `register()` pair.
//!
//! Example
//! ```
//! use hyterm::prelude::*;
//! use hyterm_std::integer::Integer;
//!
//! let mut library = RuleLibrary::new();
//! hyterm_std::register_all(&mut library).unwrap();
//!
//! let one = Integer::from_int(1).unwrap();
//! let two = Integer::from_int(2).unwrap();
//! let sum = one.add(&two).unwrap();
//!
//! let result = Rewriter::new(&library).execute(sum, DEFAULT).unwrap();
//! assert_eq!(result, Value::from(Integer::from_int(3).unwrap()));
//! ```
use hyterm::{error::HyResult, rules::RuleLibrary};
use log::info;

pub mod boolean;
pub mod integer;
pub mod unify;
pub mod vector;

/// Register the rules of every domain into `library`.
pub fn register_all(library: &mut RuleLibrary) -> HyResult<()> {
    boolean::register(library)?;
    integer::register(library)?;
    vector::register(library)?;
    unify::register(library)?;
    info!(
        "Registered the standard domains ({} registries)",
        library.registry_names().count()
    );
    Ok(())
}
