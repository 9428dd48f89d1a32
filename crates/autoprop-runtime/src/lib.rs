#![forbid(unsafe_code)]

//! Runtime: host object model, dependency path resolution, and the lazy
//! computed-property cache.
//!
//! Types are declared with [`TypeBuilder`]; computed properties with the
//! [`auto!`] macro or [`ComputedDefinition`]. Reading a computed property
//! through [`Object::get`] computes it on first use, caches it, and
//! recomputes only after one of its dependency keys changed.

pub mod computed;
pub mod config;
pub mod definition;
pub mod error;
pub mod list;
pub mod object;
mod observer;
pub mod resolve;
pub mod root;
pub mod value;

pub use computed::CacheState;
pub use config::{EngineConfig, RootAliasRule, ZeroDependencyPolicy};
pub use definition::{Args, ComputeFn, ComputedDefinition};
pub use error::{AutoError, BoxError, Result};
pub use list::List;
pub use object::{Object, TypeBuilder, TypeDef, WeakObject};
pub use observer::Subscription;
pub use resolve::{PropertyAccess, Watches, resolve};
pub use value::Value;
