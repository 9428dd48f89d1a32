#![forbid(unsafe_code)]

//! Core: dependency path grammar, key extraction, and argument binding plans.
//!
//! Everything in this crate is pure and total; the host object model, path
//! resolution and caching live in `autoprop-runtime`.

pub mod binding;
pub mod keys;
pub mod path;

pub use binding::BindingPlan;
pub use keys::{DependentKeys, extract};
pub use path::{Path, PathCache, Projection};
