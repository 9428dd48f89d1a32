#![forbid(unsafe_code)]

//! Computed-property definitions and the [`auto!`](crate::auto) macro.
//!
//! A [`ComputedDefinition`] is created once, when a type declares the
//! property, and never changes afterwards. Creating it fixes:
//!
//! - the dependency keys ([`DependentKeys`]), explicit or inferred from the
//!   parameter names;
//! - the parsed path of every key (interned, never re-parsed per read);
//! - the [`BindingPlan`] from keys to parameters.
//!
//! # Declaring
//!
//! ```ignore
//! use autoprop_runtime::{auto, Value};
//!
//! // Keys inferred from the parameter names: ["first", "last"].
//! let full = auto!(|first, last| format!("{first} {last}"));
//!
//! // Explicit keys, bound to parameters by last segment.
//! let lithium = auto!("elements.Li.name", "elements.Li.number" => |name, number| {
//!     format!("{name}: {number}")
//! });
//!
//! // No keys, no parameters: computed once.
//! let stamp = auto!(|| 42);
//! ```
//!
//! Without the macro, pass the key and parameter lists yourself:
//! [`ComputedDefinition::declare`] and [`ComputedDefinition::inferred`].

use std::fmt;
use std::rc::Rc;

use autoprop_core::path;
use autoprop_core::{BindingPlan, DependentKeys, Path, extract};

use crate::error::BoxError;
use crate::object::Object;
use crate::value::Value;

/// Signature of a compute function.
pub type ComputeFn = dyn Fn(&Args<'_>) -> Result<Value, BoxError>;

/// Arguments handed to a compute function.
///
/// Holds exactly one value per declared parameter, in parameter order, plus
/// the owning object.
pub struct Args<'a> {
    values: Vec<Value>,
    owner: &'a Object,
}

impl<'a> Args<'a> {
    pub(crate) fn new(values: Vec<Value>, owner: &'a Object) -> Self {
        Self { values, owner }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument `index`, or [`Value::Absent`] past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// All arguments as a fresh list value.
    #[must_use]
    pub fn to_list(&self) -> Value {
        Value::from(self.values.clone())
    }

    /// The object whose property is being computed.
    #[must_use]
    pub fn owner(&self) -> &'a Object {
        self.owner
    }
}

struct DefinitionInner {
    keys: DependentKeys,
    paths: Vec<Rc<Path>>,
    params: Vec<String>,
    plan: BindingPlan,
    compute: Box<ComputeFn>,
}

/// Immutable description of a computed property.
///
/// Cloning shares the definition.
#[derive(Clone)]
pub struct ComputedDefinition {
    inner: Rc<DefinitionInner>,
}

impl fmt::Debug for ComputedDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedDefinition")
            .field("keys", &self.inner.keys)
            .field("params", &self.inner.params)
            .finish_non_exhaustive()
    }
}

impl ComputedDefinition {
    /// Declare with explicit `keys` (may be empty) and the function's
    /// parameter names.
    ///
    /// Empty `keys` infer the keys from `params`; with both empty the
    /// property has no dependencies.
    pub fn declare<K, P, F>(keys: &[K], params: &[P], compute: F) -> Self
    where
        K: AsRef<str>,
        P: AsRef<str>,
        F: Fn(&Args<'_>) -> Result<Value, BoxError> + 'static,
    {
        let keys = extract(keys, params);
        let params: Vec<String> = params.iter().map(|p| p.as_ref().to_string()).collect();
        let paths: Vec<Rc<Path>> = keys.iter().map(path::intern).collect();
        let plan = if keys.is_explicit() {
            BindingPlan::by_name(&params, &paths)
        } else {
            BindingPlan::identity(params.len())
        };
        Self {
            inner: Rc::new(DefinitionInner {
                keys,
                paths,
                params,
                plan,
                compute: Box::new(compute),
            }),
        }
    }

    /// Declare with keys inferred from `params`.
    pub fn inferred<P, F>(params: &[P], compute: F) -> Self
    where
        P: AsRef<str>,
        F: Fn(&Args<'_>) -> Result<Value, BoxError> + 'static,
    {
        Self::declare::<&str, P, F>(&[], params, compute)
    }

    /// The dependency keys, or `None` when nothing is tracked.
    #[must_use]
    pub fn dependent_keys(&self) -> Option<&[String]> {
        self.inner.keys.as_slice()
    }

    #[must_use]
    pub fn keys(&self) -> &DependentKeys {
        &self.inner.keys
    }

    /// Parsed paths, aligned with the dependency keys.
    #[must_use]
    pub fn paths(&self) -> &[Rc<Path>] {
        &self.inner.paths
    }

    /// Parameter names, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.inner.plan
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.inner.keys.is_explicit()
    }

    /// Whether the property has no dependencies at all.
    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.inner.keys.is_untracked()
    }

    /// Bind `resolved` (aligned with the keys) to the parameters.
    #[must_use]
    pub fn bind(&self, resolved: &[Value]) -> Vec<Value> {
        self.inner.plan.apply(resolved, &Value::Absent)
    }

    pub(crate) fn invoke(&self, args: &Args<'_>) -> Result<Value, BoxError> {
        (self.inner.compute)(args)
    }
}

/// Declare a [`ComputedDefinition`] whose parameter names double as
/// dependency keys.
///
/// - `auto!(|a, b| body)`: keys `["a", "b"]`;
/// - `auto!("x.a", "y" => |a, b, c| body)`: explicit keys, parameters bound
///   by name;
/// - `auto!(|| body)`: no dependencies.
///
/// Each parameter is a [`Value`]; `body` may use `?` and must evaluate to
/// something convertible into a `Value`.
#[macro_export]
macro_rules! auto {
    (|| $body:expr) => {
        $crate::ComputedDefinition::inferred(
            &[] as &[&str],
            move |_args: &$crate::Args<'_>| Ok($crate::Value::from($body)),
        )
    };
    (|$($param:ident),+ $(,)?| $body:expr) => {
        $crate::ComputedDefinition::inferred(
            &[$(stringify!($param)),+],
            move |args: &$crate::Args<'_>| {
                let mut values = args.values().iter().cloned();
                $(
                    #[allow(unused_variables, non_snake_case)]
                    let $param: $crate::Value = values.next().unwrap_or_default();
                )+
                Ok($crate::Value::from($body))
            },
        )
    };
    ($($key:literal),+ => || $body:expr) => {
        $crate::ComputedDefinition::declare(
            &[$($key),+],
            &[] as &[&str],
            move |_args: &$crate::Args<'_>| Ok($crate::Value::from($body)),
        )
    };
    ($($key:literal),+ => |$($param:ident),+ $(,)?| $body:expr) => {
        $crate::ComputedDefinition::declare(
            &[$($key),+],
            &[$(stringify!($param)),+],
            move |args: &$crate::Args<'_>| {
                let mut values = args.values().iter().cloned();
                $(
                    #[allow(unused_variables, non_snake_case)]
                    let $param: $crate::Value = values.next().unwrap_or_default();
                )+
                Ok($crate::Value::from($body))
            },
        )
    };
}
