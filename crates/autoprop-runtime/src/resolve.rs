#![forbid(unsafe_code)]

//! Dependency path resolution.
//!
//! [`resolve`] turns a parsed [`Path`] into the current value it names,
//! starting from the owning object (or from the process root for aliased
//! paths), and records a subscription for every property it touches in a
//! [`Watches`] set.
//!
//! # Rules
//!
//! - Each segment is read (and observed) on the current container. A missing
//!   or non-container intermediate short-circuits to [`Value::Absent`].
//! - `base.[]` yields the list at `base` itself (shared, not copied) and
//!   observes its structure.
//! - `base.@each.field` yields a fresh list of every element's `field` and
//!   observes both the list structure and `field` on each element.
//! - A projection over an absent or null base yields [`Value::Absent`]; over
//!   any other non-list value it fails with [`AutoError::NotACollection`].
//!
//! Errors raised while reading a property (a failing computed dependency)
//! propagate unchanged.

use std::rc::Rc;

use autoprop_core::{Path, Projection};

use crate::config::EngineConfig;
use crate::error::{AutoError, Result};
use crate::list::List;
use crate::observer::Subscription;
use crate::root;
use crate::value::Value;

/// Read/observe capability over a property container.
///
/// This is the seam between the resolver and the host store: [`Object`]
/// and [`List`] implement it, and any other store can too.
///
/// [`Object`]: crate::Object
pub trait PropertyAccess {
    /// Current value of `key`.
    fn get_property(&self, key: &str) -> Result<Value>;

    /// Invoke `on_change` whenever `key` changes, for as long as the returned
    /// subscription is alive.
    fn observe_property(&self, key: &str, on_change: Rc<dyn Fn()>) -> Subscription;

    /// The container itself as a value.
    fn to_value(&self) -> Value;
}

/// Subscriptions collected while resolving a set of paths.
///
/// An untracked set only resolves; it registers nothing.
#[derive(Default)]
pub struct Watches {
    on_change: Option<Rc<dyn Fn()>>,
    subscriptions: Vec<Subscription>,
}

impl Watches {
    /// Collect subscriptions that call `on_change`.
    pub fn new(on_change: Rc<dyn Fn()>) -> Self {
        Self {
            on_change: Some(on_change),
            subscriptions: Vec::new(),
        }
    }

    /// Resolve without subscribing to anything.
    #[must_use]
    pub fn untracked() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Hand over the collected subscriptions.
    #[must_use]
    pub fn into_subscriptions(self) -> Vec<Subscription> {
        self.subscriptions
    }

    fn property(&mut self, access: &dyn PropertyAccess, key: &str) {
        if let Some(on_change) = &self.on_change {
            self.subscriptions
                .push(access.observe_property(key, Rc::clone(on_change)));
        }
    }

    fn structure(&mut self, list: &List) {
        if let Some(on_change) = &self.on_change {
            let on_change = Rc::clone(on_change);
            self.subscriptions.push(list.observe(move || on_change()));
        }
    }
}

/// Resolve `path` against `owner`.
pub fn resolve(
    owner: &dyn PropertyAccess,
    path: &Path,
    config: &EngineConfig,
    watches: &mut Watches,
) -> Result<Value> {
    let base = if config.root_aliases.matches(path) {
        let Some(root) = root::current() else {
            tracing::warn!(message = "root.missing", key = %path);
            return Ok(Value::Absent);
        };
        walk(&root, path.segments(), watches)?
    } else {
        walk(owner, path.segments(), watches)?
    };

    match path.projection() {
        Projection::None => Ok(base),
        Projection::WholeCollection => {
            let Some(list) = collection(&base, path)? else {
                return Ok(Value::Absent);
            };
            watches.structure(&list);
            Ok(Value::List(list))
        }
        Projection::EachField(field) => {
            let Some(list) = collection(&base, path)? else {
                return Ok(Value::Absent);
            };
            watches.structure(&list);
            let field: Vec<&str> = field.split('.').collect();
            let mut projected = Vec::with_capacity(list.len());
            for element in list.to_vec() {
                let value = match element.as_access() {
                    Some(access) => walk(access, field.as_slice(), watches)?,
                    None => Value::Absent,
                };
                projected.push(value);
            }
            Ok(Value::from(projected))
        }
    }
}

/// Step through `segments`, observing each one on the container it is read
/// from.
fn walk<S: AsRef<str>>(
    start: &dyn PropertyAccess,
    segments: &[S],
    watches: &mut Watches,
) -> Result<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(start.to_value());
    };
    watches.property(start, first.as_ref());
    let mut value = start.get_property(first.as_ref())?;

    for segment in rest {
        let segment = segment.as_ref();
        let next = match value.as_access() {
            Some(access) => {
                watches.property(access, segment);
                access.get_property(segment)?
            }
            None => {
                tracing::trace!(message = "resolve.short_circuit", segment);
                return Ok(Value::Absent);
            }
        };
        value = next;
    }
    Ok(value)
}

fn collection(base: &Value, path: &Path) -> Result<Option<List>> {
    match base {
        Value::List(list) => Ok(Some(list.clone())),
        Value::Absent | Value::Null => Ok(None),
        other => Err(AutoError::NotACollection {
            key: path.to_string(),
            found: other.type_name(),
        }),
    }
}
