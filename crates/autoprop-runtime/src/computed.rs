#![forbid(unsafe_code)]

//! Lazy, memoized computed properties.
//!
//! # Design
//!
//! Every object keeps one [`CacheEntry`] per computed property it has read.
//! A read of a clean entry returns the cached value. A read of a dirty entry
//! resolves every dependency key (subscribing to each property it touches),
//! binds the resolved values to the compute function's parameters, invokes
//! it, and caches the result together with the new subscriptions.
//!
//! When any touched property changes, the entry is marked dirty, its
//! subscriptions are released, and observers of the computed key on the
//! owner are notified. Computed properties that depend on computed
//! properties are invalidated through that notification.
//!
//! # Invariants
//!
//! 1. A read returns a value consistent with the dependencies as they are at
//!    the time of the read.
//! 2. The compute function runs at most once per invalidation.
//! 3. A clean read is a single map lookup and a clone.
//! 4. `version` increments by exactly 1 per successful recomputation.
//! 5. A dirty entry holds no subscriptions; a second change before the next
//!    read does nothing.
//!
//! # Failure Modes
//!
//! - **Compute or resolution error**: propagated to the reader. The entry
//!   stays dirty, caches nothing and holds no subscriptions, so the next read
//!   retries.
//! - **Re-entrant read**: reading a property while its own computation is on
//!   the stack fails with [`AutoError::Cycle`].
//! - **Dependency changed mid-computation**: the freshly computed value is
//!   returned, but the entry stays dirty and recomputes on the next read.
//! - **Owner dropped**: subscriptions hold the owner weakly, so pending
//!   callbacks become inert.

use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::config::ZeroDependencyPolicy;
use crate::definition::{Args, ComputedDefinition};
use crate::error::{AutoError, Result};
use crate::object::Object;
use crate::observer::Subscription;
use crate::resolve::{Watches, resolve};
use crate::value::Value;

/// Observable cache state of a computed property on one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Never read.
    Uninitialized,
    /// Holds a value consistent with its dependencies.
    Valid,
    /// Must recompute on the next read.
    Invalid,
}

/// Cache slot for one computed property of one object.
pub(crate) struct CacheEntry {
    /// Last successfully computed value.
    cached: Option<Value>,
    /// Whether the next read must recompute.
    dirty: bool,
    /// Whether a computation has ever been attempted.
    initialized: bool,
    /// Whether the compute function is on the stack right now.
    computing: bool,
    /// Bumped on each successful recomputation.
    version: u64,
    /// Guards keeping dependency callbacks alive while the entry is clean.
    subscriptions: Vec<Subscription>,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            cached: None,
            dirty: true,
            initialized: false,
            computing: false,
            version: 0,
            subscriptions: Vec::new(),
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("cached", &self.cached)
            .field("dirty", &self.dirty)
            .field("version", &self.version)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl CacheEntry {
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn state(&self) -> CacheState {
        if !self.initialized {
            CacheState::Uninitialized
        } else if self.dirty {
            CacheState::Invalid
        } else {
            CacheState::Valid
        }
    }
}

/// Read the computed property `key` of `owner`.
pub(crate) fn read(owner: &Object, key: &str, definition: &ComputedDefinition) -> Result<Value> {
    let entry = owner.cache_entry(key);
    let always = definition.is_untracked()
        && owner.type_def().config().zero_dependency == ZeroDependencyPolicy::RecomputeEveryRead;

    let released = {
        let mut e = entry.borrow_mut();
        if e.computing {
            return Err(AutoError::Cycle {
                property: key.to_string(),
            });
        }
        if !e.dirty
            && !always
            && let Some(value) = &e.cached
        {
            return Ok(value.clone());
        }
        e.computing = true;
        e.dirty = false;
        mem::take(&mut e.subscriptions)
    };
    drop(released);

    let mut watches = if definition.is_untracked() {
        Watches::untracked()
    } else {
        Watches::new(on_change(owner, key))
    };
    let outcome = evaluate(owner, key, definition, &mut watches);

    let mut e = entry.borrow_mut();
    e.computing = false;
    e.initialized = true;
    match outcome {
        Ok(value) => {
            e.cached = Some(value.clone());
            e.version += 1;
            let deps = watches.len();
            e.subscriptions = watches.into_subscriptions();
            tracing::debug!(
                message = "computed.recompute",
                object = owner.id(),
                property = key,
                version = e.version,
                deps
            );
            Ok(value)
        }
        Err(err) => {
            e.cached = None;
            e.dirty = true;
            drop(e);
            drop(watches);
            tracing::debug!(
                message = "computed.error",
                object = owner.id(),
                property = key,
                error = %err
            );
            Err(err)
        }
    }
}

/// Mark the computed property `key` of `owner` dirty and notify its
/// observers. A no-op if it is already dirty.
pub(crate) fn invalidate(owner: &Object, key: &str) {
    let Some(entry) = owner.cache_entry_if_any(key) else {
        return;
    };
    let released = {
        let mut e = entry.borrow_mut();
        if e.dirty {
            return;
        }
        e.dirty = true;
        mem::take(&mut e.subscriptions)
    };
    drop(released);
    tracing::trace!(
        message = "computed.invalidate",
        object = owner.id(),
        property = key
    );
    owner.notify(key);
}

fn evaluate(
    owner: &Object,
    key: &str,
    definition: &ComputedDefinition,
    watches: &mut Watches,
) -> Result<Value> {
    let config = owner.type_def().config();
    let mut resolved = Vec::with_capacity(definition.paths().len());
    for path in definition.paths() {
        resolved.push(resolve(owner, path, config, watches)?);
    }
    let args = Args::new(definition.bind(&resolved), owner);
    definition
        .invoke(&args)
        .map_err(|source| AutoError::compute(key, source))
}

fn on_change(owner: &Object, key: &str) -> Rc<dyn Fn()> {
    let owner = owner.downgrade();
    let key: Rc<str> = Rc::from(key);
    Rc::new(move || {
        if let Some(owner) = owner.upgrade() {
            invalidate(&owner, &key);
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
