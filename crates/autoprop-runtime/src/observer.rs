#![forbid(unsafe_code)]

//! Change-notification plumbing shared by [`Object`](crate::Object) and
//! [`List`](crate::List).
//!
//! Observers are stored as `Weak` callbacks; the strong reference lives in
//! the [`Subscription`] handed back to the caller. Dropping the subscription
//! therefore detaches the callback. Dead entries are pruned lazily, on the
//! next subscription or notification, so a list never holds more dead
//! entries than subscriptions dropped since it was last touched.
//!
//! # Invariants
//!
//! 1. Observers are notified in registration order.
//! 2. A callback whose subscription was dropped is never invoked again, even
//!    if the drop happens in the middle of a notification cycle.
//! 3. No `RefCell` borrow of the observer list is held while callbacks run,
//!    so callbacks may subscribe, unsubscribe, or mutate freely.

use std::fmt;
use std::rc::{Rc, Weak};

/// RAII guard for a registered change callback.
///
/// Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    _callback: Rc<dyn Fn()>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Ordered list of weakly held callbacks.
#[derive(Default)]
pub(crate) struct ObserverList {
    entries: Vec<Weak<dyn Fn()>>,
}

impl ObserverList {
    /// Register `callback`, returning the guard that keeps it alive.
    pub(crate) fn subscribe(&mut self, callback: impl Fn() + 'static) -> Subscription {
        let strong: Rc<dyn Fn()> = Rc::new(callback);
        self.prune();
        self.entries.push(Rc::downgrade(&strong));
        Subscription { _callback: strong }
    }

    /// Prune dead entries and return the live ones for dispatch.
    pub(crate) fn snapshot(&mut self) -> Vec<Weak<dyn Fn()>> {
        self.prune();
        self.entries.clone()
    }

    fn prune(&mut self) {
        self.entries.retain(|weak| weak.strong_count() > 0);
    }

    /// Whether no entry, live or dead, is stored.
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries, including dead ones not yet pruned.
    #[cfg(test)]
    pub(crate) fn stored(&self) -> usize {
        self.entries.len()
    }

    /// Number of live observers.
    pub(crate) fn live(&self) -> usize {
        self.entries
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// Invoke every callback in `snapshot` that is still subscribed.
pub(crate) fn dispatch(snapshot: Vec<Weak<dyn Fn()>>) {
    for weak in snapshot {
        if let Some(callback) = weak.upgrade() {
            callback();
        }
    }
}
