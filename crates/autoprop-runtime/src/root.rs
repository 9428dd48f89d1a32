#![forbid(unsafe_code)]

//! The process root object.
//!
//! Absolute dependency paths (`App.currentElement`, see
//! [`RootAliasRule`](crate::RootAliasRule)) are resolved from a single root
//! object instead of the declaring instance. Object handles are `Rc`-based,
//! so the root is held per thread.
//!
//! # Lifecycle
//!
//! The root must be installed with [`install`] before the first read of any
//! property depending on an absolute path. Until then such paths resolve to
//! [`Value::Absent`](crate::Value::Absent) and a `root.missing` warning is
//! logged. Replacing the root does not invalidate cached values that were
//! computed against the previous one; invalidate them explicitly if needed.
//! No teardown is required.

use std::cell::RefCell;

use crate::object::Object;

thread_local! {
    static ROOT: RefCell<Option<Object>> = const { RefCell::new(None) };
}

/// Install `root`, returning the previously installed root.
pub fn install(root: Object) -> Option<Object> {
    ROOT.with(|slot| slot.borrow_mut().replace(root))
}

/// The installed root, if any.
#[must_use]
pub fn current() -> Option<Object> {
    ROOT.with(|slot| slot.borrow().clone())
}

/// Remove the installed root, returning it.
pub fn clear() -> Option<Object> {
    ROOT.with(|slot| slot.borrow_mut().take())
}

#[must_use]
pub fn is_installed() -> bool {
    ROOT.with(|slot| slot.borrow().is_some())
}
