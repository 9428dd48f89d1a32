#![forbid(unsafe_code)]

//! Shared, observable collections.
//!
//! A [`List`] is a reference-counted handle; clones share the same elements.
//! Every structural mutation (add, remove, replace) notifies the list's
//! structural observers once, after the mutation has been applied. Element
//! field changes are not structural: observe the elements themselves for
//! those.
//!
//! As a property container a list answers `length` and numeric indexes, and
//! any observation registered through it is structural.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::observer::{self, ObserverList, Subscription};
use crate::resolve::PropertyAccess;
use crate::value::Value;

struct ListInner {
    items: RefCell<Vec<Value>>,
    observers: RefCell<ObserverList>,
}

/// Shared observable collection of [`Value`]s.
#[derive(Clone)]
pub struct List {
    inner: Rc<ListInner>,
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Create a list from anything convertible to values.
    pub fn from_values<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::from(items.into_iter().map(Into::into).collect::<Vec<_>>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Element at `index`, or [`Value::Absent`] when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.inner
            .items
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Access the elements by reference.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this list (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.inner.items.borrow_mut().push(value.into());
        self.notify();
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        {
            let mut items = self.inner.items.borrow_mut();
            let at = index.min(items.len());
            items.insert(at, value.into());
        }
        self.notify();
    }

    /// Remove and return the element at `index`; `None` when out of range.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Replace the element at `index`.
    ///
    /// Returns `false` (and notifies nobody) when `index` is out of range or
    /// the element is unchanged.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        let value = value.into();
        let changed = {
            let mut items = self.inner.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) if *slot != value => {
                    *slot = value;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Remove every element.
    pub fn clear(&self) {
        let had_items = {
            let mut items = self.inner.items.borrow_mut();
            let had = !items.is_empty();
            items.clear();
            had
        };
        if had_items {
            self.notify();
        }
    }

    /// Swap in a whole new element vector (one notification).
    pub fn replace_all<I, V>(&self, items: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        *self.inner.items.borrow_mut() = items.into_iter().map(Into::into).collect();
        self.notify();
    }

    /// Observe structural changes.
    pub fn observe(&self, on_change: impl Fn() + 'static) -> Subscription {
        self.inner.observers.borrow_mut().subscribe(on_change)
    }

    /// Number of live structural observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().live()
    }

    /// Whether both handles point at the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        let snapshot = self.inner.observers.borrow_mut().snapshot();
        observer::dispatch(snapshot);
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                observers: RefCell::new(ObserverList::default()),
            }),
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.items.try_borrow() {
            Ok(items) => f.debug_tuple("List").field(&*items).finish(),
            Err(_) => f.write_str("List(<borrowed>)"),
        }
    }
}

impl PropertyAccess for List {
    fn get_property(&self, key: &str) -> Result<Value> {
        if key == "length" {
            return Ok(Value::from(self.len()));
        }
        Ok(key
            .parse::<usize>()
            .map(|index| self.get(index))
            .unwrap_or_default())
    }

    fn observe_property(&self, _key: &str, on_change: Rc<dyn Fn()>) -> Subscription {
        self.observe(move || on_change())
    }

    fn to_value(&self) -> Value {
        Value::List(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(list: &List) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = list.observe(move || h.set(h.get() + 1));
        (hits, sub)
    }

    #[test]
    fn structural_mutations_notify_once_each() {
        let list = List::from_values([1, 2]);
        let (hits, _sub) = counter(&list);

        list.push(3);
        list.insert(0, 0);
        assert_eq!(list.remove(1), Some(Value::from(1)));
        assert!(list.set(0, 9));
        list.replace_all([5, 6]);
        list.clear();

        assert_eq!(hits.get(), 6);
        assert!(list.is_empty());
    }

    #[test]
    fn no_op_mutations_are_silent() {
        let list = List::from_values([1]);
        let (hits, _sub) = counter(&list);

        assert_eq!(list.remove(5), None);
        assert!(!list.set(0, 1));
        assert!(!list.set(7, 1));
        List::new().clear();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn insert_clamps_to_len() {
        let list = List::from_values([1]);
        list.insert(10, 2);
        assert_eq!(list.to_vec(), [Value::from(1), Value::from(2)]);
    }

    #[test]
    fn clones_share_elements() {
        let a = List::new();
        let b = a.clone();
        a.push("x");
        assert_eq!(b.len(), 1);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn property_access_answers_length_and_indexes() {
        let list = List::from_values(["a", "b"]);
        assert_eq!(list.get_property("length").unwrap(), Value::from(2));
        assert_eq!(list.get_property("1").unwrap(), Value::from("b"));
        assert!(list.get_property("9").unwrap().is_absent());
        assert!(list.get_property("name").unwrap().is_absent());
    }

    #[test]
    fn observer_count_tracks_subscriptions() {
        let list = List::new();
        let (_hits, sub) = counter(&list);
        assert_eq!(list.observer_count(), 1);
        drop(sub);
        assert_eq!(list.observer_count(), 0);
    }
}
