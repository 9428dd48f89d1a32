#![forbid(unsafe_code)]

//! Object instances and their type descriptors.
//!
//! A [`TypeDef`] is the flattened property table of a type: default slot
//! values plus computed-property definitions, built once through
//! [`TypeBuilder`]. An [`Object`] is an instance: its own data slots, its
//! per-key observers, and one cache entry per computed property it has read.
//!
//! # Usage
//!
//! ```ignore
//! use autoprop_runtime::{auto, TypeBuilder, Value};
//!
//! let person = TypeBuilder::new("Person")
//!     .computed("full", auto!(|first, last| format!("{first} {last}")))
//!     .build();
//! let arthur = person.create_with([("first", "Arthur"), ("last", "Gunn")])?;
//! assert_eq!(arthur.get("full")?, Value::from("Arthur Gunn"));
//! arthur.set("first", "Attila the")?;
//! assert_eq!(arthur.get("full")?, Value::from("Attila the Gunn"));
//! ```
//!
//! # Invariants
//!
//! 1. Setting a slot to an equal value (see [`Value`]'s `PartialEq`) notifies
//!    nobody.
//! 2. Observers of a key run after the slot has been updated.
//! 3. Computed keys cannot be set; they change only through their
//!    dependencies or [`Object::invalidate`].
//! 4. Closures registered by the engine hold a [`WeakObject`], never a strong
//!    handle, so dependency graphs do not keep objects alive.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use autoprop_core::path;

use crate::computed::{self, CacheEntry, CacheState};
use crate::config::EngineConfig;
use crate::definition::ComputedDefinition;
use crate::error::{AutoError, Result};
use crate::observer::{self, ObserverList, Subscription};
use crate::resolve::{self, PropertyAccess, Watches};
use crate::value::Value;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// TypeDef
// ---------------------------------------------------------------------------

/// Flattened property table of a type.
pub struct TypeDef {
    name: String,
    defaults: AHashMap<String, Value>,
    computed: AHashMap<String, ComputedDefinition>,
    config: EngineConfig,
}

impl TypeDef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The computed definition installed under `key`.
    #[must_use]
    pub fn computed(&self, key: &str) -> Option<&ComputedDefinition> {
        self.computed.get(key)
    }

    #[must_use]
    pub fn is_computed(&self, key: &str) -> bool {
        self.computed.contains_key(key)
    }

    /// Default value of a data slot.
    #[must_use]
    pub fn default_value(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Names of every computed property, in no particular order.
    pub fn computed_keys(&self) -> impl Iterator<Item = &str> {
        self.computed.keys().map(String::as_str)
    }

    /// Create an instance with only the type defaults.
    #[must_use]
    pub fn create(self: &Rc<Self>) -> Object {
        Object::with_type(Rc::clone(self))
    }

    /// Create an instance and set the given slots.
    ///
    /// Fails with [`AutoError::ReadOnlyComputed`] if a key names a computed
    /// property.
    pub fn create_with<I, K, V>(self: &Rc<Self>, pairs: I) -> Result<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let object = self.create();
        for (key, value) in pairs {
            let key = key.into();
            if self.is_computed(&key) {
                return Err(AutoError::ReadOnlyComputed { property: key });
            }
            object.inner.slots.borrow_mut().insert(key, value.into());
        }
        Ok(object)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut computed: Vec<&str> = self.computed_keys().collect();
        computed.sort_unstable();
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("defaults", &self.defaults.len())
            .field("computed", &computed)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`TypeDef`].
///
/// A later `value` or `computed` call for the same key replaces the earlier
/// one, whichever kind it was.
#[derive(Debug)]
#[must_use]
pub struct TypeBuilder {
    def: TypeDef,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: TypeDef {
                name: name.into(),
                defaults: AHashMap::new(),
                computed: AHashMap::new(),
                config: EngineConfig::default(),
            },
        }
    }

    /// Default value of a data slot, shared by every instance until set.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        self.def.computed.remove(&key);
        self.def.defaults.insert(key, value.into());
        self
    }

    /// Install a computed property.
    pub fn computed(mut self, key: impl Into<String>, definition: ComputedDefinition) -> Self {
        let key = key.into();
        self.def.defaults.remove(&key);
        self.def.computed.insert(key, definition);
        self
    }

    /// Copy every property of `parent` into this type (and its config).
    ///
    /// Properties added afterwards override the inherited ones.
    pub fn extend(mut self, parent: &TypeDef) -> Self {
        for (key, value) in &parent.defaults {
            self.def.computed.remove(key);
            self.def.defaults.insert(key.clone(), value.clone());
        }
        for (key, definition) in &parent.computed {
            self.def.defaults.remove(key);
            self.def.computed.insert(key.clone(), definition.clone());
        }
        self.def.config = parent.config.clone();
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.def.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<TypeDef> {
        Rc::new(self.def)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

struct ObjectInner {
    id: u64,
    ty: Rc<TypeDef>,
    slots: RefCell<AHashMap<String, Value>>,
    observers: RefCell<AHashMap<String, ObserverList>>,
    cache: RefCell<AHashMap<String, Rc<RefCell<CacheEntry>>>>,
}

/// Shared handle to an object instance.
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    /// A plain object with no computed properties.
    #[must_use]
    pub fn new() -> Self {
        Self::with_type(TypeBuilder::new("Object").build())
    }

    /// A plain object holding `pairs`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let object = Self::new();
        object.inner.slots.borrow_mut().extend(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        object
    }

    fn with_type(ty: Rc<TypeDef>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                ty,
                slots: RefCell::new(AHashMap::new()),
                observers: RefCell::new(AHashMap::new()),
                cache: RefCell::new(AHashMap::new()),
            }),
        }
    }

    /// Unique instance id, recorded as `object` on `computed.*` events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn type_def(&self) -> &Rc<TypeDef> {
        &self.inner.ty
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.inner.ty.name
    }

    /// Read `key`.
    ///
    /// Computed keys go through the cache; data keys read the instance slot,
    /// then the type default, then [`Value::Absent`].
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(definition) = self.inner.ty.computed(key) {
            return computed::read(self, key, definition);
        }
        if let Some(value) = self.inner.slots.borrow().get(key) {
            return Ok(value.clone());
        }
        Ok(self
            .inner
            .ty
            .default_value(key)
            .cloned()
            .unwrap_or_default())
    }

    /// Resolve a dotted path (`"elements.Li.name"`, `"rows.@each.n"`) from
    /// this object without registering any dependency.
    pub fn get_path(&self, key: &str) -> Result<Value> {
        resolve::resolve(
            self,
            &path::intern(key),
            &self.inner.ty.config,
            &mut Watches::untracked(),
        )
    }

    /// Write a data slot and notify its observers if the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        if self.inner.ty.is_computed(key) {
            return Err(AutoError::ReadOnlyComputed {
                property: key.to_string(),
            });
        }
        let value = value.into();
        let current = self.get(key)?;
        if current == value {
            return Ok(());
        }
        self.inner.slots.borrow_mut().insert(key.to_string(), value);
        self.notify(key);
        Ok(())
    }

    /// Observe changes of `key` (data or computed).
    pub fn observe(&self, key: &str, on_change: impl Fn() + 'static) -> Subscription {
        self.inner
            .observers
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .subscribe(on_change)
    }

    /// Number of live observers of `key`.
    #[must_use]
    pub fn observer_count(&self, key: &str) -> usize {
        self.inner
            .observers
            .borrow()
            .get(key)
            .map_or(0, ObserverList::live)
    }

    /// Force the computed property `key` to recompute on its next read, and
    /// notify its observers. For a data key only the observers run.
    pub fn invalidate(&self, key: &str) {
        if self.inner.ty.is_computed(key) {
            computed::invalidate(self, key);
        } else {
            self.notify(key);
        }
    }

    /// How many times `key` has been recomputed; `None` for data keys.
    #[must_use]
    pub fn computed_version(&self, key: &str) -> Option<u64> {
        if !self.inner.ty.is_computed(key) {
            return None;
        }
        Some(self.cache_entry_if_any(key).map_or(0, |e| e.borrow().version()))
    }

    /// Cache state of the computed property `key`; `None` for data keys.
    #[must_use]
    pub fn cache_state(&self, key: &str) -> Option<CacheState> {
        if !self.inner.ty.is_computed(key) {
            return None;
        }
        Some(
            self.cache_entry_if_any(key)
                .map_or(CacheState::Uninitialized, |e| e.borrow().state()),
        )
    }

    /// Whether both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn cache_entry(&self, key: &str) -> Rc<RefCell<CacheEntry>> {
        Rc::clone(
            self.inner
                .cache
                .borrow_mut()
                .entry(key.to_string())
                .or_default(),
        )
    }

    pub(crate) fn cache_entry_if_any(&self, key: &str) -> Option<Rc<RefCell<CacheEntry>>> {
        self.inner.cache.borrow().get(key).cloned()
    }

    /// Run the observers of `key`.
    pub(crate) fn notify(&self, key: &str) {
        let snapshot = {
            let mut observers = self.inner.observers.borrow_mut();
            let Some(list) = observers.get_mut(key) else {
                return;
            };
            let snapshot = list.snapshot();
            if list.is_empty() {
                observers.remove(key);
            }
            snapshot
        };
        observer::dispatch(snapshot);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Object");
        s.field("type", &self.inner.ty.name).field("id", &self.inner.id);
        if let Ok(slots) = self.inner.slots.try_borrow() {
            let mut keys: Vec<&str> = slots.keys().map(String::as_str).collect();
            keys.sort_unstable();
            s.field("slots", &keys);
        }
        s.finish_non_exhaustive()
    }
}

impl PropertyAccess for Object {
    fn get_property(&self, key: &str) -> Result<Value> {
        self.get(key)
    }

    fn observe_property(&self, key: &str, on_change: Rc<dyn Fn()>) -> Subscription {
        self.observe(key, move || on_change())
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

/// Non-owning handle to an [`Object`].
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    #[must_use]
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto;
    use std::cell::Cell;

    fn counter(object: &Object, key: &str) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = object.observe(key, move || h.set(h.get() + 1));
        (hits, sub)
    }

    #[test]
    fn get_falls_back_to_defaults_then_absent() {
        let ty = TypeBuilder::new("Thing").value("color", "red").build();
        let thing = ty.create();
        assert_eq!(thing.get("color").unwrap(), Value::from("red"));
        assert!(thing.get("size").unwrap().is_absent());

        thing.set("color", "blue").unwrap();
        assert_eq!(thing.get("color").unwrap(), Value::from("blue"));
        assert_eq!(ty.create().get("color").unwrap(), Value::from("red"));
    }

    #[test]
    fn set_notifies_only_on_change() {
        let obj = Object::from_pairs([("a", 1)]);
        let (hits, _sub) = counter(&obj, "a");

        obj.set("a", 1).unwrap();
        assert_eq!(hits.get(), 0);
        obj.set("a", 2).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn setting_a_default_to_itself_is_silent() {
        let ty = TypeBuilder::new("Thing").value("n", 5).build();
        let thing = ty.create();
        let (hits, _sub) = counter(&thing, "n");
        thing.set("n", 5).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn computed_keys_are_read_only() {
        let ty = TypeBuilder::new("T").computed("c", auto!(|| 1)).build();
        let t = ty.create();
        let err = t.set("c", 2).unwrap_err();
        assert!(matches!(err, AutoError::ReadOnlyComputed { ref property } if property == "c"));
        assert!(ty.create_with([("c", 2)]).is_err());
    }

    #[test]
    fn later_declarations_override_earlier_ones() {
        let ty = TypeBuilder::new("T")
            .computed("x", auto!(|| 1))
            .value("x", 2)
            .value("y", 3)
            .computed("y", auto!(|| 4))
            .build();
        assert!(!ty.is_computed("x"));
        assert!(ty.is_computed("y"));
        let t = ty.create();
        assert_eq!(t.get("x").unwrap(), Value::from(2));
        assert_eq!(t.get("y").unwrap(), Value::from(4));
    }

    #[test]
    fn extend_flattens_parent_table() {
        let base = TypeBuilder::new("Base")
            .value("a", 1)
            .computed("double", auto!(|a| a.as_f64().unwrap_or(0.0) * 2.0))
            .config(EngineConfig::default().with_root_aliases(crate::RootAliasRule::Disabled))
            .build();
        let child = TypeBuilder::new("Child").extend(&base).value("a", 10).build();

        assert_eq!(child.config(), base.config());
        let c = child.create();
        assert_eq!(c.get("double").unwrap(), Value::from(20));
        assert_eq!(base.create().get("double").unwrap(), Value::from(2));
    }

    #[test]
    fn observer_count_and_drop() {
        let obj = Object::new();
        let (_hits, sub) = counter(&obj, "k");
        assert_eq!(obj.observer_count("k"), 1);
        drop(sub);
        assert_eq!(obj.observer_count("k"), 0);
    }

    #[test]
    fn observers_see_new_value() {
        let obj = Object::from_pairs([("a", 1)]);
        let seen = Rc::new(Cell::new(0.0));
        let s = Rc::clone(&seen);
        let weak = obj.downgrade();
        let _sub = obj.observe("a", move || {
            let value = weak.upgrade().unwrap().get("a").unwrap();
            s.set(value.as_f64().unwrap());
        });
        obj.set("a", 7).unwrap();
        assert_eq!(seen.get(), 7.0);
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let inner = Object::from_pairs([("name", "Lithium")]);
        let obj = Object::from_pairs([("li", inner)]);
        assert_eq!(obj.get_path("li.name").unwrap(), Value::from("Lithium"));
        assert!(obj.get_path("li.missing.deeper").unwrap().is_absent());
    }

    #[test]
    fn versions_and_states_only_for_computed_keys() {
        let ty = TypeBuilder::new("T")
            .value("a", 1)
            .computed("c", auto!(|a| a))
            .build();
        let t = ty.create();
        assert_eq!(t.computed_version("a"), None);
        assert_eq!(t.cache_state("a"), None);
        assert_eq!(t.computed_version("c"), Some(0));
        assert_eq!(t.cache_state("c"), Some(CacheState::Uninitialized));
    }

    #[test]
    fn weak_handle_does_not_keep_object_alive() {
        let obj = Object::new();
        let weak = obj.downgrade();
        assert!(weak.upgrade().is_some());
        drop(obj);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn recomputes_do_not_accumulate_dead_observers() {
        let ty = TypeBuilder::new("Person")
            .computed("full", auto!(|first, last| format!("{first} {last}")))
            .build();
        let person = ty.create_with([("first", "A"), ("last", "Gunn")]).unwrap();

        for i in 0..1000 {
            person.get("full").unwrap();
            person.set("first", format!("A{i}")).unwrap();
        }
        person.get("full").unwrap();

        let observers = person.inner.observers.borrow();
        for key in ["first", "last"] {
            let list = observers.get(key).unwrap();
            assert_eq!(list.live(), 1, "{key}");
            assert!(list.stored() <= 2, "{key} stores {} entries", list.stored());
        }
    }

    #[test]
    fn unchanged_elements_do_not_accumulate_dead_observers() {
        let rows = crate::List::from_values((0..3).map(|n| Object::from_pairs([("amount", n)])));
        let ty = TypeBuilder::new("Ledger")
            .computed("amounts", auto!("rows.@each.amount" => |amount| amount))
            .build();
        let ledger = ty.create_with([("rows", rows.clone())]).unwrap();
        let first = rows.get(0).as_object().cloned().unwrap();

        for i in 0..500 {
            ledger.get("amounts").unwrap();
            first.set("amount", 100 + i).unwrap();
        }
        ledger.get("amounts").unwrap();

        for row in rows.to_vec() {
            let row = row.as_object().cloned().unwrap();
            let observers = row.inner.observers.borrow();
            let list = observers.get("amount").unwrap();
            assert_eq!(list.live(), 1);
            assert!(list.stored() <= 2, "stores {} entries", list.stored());
        }
    }

    #[test]
    fn notifying_a_key_without_live_observers_drops_its_list() {
        let obj = Object::from_pairs([("a", 1)]);
        let (_hits, sub) = counter(&obj, "a");
        drop(sub);
        obj.set("a", 2).unwrap();
        assert!(!obj.inner.observers.borrow().contains_key("a"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Object::new().id(), Object::new().id());
    }
}
