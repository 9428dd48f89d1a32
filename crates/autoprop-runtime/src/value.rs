#![forbid(unsafe_code)]

//! Dynamic values stored in object slots and passed to compute functions.
//!
//! [`Value::Absent`] is the "no value" marker: what a missing property, an
//! unresolvable path, or an unmatched compute parameter evaluates to. It is
//! distinct from an explicitly stored [`Value::Null`].
//!
//! Scalars compare structurally. [`List`] and [`Object`] are shared handles
//! and compare by identity, so storing the same handle again is not a change
//! while storing a different list with equal contents is.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::list::List;
use crate::object::Object;
use crate::resolve::PropertyAccess;

/// A property value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value at all.
    #[default]
    Absent,
    /// An explicitly stored null.
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// Shared, observable collection.
    List(List),
    /// Shared object instance.
    Object(Object),
}

impl Value {
    /// Build a list value from anything convertible to values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(List::from_values(items))
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Absent or null.
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Snapshot of the list elements, if this is a list.
    #[must_use]
    pub fn into_vec(self) -> Option<Vec<Value>> {
        match self {
            Self::List(list) => Some(list.to_vec()),
            _ => None,
        }
    }

    /// Read `key` from an object or list value; anything else yields
    /// [`Value::Absent`].
    pub fn get(&self, key: &str) -> Result<Value> {
        match self.as_access() {
            Some(access) => access.get_property(key),
            None => Ok(Self::Absent),
        }
    }

    /// View this value as a property container, if it is one.
    #[must_use]
    pub fn as_access(&self) -> Option<&dyn PropertyAccess> {
        match self {
            Self::Object(object) => Some(object),
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Human-readable kind, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent value",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Structural equality: lists compare element-wise (recursively),
    /// objects still compare by identity.
    #[must_use]
    pub fn deep_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.ptr_eq(b) || {
                    let (a, b) = (a.to_vec(), b.to_vec());
                    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.deep_eq(y))
                }
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::List(list) => fmt::Debug::fmt(list, f),
            Self::Object(object) => fmt::Debug::fmt(object, f),
        }
    }
}

/// Script-style rendering: integral numbers print without a fraction, lists
/// join their elements with `,`, absent and null print as words.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::List(list) => {
                for (i, item) in list.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(object) => write!(f, "[object {}]", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

from_number!(i32, i64, u32, u64, usize, f32);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Self::List(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(List::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Absent
    }
}
