#![forbid(unsafe_code)]

//! Dependency key extraction.
//!
//! A computed property is declared with zero or more explicit key strings
//! and a compute function with named parameters. [`extract`] decides, once
//! and for all, which keys the property depends on:
//!
//! - explicit keys win, verbatim and in the given order;
//! - otherwise the parameter names, in declaration order;
//! - with neither, the property has no dependencies ([`DependentKeys::None`]).

/// The ordered dependency keys of a computed definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DependentKeys {
    /// No keys and no parameters: nothing is tracked.
    #[default]
    None,
    /// Keys supplied by the caller.
    Explicit(Vec<String>),
    /// Keys taken from the compute function's parameter names.
    Inferred(Vec<String>),
}

impl DependentKeys {
    /// The keys, or `None` for the no-dependency marker.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            Self::None => None,
            Self::Explicit(keys) | Self::Inferred(keys) => Some(keys),
        }
    }

    /// Iterate over the keys (empty for the marker).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_slice().unwrap_or_default().iter().map(String::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().map_or(0, <[String]>::len)
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the keys were supplied explicitly.
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    /// Whether this is the no-dependency marker.
    #[must_use]
    pub const fn is_untracked(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Decide the dependency keys for a declaration.
#[must_use]
pub fn extract<K, P>(explicit: &[K], params: &[P]) -> DependentKeys
where
    K: AsRef<str>,
    P: AsRef<str>,
{
    if !explicit.is_empty() {
        return DependentKeys::Explicit(to_owned(explicit));
    }
    if !params.is_empty() {
        return DependentKeys::Inferred(to_owned(params));
    }
    DependentKeys::None
}

fn to_owned<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_string()).collect()
}
