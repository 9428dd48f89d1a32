#![forbid(unsafe_code)]

//! Argument binding plans.
//!
//! A [`BindingPlan`] maps each compute-function parameter to the index of the
//! dependency key that feeds it. The plan is computed once per definition and
//! then applied to every freshly resolved dependency vector.
//!
//! # Invariants
//!
//! 1. `apply` returns exactly one argument per parameter.
//! 2. A parameter takes the value of the first key whose
//!    [binding names](crate::path::Path::binding_names) include it.
//! 3. A parameter matching no key receives the absent value; extra keys are
//!    never injected.
//! 4. For inferred keys the plan is the identity.

use crate::path::Path;

/// Parameter-to-key index map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingPlan {
    slots: Vec<Option<usize>>,
}

impl BindingPlan {
    /// Match `params` against `keys` by name.
    #[must_use]
    pub fn by_name<P, K>(params: &[P], keys: &[K]) -> Self
    where
        P: AsRef<str>,
        K: AsRef<Path>,
    {
        let slots = params
            .iter()
            .map(|param| {
                keys.iter()
                    .position(|key| key.as_ref().binds(param.as_ref()))
            })
            .collect();
        Self { slots }
    }

    /// Positional identity plan for `len` parameters.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            slots: (0..len).map(Some).collect(),
        }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the plan binds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key index feeding parameter `param`, if any.
    #[must_use]
    pub fn source(&self, param: usize) -> Option<usize> {
        self.slots.get(param).copied().flatten()
    }

    /// Parameters that no key feeds.
    pub fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
    }

    /// Build the argument vector from resolved values aligned with the keys.
    ///
    /// Indexes past the end of `resolved` are treated as unmatched.
    #[must_use]
    pub fn apply<V: Clone>(&self, resolved: &[V], absent: &V) -> Vec<V> {
        self.slots
            .iter()
            .map(|slot| {
                slot.and_then(|j| resolved.get(j))
                    .unwrap_or(absent)
                    .clone()
            })
            .collect()
    }
}
