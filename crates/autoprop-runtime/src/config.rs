#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! An [`EngineConfig`] is attached to each type through
//! [`TypeBuilder::config`](crate::TypeBuilder::config) and governs how that
//! type's computed properties resolve absolute paths and how
//! dependency-free properties are cached.
//!
//! With the `config` feature the configuration can be loaded from TOML:
//!
//! ```toml
//! zero_dependency = "recompute-every-read"
//!
//! [root_aliases]
//! rule = "names"
//! names = ["App", "Env"]
//! ```

use autoprop_core::Path;

#[cfg(feature = "config")]
use serde::Deserialize;

/// Which leading path segments name the process root instead of the owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(Deserialize),
    serde(tag = "rule", rename_all = "kebab-case")
)]
pub enum RootAliasRule {
    /// A leading segment starting with an ASCII uppercase letter
    /// (`App.currentElement`), provided more follows it.
    #[default]
    Capitalized,
    /// Exactly the listed leading segments.
    Names { names: Vec<String> },
    /// Every path is relative to its owner.
    Disabled,
}

impl RootAliasRule {
    /// Whether `path` should be resolved from the process root.
    ///
    /// A lone segment (`"App"`) is always owner-relative.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Some(head) = path.head() else {
            return false;
        };
        if path.segments().len() < 2 && !path.projection().is_collection() {
            return false;
        }
        match self {
            Self::Capitalized => head.starts_with(|c: char| c.is_ascii_uppercase()),
            Self::Names { names } => names.iter().any(|name| name == head),
            Self::Disabled => false,
        }
    }
}

/// Caching policy for computed properties without any dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ZeroDependencyPolicy {
    /// Compute on first read, then keep the value until explicitly
    /// invalidated.
    #[default]
    ComputeOnce,
    /// Recompute on every read.
    RecomputeEveryRead,
}

/// Per-type engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Deserialize), serde(default))]
pub struct EngineConfig {
    pub root_aliases: RootAliasRule,
    pub zero_dependency: ZeroDependencyPolicy,
}

impl EngineConfig {
    #[must_use]
    pub fn with_root_aliases(mut self, rule: RootAliasRule) -> Self {
        self.root_aliases = rule;
        self
    }

    #[must_use]
    pub fn with_zero_dependency(mut self, policy: ZeroDependencyPolicy) -> Self {
        self.zero_dependency = policy;
        self
    }

    /// Parse a TOML document; missing fields take their defaults.
    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
