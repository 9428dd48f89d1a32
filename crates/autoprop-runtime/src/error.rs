use thiserror::Error;

/// Boxed error returned by compute functions.
pub type BoxError = Box<dyn std::error::Error + 'static>;

pub type Result<T> = std::result::Result<T, AutoError>;

#[derive(Debug, Error)]
pub enum AutoError {
    /// A `[]` or `@each` projection met a value that is not a list.
    #[error("dependency key `{key}` projects over a {found}, not a collection")]
    NotACollection { key: String, found: &'static str },

    /// The compute function of a property failed.
    #[error("computing `{property}` failed: {source}")]
    Compute {
        property: String,
        #[source]
        source: BoxError,
    },

    /// A property was read again while it was being computed.
    #[error("computed property `{property}` depends on itself")]
    Cycle { property: String },

    /// A write targeted a computed property.
    #[error("computed property `{property}` cannot be set")]
    ReadOnlyComputed { property: String },

    #[cfg(feature = "config")]
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl AutoError {
    /// Name of the property the error is about, when there is one.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::Compute { property, .. }
            | Self::Cycle { property }
            | Self::ReadOnlyComputed { property } => Some(property),
            Self::NotACollection { .. } => None,
            #[cfg(feature = "config")]
            Self::Config(_) => None,
        }
    }

    #[must_use]
    pub fn compute(property: impl Into<String>, source: BoxError) -> Self {
        Self::Compute {
            property: property.into(),
            source,
        }
    }
}
