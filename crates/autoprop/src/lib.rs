#![forbid(unsafe_code)]

//! autoprop public facade crate.
//!
//! Computed properties whose dependencies are the parameter names of their
//! compute function:
//!
//! ```
//! use autoprop::prelude::*;
//!
//! let person = TypeBuilder::new("Person")
//!     .computed("full", auto!(|first, last| format!("{first} {last}")))
//!     .build();
//! let arthur = person
//!     .create_with([("first", "Arthur"), ("last", "Gunn")])
//!     .unwrap();
//! assert_eq!(arthur.get("full").unwrap(), Value::from("Arthur Gunn"));
//!
//! arthur.set("first", "Attila the").unwrap();
//! assert_eq!(arthur.get("full").unwrap(), Value::from("Attila the Gunn"));
//! ```

pub use autoprop_runtime::auto;

pub mod prelude {
    pub use autoprop_core as core;
    pub use autoprop_runtime as runtime;

    pub use autoprop_runtime::{
        AutoError, ComputedDefinition, EngineConfig, List, Object, TypeBuilder, Value, auto, root,
    };
}
