//! Lunabind engine
//!
//! Embeds a Lua 5.4 VM behind a host-side API built on `Variant`:
//! - `Engine` runs sources, files and script functions and reads or writes globals
//! - `Scriptable` objects and plain closures are exposed to scripts as callables
//! - Script functions crossing into the host become integer handles
//! - `Reference` binds a global name for repeated access
//!
//! Script failures are recorded on the engine instead of being returned;
//! see [`Engine`] for the error slot contract.

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod handles;
pub mod marshal;
pub mod reference;
pub mod scriptable;

pub use config::{DebugConfig, EngineConfig, LibrarySet};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, ScriptError};
pub use handles::{HandleId, HandleRegistry};
pub use marshal::Marshaler;
pub use reference::{IntoArgs, Reference};
pub use scriptable::{ScriptMethod, Scriptable};

/// Re-export value types
pub use lunabind_core::{Variant, VariantList, VariantMap, VariantType};

/// Re-export the VM crate for callers that build their own `Lua`
pub use mlua;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        Engine, EngineBuilder, EngineConfig,
        ScriptError, EngineError, Result,
        Reference, IntoArgs,
        Scriptable, ScriptMethod,
    };
    pub use crate::{Variant, VariantList, VariantMap};
}
