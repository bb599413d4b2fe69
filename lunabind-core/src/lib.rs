//! Core value types for lunabind
//!
//! This crate holds the host-side half of the Lua bridge:
//! - `Variant`, the tagged value exchanged with scripts
//! - `VariantList` / `VariantMap` containers built from it
//! - Coercion helpers and the canonical text rendering
//! - JSON conversion used by tooling

pub mod json;
pub mod variant;

pub use variant::{Variant, VariantList, VariantMap, VariantType};
pub use variant::{ValueError, ValueResult};
