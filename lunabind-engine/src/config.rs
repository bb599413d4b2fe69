//! Engine configuration

use mlua::StdLib;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Deepest table nesting converted back into host values
pub const DEFAULT_MAX_TABLE_DEPTH: usize = 16;

/// Standard libraries opened in an engine-owned VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LibrarySet {
    /// Every library that cannot break memory safety
    #[default]
    Safe,
    /// Pure computation only: no io, os or package
    Minimal,
    /// Base library only
    Bare,
}

impl LibrarySet {
    pub fn std_lib(self) -> StdLib {
        match self {
            LibrarySet::Safe => StdLib::ALL_SAFE,
            LibrarySet::Minimal => {
                StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE
            }
            LibrarySet::Bare => StdLib::NONE,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Emit a trace event for every converted value
    pub trace_marshaling: bool,
    /// Emit a debug event for every gateway dispatch
    pub log_gateway_calls: bool,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Libraries opened when the engine creates its own VM
    #[serde(default)]
    pub libraries: LibrarySet,
    /// Table nesting budget when converting script values
    #[serde(default = "default_max_table_depth")]
    pub max_table_depth: usize,
    /// VM memory limit in bytes (0 = unlimited)
    #[serde(default)]
    pub memory_limit: usize,
    /// Chunk name reported for ad hoc sources
    #[serde(default = "default_chunk_name")]
    pub chunk_name: String,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

fn default_max_table_depth() -> usize {
    DEFAULT_MAX_TABLE_DEPTH
}

fn default_chunk_name() -> String {
    "=lunabind".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            libraries: LibrarySet::default(),
            max_table_depth: default_max_table_depth(),
            memory_limit: 0,
            chunk_name: default_chunk_name(),
            debug: DebugConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a development configuration with tracing enabled
    pub fn development() -> Self {
        Self {
            debug: DebugConfig {
                trace_marshaling: true,
                log_gateway_calls: true,
            },
            ..Default::default()
        }
    }

    /// Create a sandboxed configuration: no host access, bounded memory
    pub fn sandboxed() -> Self {
        Self {
            libraries: LibrarySet::Minimal,
            memory_limit: 64 * 1024 * 1024, // 64MB
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
