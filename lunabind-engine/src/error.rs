//! Engine error types

use thiserror::Error;

/// Script failure held in the engine's error slot.
///
/// Codes follow the VM's status values so hosts ported from the C API keep
/// their numeric checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Source failed to compile
    #[error("{0}")]
    Syntax(String),

    /// Error raised while running a chunk
    #[error("{0}")]
    Runtime(String),

    /// Error raised by a protected call into a script function
    #[error("{message}")]
    ProtectedCall { function: String, message: String },

    /// Allocation failure inside the VM
    #[error("{0}")]
    Memory(String),

    /// Script file could not be read
    #[error("cannot open {path}: {message}")]
    File { path: String, message: String },
}

impl ScriptError {
    pub const RUNTIME_CODE: i32 = 2;
    pub const SYNTAX_CODE: i32 = 3;
    pub const MEMORY_CODE: i32 = 4;
    pub const FILE_CODE: i32 = 6;

    /// Non-zero status code for this error
    pub fn code(&self) -> i32 {
        match self {
            ScriptError::Runtime(_) | ScriptError::ProtectedCall { .. } => Self::RUNTIME_CODE,
            ScriptError::Syntax(_) => Self::SYNTAX_CODE,
            ScriptError::Memory(_) => Self::MEMORY_CODE,
            ScriptError::File { .. } => Self::FILE_CODE,
        }
    }

    /// Classify an error coming out of chunk loading or execution
    pub fn from_lua(err: &mlua::Error) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => ScriptError::Syntax(error_value(message)),
            mlua::Error::RuntimeError(message) => ScriptError::Runtime(error_value(message)),
            mlua::Error::MemoryError(message) => ScriptError::Memory(error_value(message)),
            other => ScriptError::Runtime(error_value(&other.to_string())),
        }
    }

    /// Wrap a failure of a protected call to `function`
    pub fn protected_call(function: impl Into<String>, err: &mlua::Error) -> Self {
        match err {
            mlua::Error::MemoryError(message) => ScriptError::Memory(error_value(message)),
            mlua::Error::RuntimeError(message) => ScriptError::ProtectedCall {
                function: function.into(),
                message: error_value(message),
            },
            other => ScriptError::ProtectedCall {
                function: function.into(),
                message: error_value(&other.to_string()),
            },
        }
    }
}

/// The VM's error value without the traceback mlua appends to it
fn error_value(message: &str) -> String {
    match message.find("\nstack traceback:") {
        Some(end) => message[..end].to_string(),
        None => message.to_string(),
    }
}

/// Error type for fallible host-side operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// VM operation failed
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
