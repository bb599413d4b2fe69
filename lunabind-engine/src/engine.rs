//! Marshaling engine - the host-side entry point into a Lua VM

use lunabind_core::Variant;
use mlua::{Lua, LuaOptions, MultiValue, Value as LuaValue};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Result, ScriptError};
use crate::gateway;
use crate::handles::{HandleId, HandleRegistry};
use crate::marshal::Marshaler;
use crate::reference::Reference;
use crate::scriptable::Scriptable;

/// Create a VM according to `config`
fn create_lua(config: &EngineConfig) -> Result<Lua> {
    let lua = Lua::new_with(config.libraries.std_lib(), LuaOptions::default())?;
    if config.memory_limit > 0 {
        lua.set_memory_limit(config.memory_limit)?;
    }
    Ok(lua)
}

/// Strip what the Lua file loader strips: a UTF-8 BOM, then a `#` first line
fn script_body(source: &[u8]) -> &[u8] {
    let source = source.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(source);
    if source.first() != Some(&b'#') {
        return source;
    }
    // Keep the newline so reported line numbers still match the file
    match source.iter().position(|&b| b == b'\n') {
        Some(newline) => &source[newline..],
        None => &[],
    }
}

/// Marshaling engine.
///
/// Script failures never surface as `Err`: every entry point returns a
/// usable `Variant` (`Invalid` on failure) and records the failure in a
/// single error slot, queried with [`Engine::error`] and
/// [`Engine::error_text`].
///
/// The slot is sticky. While it holds an error every collected result is
/// `Invalid`, even for calls that succeeded. `evaluate_file` clears it
/// before running; `evaluate`, `invoke` and global access do not, so
/// callers that keep going after a failure must call
/// [`Engine::clear_error`].
pub struct Engine {
    lua: Lua,
    owned: bool,
    config: EngineConfig,
    marshaler: Marshaler,
    error: RefCell<Option<ScriptError>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("owned", &self.owned)
            .field("config", &self.config)
            .field("handles", &self.handle_count())
            .field("error", &self.error.borrow())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine owning a VM with the safe standard libraries
    pub fn new() -> Self {
        Self::from_parts(Lua::new(), true, EngineConfig::default())
    }

    /// Create an engine owning a VM built from `config`
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let lua = create_lua(&config)?;
        Ok(Self::from_parts(lua, true, config))
    }

    /// Wrap a VM created by the caller.
    ///
    /// The engine keeps a shared handle; the caller's VM stays alive for as
    /// long as the caller holds it, whatever happens to the engine.
    pub fn from_lua(lua: Lua) -> Self {
        Self::from_lua_with_config(lua, EngineConfig::default())
    }

    /// Wrap a VM created by the caller. Library and memory settings in
    /// `config` are not applied to a borrowed VM.
    pub fn from_lua_with_config(lua: Lua, config: EngineConfig) -> Self {
        Self::from_parts(lua, false, config)
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn from_parts(lua: Lua, owned: bool, config: EngineConfig) -> Self {
        let marshaler = Self::marshaler_for(&config);
        debug!(
            "Engine created (owned: {}, max table depth: {})",
            owned, config.max_table_depth
        );
        Self {
            lua,
            owned,
            config,
            marshaler,
            error: RefCell::new(None),
        }
    }

    fn marshaler_for(config: &EngineConfig) -> Marshaler {
        Marshaler::new(
            config.max_table_depth,
            config.debug.trace_marshaling,
            Rc::new(RefCell::new(HandleRegistry::new())),
        )
    }

    /// Whether the engine created the VM it drives
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying VM
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Discard the error slot and every function handle, and switch to a
    /// fresh VM owned by the engine
    pub fn reset(&mut self) -> Result<()> {
        info!("Resetting engine");
        let lua = create_lua(&self.config)?;
        self.marshaler = Self::marshaler_for(&self.config);
        self.lua = lua;
        self.owned = true;
        self.clear_error();
        Ok(())
    }

    // Error slot

    pub fn clear_error(&self) {
        self.error.borrow_mut().take();
    }

    /// Code of the recorded error, 0 when none
    pub fn error(&self) -> i32 {
        self.error.borrow().as_ref().map_or(0, ScriptError::code)
    }

    /// Message of the recorded error, empty when none
    pub fn error_text(&self) -> String {
        self.error
            .borrow()
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.error.borrow().is_some()
    }

    pub fn last_error(&self) -> Option<ScriptError> {
        self.error.borrow().clone()
    }

    fn record(&self, err: ScriptError) -> Variant {
        warn!("Script error {}: {}", err.code(), err);
        *self.error.borrow_mut() = Some(err);
        Variant::Invalid
    }

    fn collect(&self, values: MultiValue) -> Variant {
        if self.is_error() {
            return Variant::Invalid;
        }
        self.marshaler.collect_returns(&self.lua, values)
    }

    // Execution

    /// Run `source` and collect what it returns
    pub fn evaluate(&self, source: &str) -> Variant {
        info!("Evaluating source ({} bytes)", source.len());
        let result = self
            .lua
            .load(source)
            .set_name(self.config.chunk_name.as_str())
            .call::<MultiValue>(());

        match result {
            Ok(values) => self.collect(values),
            Err(err) => self.record(ScriptError::from_lua(&err)),
        }
    }

    /// Run a script file and collect what it returns.
    ///
    /// Clears the error slot first. The file is read as raw bytes; a UTF-8
    /// byte order mark and then a leading `#` line are skipped.
    pub fn evaluate_file(&self, path: impl AsRef<Path>) -> Variant {
        let path = path.as_ref();
        info!("Evaluating file: {}", path.display());
        self.clear_error();

        let source = match std::fs::read(path) {
            Ok(source) => source,
            Err(err) => {
                return self.record(ScriptError::File {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };

        let result = self
            .lua
            .load(script_body(&source))
            .set_name(format!("@{}", path.display()))
            .call::<MultiValue>(());

        match result {
            Ok(values) => self.collect(values),
            Err(err) => self.record(ScriptError::from_lua(&err)),
        }
    }

    /// Call the global function `name` with `args`.
    ///
    /// An undefined global is a silent miss: `Invalid` with no error.
    pub fn invoke(&self, name: &str, args: &[Variant]) -> Variant {
        debug!("Invoking {} ({} args)", name, args.len());

        let function = match self.lua.globals().get::<LuaValue>(name) {
            Ok(LuaValue::Nil) => {
                debug!("Global '{}' is not defined", name);
                return Variant::Invalid;
            }
            Ok(LuaValue::Function(function)) => function,
            Ok(other) => {
                return self.record(ScriptError::ProtectedCall {
                    function: name.to_string(),
                    message: format!(
                        "attempt to call a {} value (global '{}')",
                        other.type_name(),
                        name
                    ),
                })
            }
            Err(err) => return self.record(ScriptError::from_lua(&err)),
        };

        self.call_function(name, function, args)
    }

    fn call_function(&self, name: &str, function: mlua::Function, args: &[Variant]) -> Variant {
        let args = match self.marshaler.push_args(&self.lua, args) {
            Ok(args) => args,
            Err(err) => return self.record(ScriptError::from_lua(&err)),
        };

        match function.call::<MultiValue>(args) {
            Ok(values) => self.collect(values),
            Err(err) => self.record(ScriptError::protected_call(name, &err)),
        }
    }

    // Function handles

    /// Call a script function previously returned as a handle.
    ///
    /// An unknown handle is a silent miss, like an undefined global.
    pub fn call_handle(&self, id: HandleId, args: &[Variant]) -> Variant {
        let function = self.marshaler.handles().borrow().function(&self.lua, id);
        match function {
            Some(function) => self.call_function(&format!("handle {}", id), function, args),
            None => {
                debug!("Unknown function handle {}", id);
                Variant::Invalid
            }
        }
    }

    /// Release a function handle; false when the id is unknown
    pub fn release_handle(&self, id: HandleId) -> bool {
        let key = self.marshaler.handles().borrow_mut().take(id);
        match key {
            Some(key) => {
                // A key from another VM cannot be removed; dropping it is enough
                let _ = self.lua.remove_registry_value(key);
                true
            }
            None => false,
        }
    }

    /// Number of function handles currently retained
    pub fn handle_count(&self) -> usize {
        self.marshaler.handles().borrow().len()
    }

    // Registration

    /// Expose `object` as the global table `name`, one entry per method.
    ///
    /// The table holds the object weakly.
    pub fn register_object(&self, name: &str, object: &Rc<Scriptable>) -> Result<()> {
        debug!("Registering object {} ({} methods)", name, object.method_count());
        let table = gateway::scriptable_object(
            &self.lua,
            self.marshaler.clone(),
            name,
            self.config.debug.log_gateway_calls,
            object,
        )?;
        self.lua.globals().set(name, table)?;
        Ok(())
    }

    /// Expose a host function as the global `name`
    pub fn register_function<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&[Variant]) -> Variant + 'static,
    {
        debug!("Registering function {}", name);
        let function = gateway::native_function(
            &self.lua,
            self.marshaler.clone(),
            name,
            self.config.debug.log_gateway_calls,
            f,
        )?;
        self.lua.globals().set(name, function)?;
        Ok(())
    }

    /// Expose a host function that receives `data` on every call
    pub fn register_function_with_data<D, F>(&self, name: &str, data: D, f: F) -> Result<()>
    where
        D: 'static,
        F: Fn(&[Variant], &D) -> Variant + 'static,
    {
        self.register_function(name, move |args: &[Variant]| f(args, &data))
    }

    // Globals

    /// Read the global `name`; an undefined global reads as `Null`
    pub fn global_value(&self, name: &str) -> Variant {
        let value = match self.lua.globals().get::<LuaValue>(name) {
            Ok(value) => value,
            Err(err) => return self.record(ScriptError::from_lua(&err)),
        };
        if self.is_error() {
            return Variant::Invalid;
        }
        self.marshaler.pop_value(&self.lua, value)
    }

    /// Write the global `name`; `Invalid` and `Null` clear it
    pub fn set_global_value(&self, name: &str, value: &Variant) {
        let result = self
            .marshaler
            .push_value(&self.lua, value)
            .and_then(|value| self.lua.globals().set(name, value));
        if let Err(err) = result {
            self.record(ScriptError::from_lua(&err));
        }
    }

    /// Reference bound to the global `name`
    pub fn global(&self, name: impl Into<String>) -> Reference<'_> {
        Reference::new(self, name)
    }

    // Raw conversion

    /// Convert a host value into a VM value
    pub fn push_value(&self, value: &Variant) -> mlua::Result<LuaValue> {
        self.marshaler.push_value(&self.lua, value)
    }

    /// Convert a VM value into a host value
    pub fn pop_value(&self, value: LuaValue) -> Variant {
        self.marshaler.pop_value(&self.lua, value)
    }
}

/// Engine builder
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the opened standard libraries
    pub fn libraries(mut self, libraries: crate::config::LibrarySet) -> Self {
        self.config.libraries = libraries;
        self
    }

    /// Set the table nesting budget
    pub fn max_table_depth(mut self, depth: usize) -> Self {
        self.config.max_table_depth = depth;
        self
    }

    /// Set memory limit
    pub fn memory_limit(mut self, limit: usize) -> Self {
        self.config.memory_limit = limit;
        self
    }

    /// Set the chunk name for ad hoc sources
    pub fn chunk_name(mut self, name: impl Into<String>) -> Self {
        self.config.chunk_name = name.into();
        self
    }

    /// Enable marshaling and gateway tracing
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug.trace_marshaling = enabled;
        self.config.debug.log_gateway_calls = enabled;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Engine> {
        Engine::with_config(self.config)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibrarySet;

    #[test]
    fn test_script_body() {
        assert_eq!(script_body(b"return 1"), b"return 1");
        assert_eq!(script_body(b"\xEF\xBB\xBFreturn 1"), b"return 1");
        assert_eq!(script_body(b"#!/bin/lua\nreturn 1"), b"\nreturn 1");
        assert_eq!(script_body(b"\xEF\xBB\xBF# comment\nreturn 1"), b"\nreturn 1");
        assert_eq!(script_body(b"#!/bin/lua"), b"");
        // Only the first line is skipped
        assert_eq!(script_body(b"return 1\n# not a comment"), b"return 1\n# not a comment");
    }

    #[test]
    fn test_evaluate_returns() {
        let engine = Engine::new();

        assert_eq!(engine.evaluate("x = 1"), Variant::Invalid);
        assert_eq!(engine.evaluate("return 'a'"), Variant::from("a"));
        assert_eq!(
            engine.evaluate("return 1, 'b', nil"),
            Variant::List(vec![Variant::Real(1.0), Variant::from("b"), Variant::Null])
        );
        assert!(!engine.is_error());
    }

    #[test]
    fn test_error_slot() {
        let engine = Engine::new();

        assert_eq!(engine.evaluate("error('boom')"), Variant::Invalid);
        assert_eq!(engine.error(), ScriptError::RUNTIME_CODE);
        assert!(engine.error_text().contains("boom"));
        assert!(matches!(engine.last_error(), Some(ScriptError::Runtime(_))));

        engine.clear_error();
        assert_eq!(engine.error(), 0);
        assert!(engine.error_text().is_empty());
        assert_eq!(engine.last_error(), None);
    }

    #[test]
    fn test_invoke_non_function_records_error() {
        let engine = Engine::new();
        engine.evaluate("value = 5");

        assert_eq!(engine.invoke("value", &[]), Variant::Invalid);
        assert_eq!(engine.error(), ScriptError::RUNTIME_CODE);
        assert!(engine.error_text().contains("number"));
    }

    #[test]
    fn test_register_function_with_data() {
        let engine = Engine::new();
        engine
            .register_function_with_data("scale", 3.0, |args, factor| {
                Variant::Real(args.first().map_or(0.0, |a| a.to_real(0.0)) * factor)
            })
            .unwrap();

        assert_eq!(engine.evaluate("return scale(7)"), Variant::Real(21.0));
    }

    #[test]
    fn test_builder() {
        let engine = Engine::builder()
            .libraries(LibrarySet::Bare)
            .max_table_depth(4)
            .chunk_name("=test")
            .build()
            .unwrap();

        assert!(engine.is_owned());
        assert_eq!(engine.config().max_table_depth, 4);
        // No string library in a bare VM
        assert_eq!(engine.evaluate("return string"), Variant::Null);
    }

    #[test]
    fn test_sandboxed_has_no_io() {
        let engine = Engine::with_config(EngineConfig::sandboxed()).unwrap();
        assert_eq!(engine.evaluate("return io"), Variant::Null);
        assert_eq!(engine.evaluate("return math.floor(2.5)"), Variant::Real(2.0));
    }

    #[test]
    fn test_debug_output() {
        let engine = Engine::new();
        let text = format!("{:?}", engine);
        assert!(text.contains("owned: true"));
        assert!(text.contains("handles: 0"));
    }
}
