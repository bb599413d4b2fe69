//! Host objects exposing named methods to scripts

use lunabind_core::Variant;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A host method callable by name from scripts
pub trait ScriptMethod {
    fn invoke(&self, args: &[Variant]) -> Variant;
}

impl<F> ScriptMethod for F
where
    F: Fn(&[Variant]) -> Variant,
{
    fn invoke(&self, args: &[Variant]) -> Variant {
        self(args)
    }
}

/// Dispatch table mapping exposed method names to host callables.
///
/// Methods capture whatever state they need; the table itself is
/// immutable once exposed to an engine.
#[derive(Default, Clone)]
pub struct Scriptable {
    methods: BTreeMap<String, Rc<dyn ScriptMethod>>,
}

impl fmt::Debug for Scriptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scriptable")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Scriptable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding
    pub fn register_method(&mut self, name: impl Into<String>, method: impl ScriptMethod + 'static) {
        self.methods.insert(name.into(), Rc::new(method));
    }

    /// Builder form of [`Scriptable::register_method`]
    pub fn with_method(mut self, name: impl Into<String>, method: impl ScriptMethod + 'static) -> Self {
        self.register_method(name, method);
        self
    }

    /// Call the method bound to `name`.
    ///
    /// An unknown name is not an error: it yields `Invalid`.
    pub fn invoke_method(&self, name: &str, args: &[Variant]) -> Variant {
        match self.methods.get(name) {
            Some(method) => method.invoke(args),
            None => Variant::Invalid,
        }
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Exposed method names in key order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}
