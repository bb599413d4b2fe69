//! Registry of script values retained on behalf of the host

use mlua::{Function, Lua, RegistryKey};
use std::collections::HashMap;

/// Script function handle as seen by the host
pub type HandleId = i64;

/// Script functions pinned in the VM registry and addressed by integer id.
///
/// Ids are never reused within one registry.
#[derive(Debug)]
pub struct HandleRegistry {
    next_id: HandleId,
    keys: HashMap<HandleId, RegistryKey>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            keys: HashMap::new(),
        }
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a registry key and return its id.
    ///
    /// The key is created by the caller, so no VM allocation (and no
    /// finalizer) runs while the registry is borrowed.
    pub fn retain(&mut self, key: RegistryKey) -> HandleId {
        let id = self.next_id;
        self.next_id += 1;
        self.keys.insert(id, key);
        id
    }

    /// Function pinned under `id`, if any
    pub fn function(&self, lua: &Lua, id: HandleId) -> Option<Function> {
        let key = self.keys.get(&id)?;
        lua.registry_value::<Function>(key).ok()
    }

    /// Forget `id`, handing its key back for removal from the VM
    pub fn take(&mut self, id: HandleId) -> Option<RegistryKey> {
        self.keys.remove(&id)
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
