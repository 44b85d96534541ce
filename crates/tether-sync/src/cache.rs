//! Last-exchanged payload per module, used to suppress re-sending unchanged
//! state.

use std::collections::HashMap;

/// Maps module name → the encoded payload last sent or successfully received.
///
/// Entries are only ever overwritten, never evicted, until the owning engine
/// is reset.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    entries: HashMap<String, Vec<u8>>,
}

impl ModuleCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `module_name` was never recorded or its recorded
    /// payload differs from `payload`.
    pub fn has_changed(&self, module_name: &str, payload: &[u8]) -> bool {
        match self.entries.get(module_name) {
            Some(previous) => previous.as_slice() != payload,
            // Never exchanged: always worth sending.
            None => true,
        }
    }

    /// Stores `payload` as the latest exchanged state of `module_name`.
    pub fn record(&mut self, module_name: &str, payload: Vec<u8>) {
        self.entries.insert(module_name.to_string(), payload);
    }

    /// Returns `true` if the module was ever exchanged.
    pub fn is_known(&self, module_name: &str) -> bool {
        self.entries.contains_key(module_name)
    }

    /// The recorded payload for `module_name`.
    pub fn get(&self, module_name: &str) -> Option<&[u8]> {
        self.entries.get(module_name).map(Vec::as_slice)
    }

    /// Names of all recorded modules, sorted.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of recorded modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every module.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
