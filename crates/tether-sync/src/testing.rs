//! In-memory collaborators for tests and local simulation.
//!
//! [`MemoryGame`] is a registry of live modules keyed by handle, with call
//! counters so tests can assert which adapter operations ran. [`RecordingSink`]
//! keeps every batch handed to the network.

use std::collections::{BTreeMap, HashSet};

use crate::adapter::{GameState, LiveModule, ModuleAttachment, NetworkSink};
use crate::codec::ModuleSnapshot;
use crate::document::Document;
use crate::error::AdapterError;
use crate::gating::GameMode;

/// Handle to a module in a [`MemoryGame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleHandle(pub u64);

/// Counts of state-changing adapter calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterCalls {
    /// [`GameState::create_module`] calls.
    pub created: usize,
    /// [`GameState::attach_module`] calls.
    pub attached: usize,
    /// [`GameState::remove_module`] calls.
    pub removed: usize,
}

impl AdapterCalls {
    /// Total of all counted calls.
    pub fn total(&self) -> usize {
        self.created + self.attached + self.removed
    }
}

#[derive(Debug, Clone)]
struct MemoryModule {
    name: String,
    document: Document,
    attachment: ModuleAttachment,
}

/// A game whose live modules are plain documents.
#[derive(Debug, Clone)]
pub struct MemoryGame {
    mode: GameMode,
    modules: BTreeMap<ModuleHandle, MemoryModule>,
    next_handle: u64,
    calls: AdapterCalls,
    rejected: HashSet<String>,
}

impl MemoryGame {
    /// Creates an empty game in `mode`.
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            modules: BTreeMap::new(),
            next_handle: 1,
            calls: AdapterCalls::default(),
            rejected: HashSet::new(),
        }
    }

    /// Switches the session mode.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    /// Puts a module in place directly, replacing any module of that name.
    /// Not counted as an adapter call.
    pub fn insert(&mut self, name: &str, document: Document) -> ModuleHandle {
        self.insert_with(name, document, ModuleAttachment::default())
    }

    /// Like [`insert`](Self::insert), with explicit game-managed metadata.
    pub fn insert_with(
        &mut self,
        name: &str,
        document: Document,
        attachment: ModuleAttachment,
    ) -> ModuleHandle {
        self.modules.retain(|_, m| m.name != name);
        self.register(name, document, attachment)
    }

    /// Makes every create/attach of `name` fail.
    pub fn reject(&mut self, name: &str) {
        self.rejected.insert(name.to_string());
    }

    /// Lets `name` be created again.
    pub fn accept(&mut self, name: &str) {
        self.rejected.remove(name);
    }

    /// The saved document of the live module `name`.
    pub fn document(&self, name: &str) -> Option<&Document> {
        self.module(name).map(|m| &m.document)
    }

    /// Mutable access to the live module `name`, to simulate local play.
    pub fn document_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.modules
            .values_mut()
            .find(|m| m.name == name)
            .map(|m| &mut m.document)
    }

    /// Game-managed metadata of the live module `name`.
    pub fn attachment_of(&self, name: &str) -> Option<&ModuleAttachment> {
        self.module(name).map(|m| &m.attachment)
    }

    /// Number of live modules called `name`.
    pub fn count(&self, name: &str) -> usize {
        self.modules.values().filter(|m| m.name == name).count()
    }

    /// Number of live modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module is live.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Adapter calls made so far.
    pub fn calls(&self) -> AdapterCalls {
        self.calls
    }

    fn module(&self, name: &str) -> Option<&MemoryModule> {
        self.modules.values().find(|m| m.name == name)
    }

    fn register(
        &mut self,
        name: &str,
        document: Document,
        attachment: ModuleAttachment,
    ) -> ModuleHandle {
        let handle = ModuleHandle(self.next_handle);
        self.next_handle += 1;
        self.modules.insert(
            handle,
            MemoryModule {
                name: name.to_string(),
                document,
                attachment,
            },
        );
        handle
    }

    fn check_accepted(&self, name: &str) -> Result<(), AdapterError> {
        if self.rejected.contains(name) {
            return Err(AdapterError::new(format!("module {name} failed to load")));
        }
        Ok(())
    }
}

impl GameState for MemoryGame {
    type Handle = ModuleHandle;

    fn game_mode(&self) -> GameMode {
        self.mode
    }

    fn live_modules(&self) -> Vec<LiveModule<ModuleHandle>> {
        self.modules
            .iter()
            .map(|(handle, m)| LiveModule {
                name: m.name.clone(),
                handle: *handle,
            })
            .collect()
    }

    fn find_module(&self, name: &str) -> Option<ModuleHandle> {
        self.modules
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(handle, _)| *handle)
    }

    fn save_module(&self, handle: &ModuleHandle) -> Result<Document, AdapterError> {
        self.modules
            .get(handle)
            .map(|m| m.document.clone())
            .ok_or_else(|| AdapterError::new(format!("no live module with handle {}", handle.0)))
    }

    fn attachment(&self, handle: &ModuleHandle) -> ModuleAttachment {
        self.modules
            .get(handle)
            .map(|m| m.attachment.clone())
            .unwrap_or_default()
    }

    fn remove_module(&mut self, handle: &ModuleHandle) -> Result<(), AdapterError> {
        self.calls.removed += 1;
        self.modules
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| AdapterError::new(format!("no live module with handle {}", handle.0)))
    }

    fn attach_module(
        &mut self,
        name: &str,
        document: &Document,
        attachment: ModuleAttachment,
    ) -> Result<ModuleHandle, AdapterError> {
        self.calls.attached += 1;
        self.check_accepted(name)?;
        Ok(self.register(name, document.clone(), attachment))
    }

    fn create_module(
        &mut self,
        name: &str,
        document: &Document,
    ) -> Result<ModuleHandle, AdapterError> {
        self.calls.created += 1;
        self.check_accepted(name)?;
        Ok(self.register(name, document.clone(), ModuleAttachment::default()))
    }
}

/// A network sink that keeps every batch.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Batches in the order they were sent.
    pub batches: Vec<Vec<ModuleSnapshot>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module names of the most recent batch.
    pub fn last_names(&self) -> Vec<&str> {
        self.batches
            .last()
            .map(|b| b.iter().map(|s| s.module_name.as_str()).collect())
            .unwrap_or_default()
    }
}

impl NetworkSink for RecordingSink {
    fn send_modules(&mut self, batch: Vec<ModuleSnapshot>) {
        self.batches.push(batch);
    }
}
