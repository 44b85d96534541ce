//! Interfaces to the collaborators the engine drives but does not own.
//!
//! The game owns every live scenario module and its registry; the engine only
//! holds a handle for the duration of one replace or create. The network
//! owns delivery; the engine hands it batches and never waits.

use crate::codec::ModuleSnapshot;
use crate::document::Document;
use crate::error::AdapterError;
use crate::gating::GameMode;

/// A live module as enumerated by the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveModule<H> {
    /// Scenario module name.
    pub name: String,
    /// Game-side handle to the module.
    pub handle: H,
}

/// Game-managed metadata of a live module that its saved document does not
/// carry, and which must survive replacing the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleAttachment {
    /// Scenes the module runs in.
    pub target_scenes: Vec<String>,
}

/// The live game state.
pub trait GameState {
    /// Opaque handle to a live module.
    type Handle: Clone;

    /// Mode of the current session.
    fn game_mode(&self) -> GameMode;

    /// Every live scenario module.
    fn live_modules(&self) -> Vec<LiveModule<Self::Handle>>;

    /// The live module called `name`, if one exists.
    fn find_module(&self, name: &str) -> Option<Self::Handle>;

    /// Saves a live module into a fresh document.
    fn save_module(&self, handle: &Self::Handle) -> Result<Document, AdapterError>;

    /// Game-managed metadata of a live module.
    fn attachment(&self, handle: &Self::Handle) -> ModuleAttachment;

    /// Unregisters and destroys a live module.
    fn remove_module(&mut self, handle: &Self::Handle) -> Result<(), AdapterError>;

    /// Builds a live module from `document` to stand in for one that was just
    /// removed, applying the removed module's `attachment`.
    fn attach_module(
        &mut self,
        name: &str,
        document: &Document,
        attachment: ModuleAttachment,
    ) -> Result<Self::Handle, AdapterError>;

    /// Creates and registers a brand-new live module from `document`.
    fn create_module(&mut self, name: &str, document: &Document)
    -> Result<Self::Handle, AdapterError>;
}

/// Outbound transport for module snapshots. Fire-and-forget.
pub trait NetworkSink {
    /// Sends one batch of changed modules as a single request.
    fn send_modules(&mut self, batch: Vec<ModuleSnapshot>);
}
