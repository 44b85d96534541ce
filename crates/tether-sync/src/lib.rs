//! Scenario synchronization: keeps named scenario modules consistent between
//! the local game and the server.
//!
//! Remote snapshots arrive on the [`InboundQueue`] from the network thread and
//! are merged into live game state on the engine tick. Periodically the
//! [`ScenarioSync`] engine scans live modules, encodes them with the [`Codec`],
//! and hands the ones that changed since the last exchange to the network.

pub mod adapter;
pub mod cache;
pub mod codec;
pub mod compression;
pub mod document;
pub mod engine;
pub mod error;
pub mod gating;
pub mod inbound;
pub mod progression;
pub mod schedule;
pub mod settings;
pub mod testing;

pub use adapter::{GameState, LiveModule, ModuleAttachment, NetworkSink};
pub use cache::ModuleCache;
pub use codec::{CODEC_VERSION, Codec, ModuleSnapshot};
pub use compression::{CompressionConfig, CompressionError};
pub use document::Document;
pub use engine::{EngineState, MergeOutcome, ScenarioSync, TickReport};
pub use error::{AdapterError, CodecError, MergeError};
pub use gating::{Gate, GameMode, GatePolicy, ParseGameModeError};
pub use inbound::{InboundEntry, InboundQueue, InboundSender};
pub use progression::{ProgressionState, starter_research_document};
pub use schedule::ScanTimer;
pub use settings::{DISCOVERED_OBJECTS_MODULE, RESEARCH_MODULE, SyncSettings};
