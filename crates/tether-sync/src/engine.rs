//! The scenario synchronization engine.
//!
//! [`ScenarioSync`] runs on the game's update tick. Each tick it:
//!
//! 1. drains the [`InboundQueue`] and merges every entry into the live game,
//!    in arrival order, before sending anything (absorbing remote truth beats
//!    re-broadcasting local truth);
//! 2. fabricates a starter progression module if the session needs one and
//!    none was ever observed;
//! 3. when the [`ScanTimer`] allows, scans live modules and sends those whose
//!    encoded payload differs from the last one exchanged.
//!
//! A module whose merge fails is blocked from sending until a later receive
//! for it succeeds. Gating is re-evaluated on every merge and scan.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::adapter::{GameState, NetworkSink};
use crate::cache::ModuleCache;
use crate::codec::{Codec, ModuleSnapshot};
use crate::document::Document;
use crate::error::MergeError;
use crate::gating::{Gate, GatePolicy};
use crate::inbound::{InboundEntry, InboundQueue, InboundSender};
use crate::progression::{ProgressionState, starter_research_document};
use crate::schedule::ScanTimer;
use crate::settings::SyncSettings;

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Not in a session; ticks do nothing.
    #[default]
    Disabled,
    /// In a session; ticks merge, fabricate, and scan.
    Enabled,
}

/// Result of merging one inbound entry.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The live module was replaced or created.
    Applied,
    /// Policy forbids merging this module; nothing was touched.
    Skipped(Gate),
    /// Decoding or the game failed; the module is now blocked.
    Failed(MergeError),
}

impl MergeOutcome {
    /// Returns `true` for [`MergeOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// What one [`ScenarioSync::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Inbound entries merged into the game.
    pub merged: usize,
    /// Inbound entries dropped by policy.
    pub skipped: usize,
    /// Inbound entries that failed to decode or load.
    pub failed: usize,
    /// Whether a starter progression module was fabricated.
    pub fabricated: bool,
    /// Modules handed to the network, in batch order.
    pub sent: Vec<String>,
}

/// Keeps scenario modules synchronized for one session.
///
/// Owned by the session; the network layer only gets an [`InboundSender`].
#[derive(Debug)]
pub struct ScenarioSync {
    settings: SyncSettings,
    codec: Codec,
    policy: GatePolicy,
    inbound: InboundQueue,
    cache: ModuleCache,
    blocked: HashSet<String>,
    progression: ProgressionState,
    timer: ScanTimer,
    state: EngineState,
}

impl ScenarioSync {
    /// Creates a disabled engine.
    pub fn new(settings: SyncSettings) -> Self {
        let codec = Codec::new(settings.compression.clone(), settings.max_document_depth);
        let policy = GatePolicy::from_settings(&settings);
        let timer = ScanTimer::new(settings.scan_interval);
        let mut engine = Self {
            settings,
            codec,
            policy,
            inbound: InboundQueue::new(),
            cache: ModuleCache::new(),
            blocked: HashSet::new(),
            progression: ProgressionState::Unobserved,
            timer,
            state: EngineState::Disabled,
        };
        engine.arm_permanent_blocks();
        engine
    }

    /// Replaces the default gating policy.
    pub fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self.blocked.clear();
        self.arm_permanent_blocks();
        self
    }

    /// Handle for the network layer to queue received modules.
    pub fn sender(&self) -> InboundSender {
        self.inbound.sender()
    }

    /// Starts synchronizing. The first scan runs on the next tick.
    pub fn enable(&mut self) {
        if self.state == EngineState::Enabled {
            return;
        }
        self.timer.reset();
        self.state = EngineState::Enabled;
        info!("Scenario sync enabled");
    }

    /// Stops synchronizing and forgets all session state, so a later
    /// [`enable`](Self::enable) starts clean.
    pub fn disable(&mut self) {
        if self.state == EngineState::Disabled {
            return;
        }
        self.state = EngineState::Disabled;
        self.reset();
        info!("Scenario sync disabled");
    }

    /// Clears the cache, blocked set, progression state, and pending inbound
    /// entries, and re-arms permanent blocks.
    pub fn reset(&mut self) {
        let dropped = self.inbound.clear();
        if dropped > 0 {
            debug!(dropped, "Discarded queued scenario modules on reset");
        }
        self.cache.clear();
        self.blocked.clear();
        self.arm_permanent_blocks();
        self.progression = ProgressionState::Unobserved;
        self.timer.reset();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns `true` if `module_name` is excluded from outbound scans.
    pub fn is_blocked(&self, module_name: &str) -> bool {
        self.blocked.contains(module_name)
    }

    /// Names currently in the blocked set, sorted.
    pub fn blocked_modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blocked.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Last exchanged payload per module.
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// What is known about progression data this session.
    pub fn progression(&self) -> ProgressionState {
        self.progression
    }

    /// The engine's codec, for peers that need to produce payloads.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Settings the engine was built with.
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Runs one tick: merge, fabricate, and scan if due.
    pub fn tick<G, N>(&mut self, game: &mut G, network: &mut N, now: Instant) -> TickReport
    where
        G: GameState,
        N: NetworkSink,
    {
        let mut report = TickReport::default();
        if self.state != EngineState::Enabled {
            return report;
        }

        for entry in self.inbound.drain_all() {
            match self.merge_entry(game, &entry) {
                MergeOutcome::Applied => report.merged += 1,
                MergeOutcome::Skipped(_) => report.skipped += 1,
                MergeOutcome::Failed(_) => report.failed += 1,
            }
        }

        report.fabricated = self.fabricate_missing_progression(game);

        if self.timer.is_due(now) {
            self.timer.mark(now);
            let batch = self.scan(game);
            if !batch.is_empty() {
                report.sent = batch.iter().map(|s| s.module_name.clone()).collect();
                debug!(
                    "Sending {} scenario modules: {}",
                    batch.len(),
                    report.sent.join(", ")
                );
                network.send_modules(batch);
            }
        }

        report
    }

    /// Merges one inbound entry and updates the cache and blocked set.
    pub fn merge_entry<G: GameState>(&mut self, game: &mut G, entry: &InboundEntry) -> MergeOutcome {
        let name = entry.module_name.as_str();
        let mode = game.game_mode();
        match self.policy.evaluate(name, mode) {
            Gate::Allowed => {}
            Gate::PermanentlyBlocked => {
                debug!(module = name, "Skipping scenario module, it is created locally");
                return MergeOutcome::Skipped(Gate::PermanentlyBlocked);
            }
            Gate::ModeBlocked => {
                debug!(module = name, %mode, "Skipping scenario module, not used in this mode");
                return MergeOutcome::Skipped(Gate::ModeBlocked);
            }
        }

        debug!(module = name, "Received scenario module");
        let document = match self.codec.decode(&entry.payload) {
            Ok(document) => document,
            Err(err) => {
                warn!(module = name, error = %err, "Scenario data failed to decode");
                self.blocked.insert(name.to_string());
                return MergeOutcome::Failed(err.into());
            }
        };
        if self.settings.dump_documents {
            debug!(module = name, "Decoded scenario module:\n{}", document.pretty());
        }

        let loaded = match game.find_module(name) {
            Some(handle) => {
                debug!(module = name, "Updating existing scenario module");
                let attachment = game.attachment(&handle);
                game.remove_module(&handle)
                    .and_then(|()| game.attach_module(name, &document, attachment))
            }
            None => {
                debug!(module = name, "Creating new scenario module");
                game.create_module(name, &document)
            }
        };

        match loaded {
            Ok(_) => {
                self.record_loaded(name, &document, &entry.payload);
                MergeOutcome::Applied
            }
            Err(err) => {
                warn!(module = name, error = %err, "Error loading scenario module");
                self.blocked.insert(name.to_string());
                MergeOutcome::Failed(err.into())
            }
        }
    }

    /// Encodes every sendable live module and returns those that changed
    /// since they were last exchanged, recording them as exchanged.
    pub fn scan<G: GameState>(&mut self, game: &G) -> Vec<ModuleSnapshot> {
        let mode = game.game_mode();
        let mut batch = Vec::new();

        for live in game.live_modules() {
            if self.policy.evaluate(&live.name, mode) != Gate::Allowed
                || self.blocked.contains(&live.name)
            {
                continue;
            }

            let document = match game.save_module(&live.handle) {
                Ok(document) => document,
                Err(err) => {
                    warn!(module = %live.name, error = %err, "Failed to save scenario module");
                    continue;
                }
            };
            let payload = match self.codec.encode(&document) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(module = %live.name, error = %err, "Failed to encode scenario module");
                    continue;
                }
            };

            if self.cache.has_changed(&live.name, &payload) {
                self.cache.record(&live.name, payload.clone());
                batch.push(ModuleSnapshot {
                    module_name: live.name,
                    payload,
                });
            }
        }

        batch
    }

    fn fabricate_missing_progression<G: GameState>(&mut self, game: &mut G) -> bool {
        if self.progression != ProgressionState::Unobserved {
            return false;
        }
        let mode = game.game_mode();
        if !self.settings.fabrication_modes.contains(&mode) {
            return false;
        }
        let name = self.settings.progression_module.clone();
        if self.cache.is_known(&name) || game.find_module(&name).is_some() {
            return false;
        }

        // One attempt per session, whatever the outcome.
        self.progression = ProgressionState::Fabricated;
        info!(module = %name, %mode, "Creating blank progression data");
        let document = starter_research_document(&name);
        if self.settings.dump_documents {
            debug!(module = %name, "Fabricated scenario module:\n{}", document.pretty());
        }

        match game.create_module(&name, &document) {
            Ok(_) => {
                match self.codec.encode(&document) {
                    Ok(payload) => self.cache.record(&name, payload),
                    Err(err) => warn!(module = %name, error = %err, "Failed to encode scenario module"),
                }
                self.blocked.remove(&name);
                true
            }
            Err(err) => {
                warn!(module = %name, error = %err, "Error creating progression module");
                self.blocked.insert(name);
                false
            }
        }
    }

    fn record_loaded(&mut self, name: &str, document: &Document, received: &[u8]) {
        // Re-encode locally so a peer with other compression settings does not
        // look like a change on the next scan.
        let payload = self
            .codec
            .encode(document)
            .unwrap_or_else(|_| received.to_vec());
        self.cache.record(name, payload);
        self.blocked.remove(name);
        if name == self.settings.progression_module {
            self.progression = ProgressionState::Observed;
        }
    }

    fn arm_permanent_blocks(&mut self) {
        let names: Vec<String> = self
            .policy
            .permanently_blocked()
            .map(str::to_string)
            .collect();
        self.blocked.extend(names);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
