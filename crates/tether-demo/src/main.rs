//! Two-peer scenario synchronization demo.
//!
//! Runs two in-memory game sessions joined by a relay thread that plays the
//! part of the server: every batch one peer sends is queued into the other
//! peer's engine. Time is simulated, each round advancing the clock by the
//! configured scan interval.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use tether_config::{CliArgs, Config, default_config_dir};
use tether_sync::testing::{MemoryGame, RecordingSink};
use tether_sync::{
    DISCOVERED_OBJECTS_MODULE, Document, GameMode, GameState, InboundSender, ModuleSnapshot,
    NetworkSink, ScenarioSync, SyncSettings, TickReport,
};
use tracing::{debug, error, info, warn};

/// Which side of the relay a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerId {
    Alpha,
    Beta,
}

impl PeerId {
    fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

type RelayMessage = (PeerId, Vec<ModuleSnapshot>);

/// Hands outgoing batches to the relay thread.
struct ChannelSink {
    origin: PeerId,
    tx: Sender<RelayMessage>,
}

impl NetworkSink for ChannelSink {
    fn send_modules(&mut self, batch: Vec<ModuleSnapshot>) {
        if self.tx.send((self.origin, batch)).is_err() {
            warn!(peer = self.origin.name(), "Relay is gone, dropping scenario batch");
        }
    }
}

/// One simulated game session.
struct Peer {
    id: PeerId,
    engine: ScenarioSync,
    game: MemoryGame,
    sink: ChannelSink,
}

impl Peer {
    fn new(id: PeerId, settings: SyncSettings, mode: GameMode, tx: Sender<RelayMessage>) -> Self {
        let mut engine = ScenarioSync::new(settings);
        engine.enable();
        Self {
            id,
            engine,
            game: MemoryGame::new(mode),
            sink: ChannelSink { origin: id, tx },
        }
    }

    fn tick(&mut self, now: Instant) -> TickReport {
        let report = self.engine.tick(&mut self.game, &mut self.sink, now);
        log_report(self.id, &report);
        report
    }
}

fn log_report(peer: PeerId, report: &TickReport) {
    if *report == TickReport::default() {
        return;
    }
    info!(
        peer = peer.name(),
        merged = report.merged,
        skipped = report.skipped,
        failed = report.failed,
        fabricated = report.fabricated,
        sent = report.sent.len(),
        "Tick"
    );
}

fn scenario(name: &str, values: &[(&str, &str)]) -> Document {
    let mut doc = Document::new("SCENARIO");
    doc.add_value("name", name);
    for (key, value) in values {
        doc.add_value(*key, *value);
    }
    doc
}

/// Forwards every batch to the opposite peer until all sinks are dropped.
fn run_relay(rx: Receiver<RelayMessage>, to_alpha: InboundSender, to_beta: InboundSender) -> usize {
    let mut forwarded = 0;
    for (origin, batch) in rx.iter() {
        let target = match origin {
            PeerId::Alpha => &to_beta,
            PeerId::Beta => &to_alpha,
        };
        for snapshot in batch {
            debug!(
                from = origin.name(),
                module = %snapshot.module_name,
                bytes = snapshot.payload.len(),
                "Relaying scenario module"
            );
            if target.push(snapshot.module_name, snapshot.payload) {
                forwarded += 1;
            }
        }
    }
    forwarded
}

/// Counts modules whose live documents match on both peers.
fn count_converged(alpha: &MemoryGame, beta: &MemoryGame) -> (usize, usize) {
    let mut shared = 0;
    let mut matching = 0;
    for live in alpha.live_modules() {
        let Some(theirs) = beta.document(&live.name) else {
            continue;
        };
        shared += 1;
        if alpha.document(&live.name) == Some(theirs) {
            matching += 1;
        } else {
            warn!(module = %live.name, "Peers disagree on scenario module");
        }
    }
    (shared, matching)
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".tether"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    tether_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let settings = config.sync_settings();
    let mode = config.session.game_mode;
    let interval = settings.scan_interval.max(Duration::from_millis(1));
    info!(
        server = %config.network.server_address,
        port = config.network.server_port,
        player = %config.session.player_name,
        %mode,
        interval_ms = interval.as_millis() as u64,
        "Starting scenario sync demo"
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut alpha = Peer::new(PeerId::Alpha, settings.clone(), mode, tx.clone());
    let mut beta = Peer::new(PeerId::Beta, settings, mode, tx);

    let to_alpha = alpha.engine.sender();
    let to_beta = beta.engine.sender();
    let relay = match std::thread::Builder::new()
        .name("relay".to_string())
        .spawn(move || run_relay(rx, to_alpha, to_beta))
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to spawn relay thread: {e}");
            return;
        }
    };

    // Alpha starts with an established career; beta joins empty.
    alpha
        .game
        .insert("Funding", scenario("Funding", &[("funds", "25000")]));
    alpha
        .game
        .insert("Reputation", scenario("Reputation", &[("rep", "0")]));
    alpha.game.insert(
        "ProgressTracking",
        scenario("ProgressTracking", &[("reachedSpace", "False")]),
    );
    alpha.game.insert(
        DISCOVERED_OBJECTS_MODULE,
        scenario(DISCOVERED_OBJECTS_MODULE, &[("asteroids", "3")]),
    );

    let start = Instant::now();
    for round in 0..args.ticks {
        let now = start + interval * round;

        match round {
            2 => {
                // A corrupted payload blocks the module on beta until a good
                // one arrives.
                beta.engine.sender().push("Strategies", vec![0x5A, 0x00, 0xFF]);
            }
            3 => {
                if let Some(doc) = beta.game.document_mut("Reputation") {
                    doc.set_value("rep", "12.5");
                }
            }
            4 => {
                if let Some(doc) = alpha.game.document_mut("ProgressTracking") {
                    doc.set_value("reachedSpace", "True");
                }
            }
            _ => {}
        }
        if round % 2 == 1 {
            let funds = 25000 + 1000 * u64::from(round);
            if let Some(doc) = alpha.game.document_mut("Funding") {
                doc.set_value("funds", funds.to_string());
            }
        }

        alpha.tick(now);
        beta.tick(now);
        // Let the relay catch up so the next round sees this round's batches.
        std::thread::sleep(Duration::from_millis(5));
    }

    // Closing both sinks ends the relay once it has forwarded everything.
    drop(alpha.sink);
    drop(beta.sink);
    let forwarded = relay.join().unwrap_or_else(|_| {
        warn!("Relay thread panicked");
        0
    });

    let now = start + interval * args.ticks;
    let mut closing = RecordingSink::new();
    let alpha_report = alpha.engine.tick(&mut alpha.game, &mut closing, now);
    let beta_report = beta.engine.tick(&mut beta.game, &mut closing, now);
    log_report(PeerId::Alpha, &alpha_report);
    log_report(PeerId::Beta, &beta_report);

    let (shared, matching) = count_converged(&alpha.game, &beta.game);
    info!(
        forwarded,
        shared,
        matching,
        alpha_blocked = ?alpha.engine.blocked_modules(),
        beta_blocked = ?beta.engine.blocked_modules(),
        beta_progression = ?beta.engine.progression(),
        "Scenario sync demo finished"
    );

    alpha.engine.disable();
    beta.engine.disable();
}
