//! Unit tests for the scenario synchronization engine.

use std::time::{Duration, Instant};

use super::*;
use crate::adapter::ModuleAttachment;
use crate::compression::CompressionConfig;
use crate::gating::GameMode;
use crate::settings::{DISCOVERED_OBJECTS_MODULE, RESEARCH_MODULE};
use crate::testing::{MemoryGame, RecordingSink};

const INTERVAL: Duration = Duration::from_secs(10);

fn settings() -> SyncSettings {
    SyncSettings {
        scan_interval: INTERVAL,
        ..SyncSettings::default()
    }
}

/// Helper: an enabled engine with the test settings.
fn enabled_engine() -> ScenarioSync {
    let mut engine = ScenarioSync::new(settings());
    engine.enable();
    engine
}

fn funding(funds: &str) -> Document {
    let mut doc = Document::new("SCENARIO");
    doc.add_value("name", "Funding");
    doc.add_value("funds", funds);
    doc
}

fn research(sci: &str) -> Document {
    let mut doc = Document::new("SCENARIO");
    doc.add_value("name", RESEARCH_MODULE);
    doc.add_value("sci", sci);
    doc
}

fn encode(engine: &ScenarioSync, doc: &Document) -> Vec<u8> {
    engine.codec().encode(doc).unwrap()
}

#[test]
fn test_changed_module_sent_once_per_change() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert("A", funding("100"));
    let report = engine.tick(&mut game, &mut net, t0);
    assert_eq!(report.sent, vec!["A".to_string()]);
    assert_eq!(net.batches.len(), 1);
    assert_eq!(
        net.batches[0],
        vec![ModuleSnapshot {
            module_name: "A".to_string(),
            payload: encode(&engine, &funding("100")),
        }]
    );

    // Unchanged, before the interval: nothing.
    let report = engine.tick(&mut game, &mut net, t0 + Duration::from_secs(1));
    assert!(report.sent.is_empty());
    assert_eq!(net.batches.len(), 1);

    // Changed, but still before the interval: nothing yet.
    game.insert("A", funding("250"));
    engine.tick(&mut game, &mut net, t0 + Duration::from_secs(5));
    assert_eq!(net.batches.len(), 1);

    // Interval elapsed: the change goes out.
    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert_eq!(report.sent, vec!["A".to_string()]);
    assert_eq!(net.batches[1][0].payload, encode(&engine, &funding("250")));
}

#[test]
fn test_unchanged_module_not_resent_after_interval() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert("A", funding("100"));
    engine.tick(&mut game, &mut net, t0);
    engine.tick(&mut game, &mut net, t0 + INTERVAL);
    engine.tick(&mut game, &mut net, t0 + INTERVAL * 2);
    assert_eq!(net.batches.len(), 1);
}

#[test]
fn test_changed_modules_batched_into_one_request() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    game.insert("A", funding("1"));
    game.insert("B", funding("2"));
    game.insert("C", funding("3"));
    engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(net.batches.len(), 1);
    assert_eq!(net.last_names(), vec!["A", "B", "C"]);
}

#[test]
fn test_garbage_payload_blocks_module() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert("Blocked1", funding("1"));
    engine.sender().push("Blocked1", b"\x07garbage bytes".to_vec());

    let report = engine.tick(&mut game, &mut net, t0);
    assert_eq!(report.failed, 1);
    assert!(engine.is_blocked("Blocked1"));
    assert_eq!(game.calls().total(), 0);
    assert!(net.batches.is_empty());

    // Still excluded after a local change.
    game.document_mut("Blocked1").unwrap().set_value("funds", "2");
    engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert!(net.batches.is_empty());
    assert!(!engine.cache().is_known("Blocked1"));
}

#[test]
fn test_successful_receive_unblocks_module() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert("Blocked1", funding("1"));
    engine.sender().push("Blocked1", vec![0xFF]);
    engine.tick(&mut game, &mut net, t0);
    assert!(engine.is_blocked("Blocked1"));

    let payload = encode(&engine, &funding("7"));
    engine.sender().push("Blocked1", payload);
    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert_eq!(report.merged, 1);
    assert!(!engine.is_blocked("Blocked1"));
    // The received state is cached, so it is not echoed back.
    assert!(report.sent.is_empty());

    game.document_mut("Blocked1").unwrap().set_value("funds", "8");
    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL * 2);
    assert_eq!(report.sent, vec!["Blocked1".to_string()]);
}

#[test]
fn test_permanently_blocked_module_never_touches_game() {
    for mode in [GameMode::Sandbox, GameMode::Science, GameMode::Career] {
        let mut engine = enabled_engine();
        let mut game = MemoryGame::new(mode);
        let mut net = RecordingSink::new();
        // Avoid fabrication noise in the call counters.
        game.insert(RESEARCH_MODULE, research("0"));

        let payload = encode(&engine, &funding("1"));
        engine.sender().push(DISCOVERED_OBJECTS_MODULE, payload);
        let report = engine.tick(&mut game, &mut net, Instant::now());

        assert_eq!(report.skipped, 1, "mode {mode}");
        assert_eq!(game.calls().total(), 0, "mode {mode}");
        assert!(!engine.cache().is_known(DISCOVERED_OBJECTS_MODULE));
        assert!(engine.is_blocked(DISCOVERED_OBJECTS_MODULE));
    }
}

#[test]
fn test_permanently_blocked_module_never_sent() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    game.insert(DISCOVERED_OBJECTS_MODULE, funding("asteroids"));
    game.insert("A", funding("1"));
    engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(net.last_names(), vec!["A"]);
}

#[test]
fn test_mode_gating_follows_mode_changes() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert(RESEARCH_MODULE, research("5"));
    let report = engine.tick(&mut game, &mut net, t0);
    assert_eq!(report.sent, vec![RESEARCH_MODULE.to_string()]);

    game.set_mode(GameMode::Sandbox);
    game.document_mut(RESEARCH_MODULE).unwrap().set_value("sci", "6");
    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert!(report.sent.is_empty());
    // Excluded by policy, not by the blocked set.
    assert!(!engine.is_blocked(RESEARCH_MODULE));

    game.set_mode(GameMode::Career);
    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL * 2);
    assert_eq!(report.sent, vec![RESEARCH_MODULE.to_string()]);
    assert_eq!(
        net.batches.last().unwrap()[0].payload,
        encode(&engine, &research("6"))
    );
}

#[test]
fn test_mode_blocked_inbound_skipped_until_mode_allows() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    let payload = encode(&engine, &research("42"));
    engine.sender().push(RESEARCH_MODULE, payload.clone());
    let report = engine.tick(&mut game, &mut net, t0);
    assert_eq!(report.skipped, 1);
    assert_eq!(game.calls().total(), 0);
    assert!(!engine.is_blocked(RESEARCH_MODULE));
    assert!(!engine.cache().is_known(RESEARCH_MODULE));

    game.set_mode(GameMode::Science);
    engine.sender().push(RESEARCH_MODULE, payload);
    let report = engine.tick(&mut game, &mut net, t0 + Duration::from_secs(1));
    assert_eq!(report.merged, 1);
    assert_eq!(game.document(RESEARCH_MODULE), Some(&research("42")));
    assert_eq!(engine.progression(), ProgressionState::Observed);
}

#[test]
fn test_merging_same_entry_twice_is_idempotent() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let entry = InboundEntry::new("Funding", encode(&engine, &funding("900")));

    assert!(engine.merge_entry(&mut game, &entry).is_applied());
    let first = game.document("Funding").cloned();
    assert!(engine.merge_entry(&mut game, &entry).is_applied());

    assert_eq!(game.document("Funding").cloned(), first);
    assert_eq!(game.count("Funding"), 1);
    let calls = game.calls();
    assert_eq!((calls.created, calls.removed, calls.attached), (1, 1, 1));
}

#[test]
fn test_replacement_preserves_attachment() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let attachment = ModuleAttachment {
        target_scenes: vec!["SPACECENTER".to_string(), "FLIGHT".to_string()],
    };
    game.insert_with("Funding", funding("1"), attachment.clone());

    let entry = InboundEntry::new("Funding", encode(&engine, &funding("2")));
    assert!(engine.merge_entry(&mut game, &entry).is_applied());

    assert_eq!(game.document("Funding"), Some(&funding("2")));
    assert_eq!(game.attachment_of("Funding"), Some(&attachment));
}

#[test]
fn test_last_entry_wins_within_a_tick() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    let sender = engine.sender();
    sender.push("Funding", encode(&engine, &funding("1")));
    sender.push("Funding", encode(&engine, &funding("2")));
    let report = engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(report.merged, 2);
    assert_eq!(game.document("Funding"), Some(&funding("2")));
    assert_eq!(game.count("Funding"), 1);
    assert!(report.sent.is_empty());
}

#[test]
fn test_adapter_failure_blocks_until_next_success() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    game.reject("Funding");

    let entry = InboundEntry::new("Funding", encode(&engine, &funding("1")));
    let outcome = engine.merge_entry(&mut game, &entry);
    assert!(matches!(
        outcome,
        MergeOutcome::Failed(MergeError::Adapter(_))
    ));
    assert!(engine.is_blocked("Funding"));
    assert!(!engine.cache().is_known("Funding"));

    game.accept("Funding");
    assert!(engine.merge_entry(&mut game, &entry).is_applied());
    assert!(!engine.is_blocked("Funding"));
    assert!(engine.cache().is_known("Funding"));
}

#[test]
fn test_decode_failure_reports_decode_error() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let outcome = engine.merge_entry(&mut game, &InboundEntry::new("Funding", Vec::new()));
    assert!(matches!(outcome, MergeOutcome::Failed(MergeError::Decode(_))));
}

#[test]
fn test_received_payload_from_other_codec_settings_not_echoed() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    let mut big = funding("1");
    for i in 0..100 {
        big.add_value("contract", format!("contract-{i}"));
    }
    let peer = Codec::new(
        CompressionConfig {
            threshold: 0,
            enabled: false,
        },
        64,
    );
    engine.sender().push("Funding", peer.encode(&big).unwrap());
    let report = engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(report.merged, 1);
    assert!(report.sent.is_empty());
}

#[test]
fn test_fabricates_progression_once_in_career() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    let report = engine.tick(&mut game, &mut net, t0);
    assert!(report.fabricated);
    assert_eq!(engine.progression(), ProgressionState::Fabricated);
    assert_eq!(game.count(RESEARCH_MODULE), 1);
    assert_eq!(
        game.document(RESEARCH_MODULE),
        Some(&starter_research_document(RESEARCH_MODULE))
    );
    // Recorded as exchanged, so the starter data is not broadcast.
    assert!(report.sent.is_empty());

    let report = engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert!(!report.fabricated);
    assert_eq!(game.calls().created, 1);
}

#[test]
fn test_no_fabrication_outside_fabrication_modes() {
    for mode in [GameMode::Sandbox, GameMode::Science] {
        let mut engine = enabled_engine();
        let mut game = MemoryGame::new(mode);
        let mut net = RecordingSink::new();
        let report = engine.tick(&mut game, &mut net, Instant::now());
        assert!(!report.fabricated, "mode {mode}");
        assert_eq!(game.count(RESEARCH_MODULE), 0);
    }
}

#[test]
fn test_no_fabrication_after_progression_observed() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();

    engine
        .sender()
        .push(RESEARCH_MODULE, encode(&engine, &research("30")));
    let report = engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(report.merged, 1);
    assert!(!report.fabricated);
    assert_eq!(engine.progression(), ProgressionState::Observed);
    assert_eq!(game.document(RESEARCH_MODULE), Some(&research("30")));
}

#[test]
fn test_no_fabrication_when_progression_already_live() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();

    game.insert(RESEARCH_MODULE, research("12"));
    let report = engine.tick(&mut game, &mut net, Instant::now());
    assert!(!report.fabricated);
    assert_eq!(game.calls().created, 0);
    assert_eq!(report.sent, vec![RESEARCH_MODULE.to_string()]);
}

#[test]
fn test_failed_fabrication_is_not_retried() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.reject(RESEARCH_MODULE);
    let report = engine.tick(&mut game, &mut net, t0);
    assert!(!report.fabricated);
    assert!(engine.is_blocked(RESEARCH_MODULE));

    engine.tick(&mut game, &mut net, t0 + INTERVAL);
    assert_eq!(game.calls().created, 1);
}

#[test]
fn test_merged_progression_overrides_fabricated() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    engine.tick(&mut game, &mut net, t0);
    assert_eq!(engine.progression(), ProgressionState::Fabricated);

    engine
        .sender()
        .push(RESEARCH_MODULE, encode(&engine, &research("99")));
    engine.tick(&mut game, &mut net, t0 + Duration::from_secs(1));
    assert_eq!(engine.progression(), ProgressionState::Observed);
    assert_eq!(game.document(RESEARCH_MODULE), Some(&research("99")));
    assert_eq!(game.count(RESEARCH_MODULE), 1);
}

#[test]
fn test_disabled_engine_does_nothing() {
    let mut engine = ScenarioSync::new(settings());
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();

    game.insert("A", funding("1"));
    engine.sender().push("B", encode(&engine, &funding("2")));
    let report = engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(report, TickReport::default());
    assert_eq!(engine.state(), EngineState::Disabled);
    assert!(net.batches.is_empty());
    assert_eq!(game.calls().total(), 0);
}

#[test]
fn test_entries_queued_before_enable_are_merged() {
    let mut engine = ScenarioSync::new(settings());
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    engine.sender().push("A", encode(&engine, &funding("1")));
    engine.enable();
    let report = engine.tick(&mut game, &mut net, Instant::now());
    assert_eq!(report.merged, 1);
}

#[test]
fn test_disable_clears_session_state() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Career);
    let mut net = RecordingSink::new();
    let t0 = Instant::now();

    game.insert("A", funding("1"));
    engine.sender().push("Broken", vec![0xAB]);
    engine.tick(&mut game, &mut net, t0);
    assert!(engine.cache().is_known("A"));
    assert!(engine.is_blocked("Broken"));
    assert_eq!(engine.progression(), ProgressionState::Fabricated);

    engine.sender().push("Late", encode(&engine, &funding("3")));
    engine.disable();
    assert_eq!(engine.state(), EngineState::Disabled);
    assert!(engine.cache().is_empty());
    assert_eq!(engine.blocked_modules(), vec![DISCOVERED_OBJECTS_MODULE]);
    assert_eq!(engine.progression(), ProgressionState::Unobserved);

    // A reconnect starts clean: everything is sent again immediately.
    engine.enable();
    let report = engine.tick(&mut game, &mut net, t0 + Duration::from_secs(1));
    assert_eq!(report.merged, 0);
    assert!(report.sent.contains(&"A".to_string()));
    assert!(report.sent.contains(&RESEARCH_MODULE.to_string()));
}

#[test]
fn test_push_from_network_thread() {
    let mut engine = enabled_engine();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    let sender = engine.sender();
    let payload = encode(&engine, &funding("77"));
    std::thread::spawn(move || {
        assert!(sender.push("Funding", payload));
    })
    .join()
    .unwrap();

    let report = engine.tick(&mut game, &mut net, Instant::now());
    assert_eq!(report.merged, 1);
    assert_eq!(game.document("Funding"), Some(&funding("77")));
}

#[test]
fn test_custom_policy_replaces_permanent_blocks() {
    let mut policy = GatePolicy::new();
    policy.block_permanently("Secret");
    let mut engine = ScenarioSync::new(settings()).with_policy(policy);
    engine.enable();
    let mut game = MemoryGame::new(GameMode::Sandbox);
    let mut net = RecordingSink::new();

    game.insert("Secret", funding("1"));
    game.insert(DISCOVERED_OBJECTS_MODULE, funding("2"));
    engine.tick(&mut game, &mut net, Instant::now());

    assert_eq!(engine.blocked_modules(), vec!["Secret"]);
    assert_eq!(net.last_names(), vec![DISCOVERED_OBJECTS_MODULE]);
}
