//! Progression (research) bookkeeping and the starter document fabricated
//! when a session that needs progression data has none.

use crate::document::Document;

/// What the engine knows about progression data this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressionState {
    /// No progression module was merged or fabricated yet.
    #[default]
    Unobserved,
    /// A starter module was fabricated locally.
    Fabricated,
    /// A progression module was merged from the network.
    Observed,
}

/// Parts unlocked by the starting tech node.
const STARTER_PARTS: [&str; 7] = [
    "mk1pod",
    "liquidEngine",
    "solidBooster",
    "fuelTankSmall",
    "trussPiece1x",
    "longAntenna",
    "parachuteSingle",
];

/// A minimal research module: no science, only the starting tech node.
pub fn starter_research_document(module_name: &str) -> Document {
    let mut document = Document::new("SCENARIO");
    document.add_value("name", module_name);
    document.add_value("scene", "5, 6, 7, 8, 9");
    document.add_value("sci", "0");
    let tech = document.add_child("Tech");
    tech.add_value("id", "start");
    tech.add_value("state", "Available");
    for part in STARTER_PARTS {
        tech.add_value("part", part);
    }
    document
}
