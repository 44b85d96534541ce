//! Outbound scan throttling.

use std::time::{Duration, Instant};

/// Decides when the next outbound scan is due. The first scan after a reset
/// is due immediately.
#[derive(Debug, Clone)]
pub struct ScanTimer {
    /// Minimum time between scans.
    pub interval: Duration,
    /// When the last scan ran, if any.
    pub last_scan: Option<Instant>,
}

impl ScanTimer {
    /// Creates a timer with no scan recorded.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_scan: None,
        }
    }

    /// Returns `true` if a scan should run at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_scan {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Records that a scan ran at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last_scan = Some(now);
    }

    /// Forgets the last scan so the next one is due immediately.
    pub fn reset(&mut self) {
        self.last_scan = None;
    }
}
