//! Thread-safe mailbox of remote module updates awaiting merge.
//!
//! The network thread pushes through cloned [`InboundSender`]s; the engine
//! tick drains the [`InboundQueue`]. This is the only engine state that
//! crosses threads.

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

/// One received module snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEntry {
    /// Name of the scenario module.
    pub module_name: String,
    /// Encoded document as received.
    pub payload: Vec<u8>,
}

impl InboundEntry {
    /// Creates an entry.
    pub fn new(module_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            module_name: module_name.into(),
            payload,
        }
    }
}

/// Producer handle given to the network layer. Cheap to clone, `Send + Sync`.
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: Sender<InboundEntry>,
}

impl InboundSender {
    /// Queues a received module. Never blocks.
    ///
    /// Returns `false` if the owning queue no longer exists.
    pub fn push(&self, module_name: impl Into<String>, payload: Vec<u8>) -> bool {
        let entry = InboundEntry::new(module_name, payload);
        match self.tx.send(entry) {
            Ok(()) => true,
            Err(err) => {
                debug!(
                    module = %err.0.module_name,
                    "Dropping scenario module, sync engine is gone"
                );
                false
            }
        }
    }
}

/// FIFO of inbound entries. Unbounded, so pushes never block or drop; there
/// is no deduplication, later entries for a module simply win on merge.
#[derive(Debug)]
pub struct InboundQueue {
    tx: Sender<InboundEntry>,
    rx: Receiver<InboundEntry>,
}

impl InboundQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// A producer handle for the network layer.
    pub fn sender(&self) -> InboundSender {
        InboundSender {
            tx: self.tx.clone(),
        }
    }

    /// Queues an entry from the owning thread.
    pub fn push(&self, entry: InboundEntry) {
        // The queue holds its own receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(entry);
    }

    /// Removes and returns every entry queued when the drain started, in
    /// arrival order. Entries pushed concurrently stay for the next drain.
    pub fn drain_all(&self) -> Vec<InboundEntry> {
        let pending = self.rx.len();
        self.rx.try_iter().take(pending).collect()
    }

    /// Discards everything queued. Returns how many entries were dropped.
    pub fn clear(&self) -> usize {
        self.drain_all().len()
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}
