//! Error types for decoding and merging scenario modules.
//!
//! None of these are fatal. A failure confines itself to one module, which
//! stops synchronizing until a later receive for it succeeds.

use crate::compression::CompressionError;

/// A payload could not be turned back into a [`Document`](crate::Document).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serializing the canonical form failed.
    #[error("failed to encode document: {0}")]
    Encode(String),
    /// The compression envelope was invalid.
    #[error(transparent)]
    Compression(#[from] CompressionError),
    /// The decompressed body was empty, so no version byte.
    #[error("payload carries no codec version")]
    MissingVersion,
    /// The payload was produced by an unsupported codec version.
    #[error("unsupported codec version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version byte found in the payload.
        found: u8,
        /// Version this build writes and reads.
        expected: u8,
    },
    /// The canonical node list could not be parsed.
    #[error("malformed document body: {0}")]
    Body(String),
    /// Bytes remained after the node list.
    #[error("{0} trailing bytes after document body")]
    TrailingBytes(usize),
    /// The node list was empty.
    #[error("document has no root node")]
    MissingRoot,
    /// A node announced more children than the list contains.
    #[error("document ended while {0} children were still expected")]
    MissingChildren(u64),
    /// Nodes remained after the root was complete.
    #[error("{0} nodes outside the root document")]
    DetachedNodes(usize),
    /// The tree nests deeper than allowed.
    #[error("document nesting exceeds {max} levels")]
    TooDeep {
        /// Configured maximum depth.
        max: usize,
    },
}

/// The game rejected a request to save, build, or remove a live module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AdapterError {
    /// Human-readable cause reported by the game.
    pub message: String,
}

impl AdapterError {
    /// Creates an adapter error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why an inbound module could not be merged.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The payload did not decode.
    #[error("decode failed: {0}")]
    Decode(#[from] CodecError),
    /// The game failed to replace or create the live module.
    #[error("game rejected module: {0}")]
    Adapter(#[from] AdapterError),
}
