//! Conditional LZ4 compression for scenario payloads.
//!
//! Large module documents (science archives, contract lists) are compressed
//! before transmission, while small ones skip compression to avoid overhead.
//! The first byte of every payload says which case applies.

/// Compression flag: payload is uncompressed.
pub const COMPRESSION_FLAG_NONE: u8 = 0x00;

/// Compression flag: payload is LZ4-compressed with a 4-byte size prefix.
pub const COMPRESSION_FLAG_LZ4: u8 = 0x01;

/// Largest decompressed body accepted from the network (16 MiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Controls when payloads are compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    /// Minimum canonical size (bytes) before compression is applied. Default: 256.
    pub threshold: usize,
    /// Whether compression is enabled at all. Default: true.
    pub enabled: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: 256,
            enabled: true,
        }
    }
}

/// Wrap canonical document bytes with optional compression.
///
/// Output: compression flag byte + (possibly compressed) data.
pub fn compress_payload(data: &[u8], config: &CompressionConfig) -> Vec<u8> {
    if !config.enabled || data.len() < config.threshold {
        let mut out = Vec::with_capacity(1 + data.len());
        out.push(COMPRESSION_FLAG_NONE);
        out.extend_from_slice(data);
        out
    } else {
        let compressed = lz4_flex::compress_prepend_size(data);
        let mut out = Vec::with_capacity(1 + compressed.len());
        out.push(COMPRESSION_FLAG_LZ4);
        out.extend_from_slice(&compressed);
        out
    }
}

/// Unwrap a received payload, decompressing if necessary.
///
/// The LZ4 size prefix is checked against [`MAX_DECOMPRESSED_SIZE`] before
/// any buffer is allocated.
pub fn decompress_payload(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let Some((&flag, body)) = data.split_first() else {
        return Err(CompressionError::EmptyPayload);
    };

    match flag {
        COMPRESSION_FLAG_NONE => Ok(body.to_vec()),
        COMPRESSION_FLAG_LZ4 => {
            let Some((prefix, block)) = body.split_first_chunk::<4>() else {
                return Err(CompressionError::MissingSizePrefix);
            };
            let size = u32::from_le_bytes(*prefix) as usize;
            if size > MAX_DECOMPRESSED_SIZE {
                return Err(CompressionError::TooLarge {
                    size,
                    max: MAX_DECOMPRESSED_SIZE,
                });
            }
            let decompressed = lz4_flex::decompress(block, size)
                .map_err(|e| CompressionError::DecompressFailed(e.to_string()))?;
            if decompressed.len() != size {
                return Err(CompressionError::SizeMismatch {
                    declared: size,
                    actual: decompressed.len(),
                });
            }
            Ok(decompressed)
        }
        flag => Err(CompressionError::UnknownFlag(flag)),
    }
}

/// Errors that can occur during payload decompression.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The payload was empty: no compression flag present.
    #[error("empty payload, no compression flag")]
    EmptyPayload,
    /// An LZ4 payload was too short to hold its size prefix.
    #[error("LZ4 payload is missing its size prefix")]
    MissingSizePrefix,
    /// The declared decompressed size exceeds the accepted maximum.
    #[error("declared size {size} exceeds maximum {max}")]
    TooLarge {
        /// Size announced by the prefix.
        size: usize,
        /// Maximum accepted size.
        max: usize,
    },
    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    DecompressFailed(String),
    /// Decompression produced a different length than announced.
    #[error("decompressed {actual} bytes, prefix declared {declared}")]
    SizeMismatch {
        /// Size announced by the prefix.
        declared: usize,
        /// Bytes actually produced.
        actual: usize,
    },
    /// An unknown compression flag byte was encountered.
    #[error("unknown compression flag: 0x{0:02X}")]
    UnknownFlag(u8),
}
