//! Document ⇄ payload codec.
//!
//! Encoding flattens the document tree into a pre-order list of
//! wire nodes, serializes it with [`postcard`] behind a one-byte codec
//! version, and wraps the result in the compression envelope. The output is
//! canonical: equal documents always produce equal bytes, so change detection
//! compares payloads directly.
//!
//! Decoding rebuilds the tree with an explicit stack, so a hostile payload
//! cannot recurse past [`SyncSettings::max_document_depth`](crate::SyncSettings).

use serde::{Deserialize, Serialize};

use crate::compression::{CompressionConfig, compress_payload, decompress_payload};
use crate::document::Document;
use crate::error::CodecError;

/// Current codec version. Prepended to every canonical body.
pub const CODEC_VERSION: u8 = 1;

/// One encoded module, ready to hand to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSnapshot {
    /// Name of the scenario module.
    pub module_name: String,
    /// Encoded document (see [`Codec::encode`]).
    pub payload: Vec<u8>,
}

/// A node as written to the wire. Children follow their parent directly.
#[derive(Serialize)]
struct WireNodeRef<'a> {
    name: &'a str,
    values: &'a [(String, String)],
    child_count: u64,
}

/// Owned counterpart of [`WireNodeRef`]; same serialized layout.
#[derive(Deserialize)]
struct WireNode {
    name: String,
    values: Vec<(String, String)>,
    child_count: u64,
}

impl WireNode {
    fn into_document(self) -> (Document, u64) {
        let mut document = Document::new(self.name);
        for (key, value) in self.values {
            document.add_value(key, value);
        }
        (document, self.child_count)
    }
}

/// Serializes and compresses documents.
#[derive(Debug, Clone)]
pub struct Codec {
    compression: CompressionConfig,
    max_depth: usize,
}

impl Codec {
    /// Creates a codec with the given compression rules and decode depth limit.
    pub fn new(compression: CompressionConfig, max_depth: usize) -> Self {
        Self {
            compression,
            max_depth,
        }
    }

    /// Maximum document depth accepted by [`decode`](Self::decode).
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Encodes a document into its canonical compressed payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] only if postcard rejects the node list,
    /// which does not happen for string-only trees.
    pub fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError> {
        let nodes = flatten(document);
        let canonical = postcard::to_extend(&nodes, vec![CODEC_VERSION])
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(compress_payload(&canonical, &self.compression))
    }

    /// Decodes a payload produced by [`encode`](Self::encode).
    ///
    /// An empty-but-valid document decodes to `Ok`; anything corrupt,
    /// truncated, or foreign is an `Err`.
    pub fn decode(&self, payload: &[u8]) -> Result<Document, CodecError> {
        let canonical = decompress_payload(payload)?;
        let Some((&version, body)) = canonical.split_first() else {
            return Err(CodecError::MissingVersion);
        };
        if version != CODEC_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                expected: CODEC_VERSION,
            });
        }
        let (nodes, rest): (Vec<WireNode>, &[u8]) =
            postcard::take_from_bytes(body).map_err(|e| CodecError::Body(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CodecError::TrailingBytes(rest.len()));
        }
        rebuild(nodes, self.max_depth)
    }

    /// Encodes `document` as the snapshot of `module_name`.
    pub fn snapshot(
        &self,
        module_name: &str,
        document: &Document,
    ) -> Result<ModuleSnapshot, CodecError> {
        Ok(ModuleSnapshot {
            module_name: module_name.to_string(),
            payload: self.encode(document)?,
        })
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(
            CompressionConfig::default(),
            crate::settings::DEFAULT_MAX_DOCUMENT_DEPTH,
        )
    }
}

fn flatten(document: &Document) -> Vec<WireNodeRef<'_>> {
    let mut nodes = Vec::new();
    let mut stack = vec![document];
    while let Some(node) = stack.pop() {
        nodes.push(WireNodeRef {
            name: node.name(),
            values: node.values(),
            child_count: node.children().len() as u64,
        });
        // Reversed so the first child is popped next.
        stack.extend(node.children().iter().rev());
    }
    nodes
}

fn rebuild(nodes: Vec<WireNode>, max_depth: usize) -> Result<Document, CodecError> {
    let mut nodes = nodes.into_iter();
    let root = nodes.next().ok_or(CodecError::MissingRoot)?;
    if max_depth == 0 {
        return Err(CodecError::TooDeep { max: max_depth });
    }

    // Each entry: a document under construction and how many children it still expects.
    let mut stack = vec![root.into_document()];
    let mut finished = None;

    while let Some((document, remaining)) = stack.pop() {
        if remaining == 0 {
            match stack.last_mut() {
                Some((parent, _)) => parent.push_child(document),
                None => finished = Some(document),
            }
            continue;
        }

        let child = nodes
            .next()
            .ok_or(CodecError::MissingChildren(remaining))?;
        stack.push((document, remaining - 1));
        if stack.len() >= max_depth {
            return Err(CodecError::TooDeep { max: max_depth });
        }
        stack.push(child.into_document());
    }

    let leftover = nodes.count();
    if leftover > 0 {
        return Err(CodecError::DetachedNodes(leftover));
    }
    finished.ok_or(CodecError::MissingRoot)
}
