//! Artifacts: named, content-addressed units of build output.

use super::ContentHash;
use crate::core::AssetKind;

/// A unit of build output before naming.
///
/// The content hash is computed once from the content bytes at construction,
/// so it can never drift from the content it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    logical_name: String,
    content: Vec<u8>,
    content_hash: ContentHash,
    kind: AssetKind,
    is_entry: bool,
    pinned: bool,
    precache: bool,
}

impl Artifact {
    /// Create an artifact; kind is inferred from the logical name.
    pub fn new(logical_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let logical_name = logical_name.into().trim_start_matches('/').to_string();
        let content = content.into();
        let kind = AssetKind::from_path(&logical_name);
        Self {
            content_hash: ContentHash::of(&content),
            logical_name,
            content,
            kind,
            is_entry: false,
            pinned: false,
            precache: true,
        }
    }

    pub fn with_kind(mut self, kind: AssetKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark as an entry bundle (referenced from the entry document).
    pub fn entry(mut self) -> Self {
        self.is_entry = true;
        self
    }

    /// Keep the logical name in every mode (e.g. `service-worker.js`).
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Leave out of the precache manifest even if the kind is eligible.
    pub fn without_precache(mut self) -> Self {
        self.precache = false;
        self
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub const fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    pub const fn is_entry(&self) -> bool {
        self.is_entry
    }

    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Whether this artifact belongs in the precache manifest.
    pub const fn is_precached(&self) -> bool {
        self.precache && self.kind.is_cache_eligible()
    }
}
