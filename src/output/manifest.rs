//! Precache manifest: ordered `{path, revision}` pairs for offline caching.

use serde::{Deserialize, Serialize};

use super::NamedArtifact;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub revision: String,
}

/// Ordered list of cache-eligible artifacts.
///
/// Rebuilt from scratch every pass; never merged with an older manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecacheManifest {
    entries: Vec<ManifestEntry>,
}

impl PrecacheManifest {
    /// Build from named artifacts, keeping emission order.
    ///
    /// `prefix` is prepended to every path (e.g. a public path of `/`).
    pub fn from_named(named: &[NamedArtifact], prefix: &str) -> Self {
        let entries = named
            .iter()
            .filter(|n| n.artifact.is_precached())
            .map(|n| ManifestEntry {
                path: format!("{prefix}{}", n.file_name),
                revision: n.artifact.content_hash().to_hex(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as pretty JSON (stable field and entry order).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
