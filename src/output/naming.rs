//! Output naming: turns logical names into final, content-addressed names.
//!
//! Templates use bracketed placeholders:
//!
//! | Placeholder | Value                                  |
//! |-------------|----------------------------------------|
//! | `[name]`    | file stem of the logical name          |
//! | `[ext]`     | extension without the dot              |
//! | `[hash]`    | first `hash_length` hex chars of hash  |
//!
//! The directory part of the logical name is preserved.

use rustc_hash::FxHashSet;

use super::{Artifact, ContentHash, PrecacheManifest};
use crate::config::NamingConfig;
use crate::core::BuildMode;
use crate::pipeline::BuildError;

/// Naming policy for one build mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    template: String,
    hash_length: usize,
}

impl NamingPolicy {
    pub fn new(template: impl Into<String>, hash_length: usize) -> Self {
        Self {
            template: template.into(),
            hash_length,
        }
    }

    /// Select the template configured for `mode`.
    pub fn for_mode(config: &NamingConfig, mode: BuildMode) -> Self {
        let template = if mode.hashes_names() {
            &config.production
        } else {
            &config.development
        };
        Self::new(template.clone(), config.hash_length)
    }

    /// Final output path (relative to the destination) for an artifact.
    pub fn final_name(&self, artifact: &Artifact) -> String {
        if artifact.is_pinned() {
            return artifact.logical_name().to_string();
        }
        self.apply(artifact.logical_name(), artifact.content_hash())
    }

    fn apply(&self, logical_name: &str, hash: ContentHash) -> String {
        let (dir, file) = match logical_name.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, logical_name),
        };
        let (stem, ext) = match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (file, ""),
        };

        let template = if ext.is_empty() {
            self.template.replace(".[ext]", "").replace("[ext]", "")
        } else {
            self.template.clone()
        };

        let name = template
            .replace("[name]", stem)
            .replace("[ext]", ext)
            .replace("[hash]", &hash.short(self.hash_length));

        match dir {
            Some(dir) => format!("{dir}/{name}"),
            None => name,
        }
    }
}

/// An artifact paired with its final output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArtifact {
    pub artifact: Artifact,
    pub file_name: String,
}

/// Result of naming: named artifacts in emission order plus the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedOutput {
    pub artifacts: Vec<NamedArtifact>,
    pub manifest: PrecacheManifest,
}

impl NamedOutput {
    /// Look up the final name of an artifact by logical name.
    pub fn file_name_of(&self, logical_name: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|named| named.artifact.logical_name() == logical_name)
            .map(|named| named.file_name.as_str())
    }
}

/// Name every artifact and derive the precache manifest.
///
/// Emission order is preserved. Fails on empty content (no meaningful
/// revision) and on two artifacts landing on the same output name.
pub fn name_and_emit(
    artifacts: &[Artifact],
    policy: &NamingPolicy,
    manifest_prefix: &str,
) -> Result<NamedOutput, BuildError> {
    let mut seen = FxHashSet::default();
    let mut named = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        if artifact.content().is_empty() {
            return Err(BuildError::ManifestIntegrity {
                artifact: artifact.logical_name().to_string(),
                reason: "content is empty".into(),
            });
        }

        let file_name = policy.final_name(artifact);
        if !seen.insert(file_name.clone()) {
            return Err(BuildError::OutputConflict { file_name });
        }

        named.push(NamedArtifact {
            artifact: artifact.clone(),
            file_name,
        });
    }

    let manifest = PrecacheManifest::from_named(&named, manifest_prefix);
    Ok(NamedOutput {
        artifacts: named,
        manifest,
    })
}
