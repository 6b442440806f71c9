//! Output naming, precache manifest and staged writes.

mod artifact;
mod hash;
mod manifest;
mod naming;
mod stage;

pub use artifact::Artifact;
pub use hash::ContentHash;
pub use manifest::{ManifestEntry, PrecacheManifest};
pub use naming::{NamedArtifact, NamedOutput, NamingPolicy, name_and_emit};
pub use stage::StagingDir;
