//! Build error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::ResourceRequest;
use crate::plugin::Hook;
use crate::transform::TransformError;

/// Fatal failure of a build pass.
///
/// Every variant names what failed (resource, stage, plugin, hook or
/// artifact) so a report can point at the origin without a backtrace.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot resolve `{identifier}`: alias `{prefix}` is not registered")]
    UnresolvedAlias { identifier: String, prefix: String },

    #[error("{}", alias_conflict(prefix, other))]
    AliasConflict { prefix: String, other: String },

    #[error("`{resource}` failed in stage `{stage}`")]
    Transform {
        resource: String,
        stage: String,
        #[source]
        source: TransformError,
    },

    #[error("plugin `{plugin}` failed in `{hook}`")]
    PluginHook {
        plugin: String,
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    #[error("artifact `{artifact}` cannot be listed in the manifest: {reason}")]
    ManifestIntegrity { artifact: String, reason: String },

    #[error("more than one artifact is named `{file_name}`")]
    OutputConflict { file_name: String },

    #[error("output directory `{}` contains the project root", output.display())]
    UnsafeOutput { output: PathBuf },

    #[error("failed to read `{}`", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// A stage failure for `request`.
    pub fn transform(request: &ResourceRequest, stage: &str, source: TransformError) -> Self {
        Self::Transform {
            resource: request.to_string(),
            stage: stage.to_string(),
            source,
        }
    }

    pub fn plugin(plugin: &str, hook: Hook, source: anyhow::Error) -> Self {
        Self::PluginHook {
            plugin: plugin.to_string(),
            hook,
            source,
        }
    }
}

fn alias_conflict(prefix: &str, other: &str) -> String {
    if prefix.is_empty() {
        "alias prefix must not be empty".into()
    } else {
        format!("alias `{prefix}` overlaps with `{other}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildMode, ImportContext};

    #[test]
    fn test_transform_error_names_resource_and_stage() {
        let request = ResourceRequest::new("view.pug", ImportContext::Template, BuildMode::Production);
        let err = BuildError::transform(&request, "pug", TransformError::Failed("bad indent".into()));
        assert_eq!(err.to_string(), "`view.pug?template` failed in stage `pug`");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "bad indent");
    }

    #[test]
    fn test_plugin_error_names_plugin_and_hook() {
        let err = BuildError::plugin("html", Hook::BeforeEmit, anyhow::anyhow!("no template"));
        assert_eq!(err.to_string(), "plugin `html` failed in `beforeEmit`");
    }

    #[test]
    fn test_alias_conflict_display() {
        let empty = BuildError::AliasConflict {
            prefix: String::new(),
            other: String::new(),
        };
        assert!(empty.to_string().contains("empty"));

        let overlap = BuildError::AliasConflict {
            prefix: "@/lib".into(),
            other: "@".into(),
        };
        assert_eq!(overlap.to_string(), "alias `@/lib` overlaps with `@`");
    }
}
