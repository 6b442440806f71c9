//! Transformer chains: the uniform interface to content transformations.
//!
//! A chain is an ordered list of `TransformerRef` descriptors. The executor
//! resolves each descriptor through a `TransformerRegistry` and feeds the
//! previous stage's output into the next stage.
//!
//! Actual preprocessors (sass, pug, babel, ...) are external collaborators,
//! reached through the `command` transformer or custom registrations.

pub mod builtin;
mod chain;
mod registry;

pub use chain::apply;
pub use registry::TransformerRegistry;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::{BuildMode, Defines, ResourceRequest};

/// Stage options as written in config.
pub type Options = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// TransformerRef
// ============================================================================

/// Stateless descriptor of one chain stage.
///
/// In config either a bare name or a table:
///
/// ```toml
/// use = ["define", { name = "minify", modes = ["production"] }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RefSpec")]
pub struct TransformerRef {
    name: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    options: Options,
    /// Modes the stage is active in; empty means every mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    modes: Vec<BuildMode>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RefSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: Options,
        #[serde(default)]
        modes: Vec<BuildMode>,
    },
}

impl From<RefSpec> for TransformerRef {
    fn from(spec: RefSpec) -> Self {
        match spec {
            RefSpec::Name(name) => Self::new(name),
            RefSpec::Full {
                name,
                options,
                modes,
            } => Self {
                name,
                options,
                modes,
            },
        }
    }
}

impl TransformerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
            modes: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    #[cfg(test)]
    pub fn only_in(mut self, modes: &[BuildMode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the stage runs in `mode`.
    pub fn is_active(&self, mode: BuildMode) -> bool {
        self.modes.is_empty() || self.modes.contains(&mode)
    }
}

// ============================================================================
// Transformer
// ============================================================================

/// What a stage can see besides its input and options.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub request: &'a ResourceRequest,
    /// Resolved source path of the resource.
    pub path: &'a Path,
    /// Project root (working directory for external commands).
    pub root: &'a Path,
    /// Frozen build-wide constants.
    pub defines: &'a Defines,
}

impl TransformContext<'_> {
    #[inline]
    pub fn mode(&self) -> BuildMode {
        self.request.mode()
    }
}

/// A content transformation stage.
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        input: Vec<u8>,
        options: &Options,
        cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(Vec<u8>, &Options, &TransformContext<'_>) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    fn transform(
        &self,
        input: Vec<u8>,
        options: &Options,
        cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError> {
        self(input, options, cx)
    }
}

/// Failure signalled by a single stage.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no transformer registered under this name")]
    Unknown,

    #[error("invalid option `{option}`: {message}")]
    InvalidOption { option: String, message: String },

    #[error("content is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransformError {
    pub fn invalid_option(option: &str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(rename = "use")]
        chain: Vec<TransformerRef>,
    }

    #[test]
    fn test_ref_from_name_or_table() {
        let w: Wrapper = toml::from_str(
            r#"use = ["raw", { name = "command", options = { command = ["sass", "--stdin"] }, modes = ["production"] }]"#,
        )
        .unwrap();

        assert_eq!(w.chain[0], TransformerRef::new("raw"));
        assert!(w.chain[0].is_active(BuildMode::Development));

        let cmd = &w.chain[1];
        assert_eq!(cmd.name(), "command");
        assert_eq!(cmd.options()["command"][0], "sass");
        assert!(cmd.is_active(BuildMode::Production));
        assert!(!cmd.is_active(BuildMode::Test));
    }

    #[test]
    fn test_builder() {
        let r = TransformerRef::new("minify")
            .with_option("kind", serde_json::json!("script"))
            .only_in(&[BuildMode::Production]);
        assert_eq!(r.options()["kind"], "script");
        assert!(!r.is_active(BuildMode::Development));
    }
}
