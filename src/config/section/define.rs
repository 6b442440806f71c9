//! `[define]` section: constants substituted into bundled code.
//!
//! ```toml
//! [define]
//! "process.env.API_BASE" = "https://api.example.com"     # any TOML value, JSON-encoded
//! "FEATURE_FLAGS" = { beta = true }
//! "process.env.CLIENT_ID" = { file = "conf.json", pointer = "/client_id" }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Value of one defined constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefineValue {
    /// Read from a JSON file, optionally narrowed by a JSON pointer.
    File {
        file: PathBuf,
        #[serde(default)]
        pointer: Option<String>,
    },
    Value(serde_json::Value),
}

impl DefineValue {
    /// Produce the JSON value, reading files relative to `root`.
    pub fn resolve(&self, root: &Path) -> Result<serde_json::Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::File { file, pointer } => {
                let path = root.join(file);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                let value: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("`{}` is not valid JSON", path.display()))?;
                match pointer {
                    None => Ok(value),
                    Some(pointer) => value.pointer(pointer).cloned().with_context(|| {
                        format!("`{pointer}` not found in `{}`", path.display())
                    }),
                }
            }
        }
    }
}

/// Parse a `--define KEY=VALUE` argument.
///
/// VALUE is taken as JSON when it parses, as a plain string otherwise.
pub fn parse_cli_define(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{arg}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{arg}`"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
