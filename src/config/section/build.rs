//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! mode = "production"         # development | production | test
//! output = "public"           # Destination directory (relative to project root)
//! clean = true                # Replace the destination; false merges into it
//! public_path = "/"           # Prefix for URLs in the entry document and manifest
//! assets = ["./resources/img/logo.png"]
//!
//! [[build.entries]]
//! name = "bundle"
//! import = ["@/app.js", "./resources/sass/app.scss"]
//!
//! [build.naming]
//! production = "[name].[hash].[ext]"
//! development = "[name].[ext]"
//! hash_length = 8
//!
//! [build.manifest]
//! filename = "precache-manifest.json"
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildMode;

pub const DEFAULT_MANIFEST_FILE: &str = "precache-manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mode: BuildMode,
    pub output: PathBuf,
    pub clean: bool,
    pub public_path: String,
    /// Entry bundles, in declaration order.
    pub entries: Vec<EntryConfig>,
    /// Standalone resources emitted on their own.
    pub assets: Vec<String>,
    pub naming: NamingConfig,
    pub manifest: ManifestConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::default(),
            output: "public".into(),
            clean: true,
            public_path: String::new(),
            entries: Vec::new(),
            assets: Vec::new(),
            naming: NamingConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

/// One entry bundle: scripts land in `<name>.js`, stylesheets in `<name>.css`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    pub name: String,
    /// Resource identifiers, `path?context` form.
    pub import: Vec<String>,
}

/// Output file name templates per mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub production: String,
    /// Used in development and test.
    pub development: String,
    pub hash_length: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            production: "[name].[hash].[ext]".into(),
            development: "[name].[ext]".into(),
            hash_length: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub filename: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_MANIFEST_FILE.into(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        self.validate_entries(diag);
        self.naming.validate(diag);

        if self.manifest.filename.trim().is_empty() {
            diag.error(FieldPath::new("build.manifest.filename"), "must not be empty");
        }
        if self.output.as_os_str().is_empty() {
            diag.error(FieldPath::new("build.output"), "must not be empty");
        }
    }

    fn validate_entries(&self, diag: &mut ConfigDiagnostics) {
        const FIELD: FieldPath = FieldPath::new("build.entries");

        if self.entries.is_empty() && self.assets.is_empty() {
            diag.error_with_hint(
                FIELD,
                "nothing to build",
                "add a [[build.entries]] table with `name` and `import`",
            );
        }

        let mut seen = FxHashSet::default();
        for entry in &self.entries {
            if entry.name.is_empty() || entry.name.contains('/') {
                diag.error(FIELD, format!("invalid entry name `{}`", entry.name));
            } else if !seen.insert(entry.name.as_str()) {
                diag.error(FIELD, format!("entry `{}` is declared twice", entry.name));
            }
            if entry.import.is_empty() {
                diag.error(FIELD, format!("entry `{}` imports nothing", entry.name));
            }
        }
    }
}

impl NamingConfig {
    fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, template) in [
            (FieldPath::new("build.naming.production"), &self.production),
            (FieldPath::new("build.naming.development"), &self.development),
        ] {
            if !template.contains("[name]") {
                diag.error(field, format!("template `{template}` has no [name]"));
            }
        }
        if !self.production.contains("[hash]") {
            diag.warn(
                FieldPath::new("build.naming.production"),
                "no [hash]: production names will not change with content",
            );
        }
        if !(1..=64).contains(&self.hash_length) {
            diag.error(
                FieldPath::new("build.naming.hash_length"),
                format!("{} is not between 1 and 64", self.hash_length),
            );
        }
    }
}
