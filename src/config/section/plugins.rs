//! `[plugins.*]` sections: built-in plugin settings.
//!
//! ```toml
//! [plugins.html]
//! template = "resources/index.html"
//! title = "Tanibox"
//! inline.production = "resources/js/sw-register.js"
//! inline.development = "resources/js/sw-unregister.js"
//!
//! [plugins.service_worker]
//! enable = true
//! cache_id = "tanibox"
//!
//! [plugins.report]
//! enable = true
//!
//! [plugins.externals]          # honoured in test mode only
//! vendor = true
//! names = ["jquery"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildMode;
use crate::rules::Pattern;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    pub html: HtmlConfig,
    pub service_worker: ServiceWorkerConfig,
    pub report: ReportConfig,
    pub externals: ExternalsConfig,
}

impl PluginsConfig {
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        self.html.validate(root, diag);
        if self.service_worker.enable && self.service_worker.cache_id.trim().is_empty() {
            diag.error(FieldPath::new("plugins.service_worker.cache_id"), "must not be empty");
        }
    }
}

// ============================================================================
// html
// ============================================================================

/// Entry document generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub enable: bool,
    /// Template with `{{ styles }}`, `{{ scripts }}`, `{{ inline_script }}`
    /// and `{{ title }}` placeholders; tags are injected when absent.
    pub template: Option<PathBuf>,
    pub filename: String,
    pub title: String,
    /// Script inlined into the document, chosen by mode.
    pub inline: InlineScripts,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            enable: true,
            template: None,
            filename: "index.html".into(),
            title: String::new(),
            inline: InlineScripts::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineScripts {
    pub development: Option<PathBuf>,
    pub production: Option<PathBuf>,
    pub test: Option<PathBuf>,
}

impl InlineScripts {
    pub fn for_mode(&self, mode: BuildMode) -> Option<&Path> {
        match mode {
            BuildMode::Development => self.development.as_deref(),
            BuildMode::Production => self.production.as_deref(),
            BuildMode::Test => self.test.as_deref(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Path> {
        BuildMode::ALL.into_iter().filter_map(|mode| self.for_mode(mode))
    }
}

impl HtmlConfig {
    fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        if self.filename.trim().is_empty() {
            diag.error(FieldPath::new("plugins.html.filename"), "must not be empty");
        }
        if let Some(template) = &self.template
            && !root.join(template).is_file()
        {
            diag.error(
                FieldPath::new("plugins.html.template"),
                format!("`{}` not found", template.display()),
            );
        }
        for script in self.inline.iter() {
            if !root.join(script).is_file() {
                diag.error(
                    FieldPath::new("plugins.html.inline"),
                    format!("`{}` not found", script.display()),
                );
            }
        }
    }
}

// ============================================================================
// service worker
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceWorkerConfig {
    pub enable: bool,
    pub filename: String,
    pub cache_id: String,
}

impl Default for ServiceWorkerConfig {
    fn default() -> Self {
        Self {
            enable: false,
            filename: "service-worker.js".into(),
            cache_id: "kiln".into(),
        }
    }
}

// ============================================================================
// report
// ============================================================================

/// Bundle size report, kept out of the precache manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enable: bool,
    pub filename: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enable: false,
            filename: "report.html".into(),
        }
    }
}

// ============================================================================
// externals
// ============================================================================

/// Resources left out of the bundle in test mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalsConfig {
    /// Anything under `node_modules`.
    pub vendor: bool,
    /// Anything resolving outside the project root.
    pub outside_root: bool,
    pub names: Vec<String>,
    pub pattern: Option<Pattern>,
}

impl Default for ExternalsConfig {
    fn default() -> Self {
        Self {
            vendor: true,
            outside_root: false,
            names: Vec::new(),
            pattern: None,
        }
    }
}
