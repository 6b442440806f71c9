//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [build], [define] and [plugins.*] definitions
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file lookup
//! └── mod.rs         # KilnConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section       | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | `[build]`     | Mode, output, entries, naming, manifest            |
//! | `[alias]`     | Logical prefix → directory                         |
//! | `[define]`    | Constants substituted into bundled code            |
//! | `[[rules]]`   | Ordered transformer dispatch rules                 |
//! | `[plugins.*]` | Entry document, service worker, report, externals  |

pub mod section;
pub mod types;
mod util;

pub use section::{
    BuildConfig, DEFAULT_MANIFEST_FILE, DefineValue, EntryConfig, ExternalsConfig, HtmlConfig,
    ManifestConfig, NamingConfig, PluginsConfig, ReportConfig, ServiceWorkerConfig,
    parse_cli_define,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::BuildArgs;
use crate::core::BuildMode;
use crate::log;
use crate::output::NamingPolicy;
use crate::pipeline::BuildError;
use crate::resolve::AliasTable;
use crate::rules::{Rule, RuleSet};
use crate::transform::TransformerRegistry;
use crate::utils::path::{clean_path, encloses, expand_path, normalize_path};
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `kiln.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfig {
    /// Absolute path to the config file.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: the config file's directory.
    #[serde(skip)]
    pub root: PathBuf,

    /// Constants from `--define`, applied after `[define]`.
    #[serde(skip)]
    pub cli_defines: Vec<(String, serde_json::Value)>,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub alias: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub define: BTreeMap<String, DefineValue>,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl KilnConfig {
    /// Locate and load the config, searching upward from the cwd.
    pub fn load(config_name: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let path = find_config_file(config_name, &cwd)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::from_path(&path)
    }

    /// Load from an explicit file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.finalize(path);
        Ok(config)
    }

    /// Parse TOML content, collecting unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Anchor every path at the project root.
    fn finalize(&mut self, config_path: &Path) {
        self.config_path = normalize_path(config_path);
        self.root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let root = self.root.clone();
        self.build.output = clean_path(&expand_path(&self.build.output, &root));
        for base in self.alias.values_mut() {
            *base = expand_path(base, &root);
        }
    }

    // ========================================================================
    // cli overrides
    // ========================================================================

    /// Apply `kiln build` arguments; CLI wins over the file.
    pub fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);

        Self::update_option(&mut self.build.mode, args.mode.as_ref());
        if let Some(output) = &args.output {
            self.build.output = clean_path(&expand_path(output, &self.root));
        }
        if args.clean {
            self.build.clean = true;
        } else if args.keep {
            self.build.clean = false;
        }
        self.cli_defines.clone_from(&args.define);
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    pub const fn mode(&self) -> BuildMode {
        self.build.mode
    }

    pub fn output_dir(&self) -> &Path {
        &self.build.output
    }

    pub fn alias_table(&self) -> Result<AliasTable, BuildError> {
        AliasTable::new(self.alias.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone())
    }

    pub fn naming(&self, mode: BuildMode) -> NamingPolicy {
        NamingPolicy::for_mode(&self.build.naming, mode)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate everything at once; transformer names are checked against
    /// `registry`.
    pub fn validate(&self, registry: &TransformerRegistry) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&mut diag);
        self.plugins.validate(&self.root, &mut diag);
        self.validate_aliases(&mut diag);
        self.validate_rules(registry, &mut diag);

        if encloses(&self.build.output, &self.root) {
            diag.error_with_hint(
                FieldPath::new("build.output"),
                format!(
                    "`{}` contains the project root and would be replaced by the build",
                    self.build.output.display()
                ),
                "use a subdirectory such as `public`",
            );
        }

        diag.print_warnings();
        Ok(diag.into_result()?)
    }

    fn validate_aliases(&self, diag: &mut ConfigDiagnostics) {
        if let Err(err) = self.alias_table() {
            diag.error(FieldPath::new("alias"), err.to_string());
        }
    }

    fn validate_rules(&self, registry: &TransformerRegistry, diag: &mut ConfigDiagnostics) {
        let chains = self.rules.iter().enumerate().flat_map(|(i, rule)| {
            rule.chain
                .iter()
                .chain(rule.one_of.iter().flat_map(|sub| sub.chain.iter()))
                .map(move |stage| (i, stage))
        });

        for (i, stage) in chains {
            if !registry.contains(stage.name()) {
                diag.error_with_hint(
                    FieldPath::new("rules"),
                    format!("rule #{}: unknown transformer `{}`", i + 1, stage.name()),
                    format!("registered: {}", registry.names().join(", ")),
                );
            }
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with a minimal `bundle` entry.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> KilnConfig {
    let config = format!("[[build.entries]]\nname = \"bundle\"\nimport = [\"@/app.js\"]\n{extra}");
    let (parsed, ignored) = KilnConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiln.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_invalid_toml() {
        assert!(KilnConfig::parse_with_ignored("[build\nmode = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let (config, ignored) =
            KilnConfig::parse_with_ignored("[build]\nminify = true\n[serve]\nport = 1").unwrap();
        assert_eq!(config.build.mode, BuildMode::Production);
        assert!(ignored.iter().any(|f| f.contains("minify")));
        assert!(ignored.iter().any(|f| f.contains("serve")));
    }

    #[test]
    fn test_rules_section() {
        let config = test_parse_config(
            r#"
[[rules]]
test = '\.js$'
exclude = 'node_modules'
use = ["define", { name = "minify", modes = ["production"] }]
"#,
        );
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rule_set().rules()[0].chain[1].name(), "minify");
    }

    #[test]
    fn test_paths_anchored_at_root() {
        let (dir, path) = write_project(
            r#"
[build]
output = "dist"

[alias]
"@" = "resources/js"
"#,
        );
        let config = KilnConfig::from_path(&path).unwrap();
        let root = normalize_path(dir.path());

        assert_eq!(config.get_root(), root);
        assert_eq!(config.output_dir(), root.join("dist"));
        let table = config.alias_table().unwrap();
        assert_eq!(
            table.resolve("@/app.js", Path::new("/")).unwrap(),
            root.join("resources/js/app.js")
        );
    }

    #[test]
    fn test_cli_overrides() {
        let (_dir, path) = write_project("[build]\nmode = \"development\"\n");
        let mut config = KilnConfig::from_path(&path).unwrap();
        let args = BuildArgs {
            mode: Some(BuildMode::Test),
            output: Some("out".into()),
            clean: false,
            keep: true,
            define: vec![("DEBUG".into(), serde_json::json!(true))],
            verbose: false,
        };
        config.apply_build_args(&args);

        assert_eq!(config.mode(), BuildMode::Test);
        assert!(!config.build.clean);
        assert!(config.output_dir().ends_with("out"));
        assert_eq!(config.cli_defines.len(), 1);
    }

    #[test]
    fn test_validate_reports_unknown_transformers() {
        let mut config = test_parse_config(
            r#"
[[rules]]
test = '\.scss$'
use = ["sass"]
  [[rules.one_of]]
  context = "raw"
  use = ["raw"]
"#,
        );
        config.root = PathBuf::from("/project");
        config.build.output = PathBuf::from("/project/public");

        let err = config.validate(&TransformerRegistry::with_builtins()).unwrap_err();
        let err = err.downcast::<ConfigError>().unwrap();
        let ConfigError::Invalid(diag) = err else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.len(), 1);
        assert!(diag.errors().next().unwrap().message.contains("`sass`"));
    }

    #[test]
    fn test_validate_overlapping_aliases() {
        let mut config = test_parse_config("[alias]\n\"@\" = \"/a\"\n\"@/lib\" = \"/b\"\n");
        config.root = PathBuf::from("/project");
        config.build.output = PathBuf::from("/project/public");
        assert!(config.validate(&TransformerRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_validate_rejects_output_enclosing_root() {
        let registry = TransformerRegistry::with_builtins();
        let mut config = test_parse_config("");
        config.root = PathBuf::from("/project");

        for output in ["/project", "/project/..", "/", "/project/public/../.."] {
            config.build.output = clean_path(Path::new(output));
            let err = config.validate(&registry).unwrap_err();
            let Ok(ConfigError::Invalid(diag)) = err.downcast::<ConfigError>() else {
                panic!("expected diagnostics for {output}");
            };
            assert!(
                diag.errors()
                    .any(|d| d.field.as_str() == "build.output"
                        && d.message.contains("project root")),
                "{output}"
            );
        }

        config.build.output = PathBuf::from("/project/public");
        assert!(config.validate(&registry).is_ok());
    }

    #[test]
    fn test_relative_output_is_normalized() {
        let (_dir, path) = write_project("[build]\noutput = \"public/../..\"\n");
        let config = KilnConfig::from_path(&path).unwrap();
        assert!(!config.build.output.components().any(|c| c == std::path::Component::ParentDir));
        assert!(config.root.starts_with(&config.build.output));
        assert!(config.validate(&TransformerRegistry::with_builtins()).is_err());
    }
}
