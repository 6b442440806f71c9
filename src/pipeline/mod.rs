//! Build pass orchestration.
//!
//! Pass order:
//! - **start** - plugins set constants and externals
//! - **plan** - resolve entry imports and assets, drop externals
//! - **transform** - parallel rule dispatch and chain execution
//! - **aggregate** - per-entry bundles and standalone artifacts
//! - **beforeEmit**, **emit** - plugins inspect and add artifacts
//! - **name** - freeze, content-addressed names, precache manifest
//! - **stage** - write everything into a staging directory
//! - **done** - plugins see the final names
//! - **commit** - swap the stage into the output directory
//!
//! Cancellation is checked between phases. A failed or cancelled pass
//! leaves the output directory untouched.

mod error;
mod modules;

pub use error::BuildError;
pub use modules::{Module, Plan};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{EntryConfig, KilnConfig};
use crate::core::{BuildMode, is_shutdown};
use crate::debug;
use crate::logger::ProgressLine;
use crate::output::{NamedArtifact, NamingPolicy, PrecacheManifest, StagingDir, name_and_emit};
use crate::plugin::{Hook, HookContext, Hooks, Plugin, builtin};
use crate::resolve::AliasTable;
use crate::rules::RuleSet;
use crate::transform::TransformerRegistry;
use crate::utils::path::{clean_path, encloses};

/// Owner recorded for artifacts produced by module aggregation.
pub const MODULES_OWNER: &str = "modules";

/// What a successful pass produced.
#[derive(Debug)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub output: PathBuf,
    /// Named artifacts in emission order.
    pub artifacts: Vec<NamedArtifact>,
    pub manifest: PrecacheManifest,
    /// Modules no rule matched.
    pub passthrough: usize,
    /// Requests left out as externals.
    pub externals: Vec<String>,
}

impl BuildReport {
    pub fn total_size(&self) -> usize {
        self.artifacts.iter().map(|n| n.artifact.content().len()).sum()
    }
}

/// One configured build, runnable any number of times.
pub struct Pipeline {
    root: PathBuf,
    mode: BuildMode,
    aliases: AliasTable,
    rules: RuleSet,
    registry: TransformerRegistry,
    entries: Vec<EntryConfig>,
    assets: Vec<String>,
    naming: NamingPolicy,
    output: PathBuf,
    clean: bool,
    public_path: String,
    manifest_file: String,
    hooks: Hooks,
    cancel: fn() -> bool,
    quiet: bool,
}

impl Pipeline {
    /// Pipeline with the built-in plugins enabled by `config`.
    pub fn from_config(config: &KilnConfig, registry: TransformerRegistry) -> Result<Self, BuildError> {
        Self::with_plugins(config, registry, builtin::from_config(config))
    }

    /// Pipeline with an explicit plugin list, registered in order.
    pub fn with_plugins(
        config: &KilnConfig,
        registry: TransformerRegistry,
        plugins: impl IntoIterator<Item = Arc<dyn Plugin>>,
    ) -> Result<Self, BuildError> {
        let mode = config.mode();
        let output = clean_path(config.output_dir());
        if encloses(&output, config.get_root()) {
            return Err(BuildError::UnsafeOutput { output });
        }
        Ok(Self {
            root: config.get_root().to_path_buf(),
            mode,
            aliases: config.alias_table()?,
            rules: config.rule_set(),
            registry,
            entries: config.build.entries.clone(),
            assets: config.build.assets.clone(),
            naming: config.naming(mode),
            output,
            clean: config.build.clean,
            public_path: config.build.public_path.clone(),
            manifest_file: config.build.manifest.filename.clone(),
            hooks: Hooks::with_plugins(plugins),
            cancel: is_shutdown,
            quiet: false,
        })
    }

    /// Replace the cancellation check (Ctrl+C by default).
    pub fn cancel_on(mut self, cancel: fn() -> bool) -> Self {
        self.cancel = cancel;
        self
    }

    /// Suppress the progress line.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub const fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Run one pass.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let mut cx = HookContext::new(self.mode, &self.root, self.naming.clone())
            .with_public_path(self.public_path.as_str())
            .with_manifest_file(self.manifest_file.as_str());

        // start
        self.hooks.call(Hook::Start, &mut cx)?;
        let defines = cx.freeze_defines();
        self.check_cancelled()?;

        // plan + transform
        let plan = modules::plan(
            &self.entries,
            &self.assets,
            &self.aliases,
            cx.externals(),
            &self.root,
            self.mode,
        )?;
        debug!(
            "pipeline";
            "{} modules, {} externals",
            plan.modules.len(),
            plan.externals.len()
        );

        let env = modules::Env {
            root: &self.root,
            rules: &self.rules,
            registry: &self.registry,
            defines: &defines,
            cancel: self.cancel,
        };
        let progress = (!self.quiet && !plan.modules.is_empty())
            .then(|| ProgressLine::new("modules", plan.modules.len()));
        let loaded = modules::transform_all(&plan.modules, &env, progress.as_ref())?;
        if let Some(p) = progress {
            p.finish();
        }
        let passthrough = loaded.iter().filter(|l| l.passthrough).count();
        self.check_cancelled()?;

        // aggregate
        cx.set_owner(MODULES_OWNER);
        for artifact in modules::aggregate(&self.entries, &plan.modules, loaded) {
            cx.emit(artifact)?;
        }

        self.hooks.call(Hook::BeforeEmit, &mut cx)?;
        self.hooks.call(Hook::Emit, &mut cx)?;
        self.check_cancelled()?;

        // name
        let artifacts = cx.freeze_artifacts();
        let named = name_and_emit(&artifacts, cx.naming(), &self.public_path)?;
        if let Some(clash) = named
            .artifacts
            .iter()
            .find(|n| n.file_name == self.manifest_file)
        {
            return Err(BuildError::OutputConflict {
                file_name: clash.file_name.clone(),
            });
        }
        let manifest_json = named.manifest.to_json().map_err(anyhow::Error::from)?;

        // stage
        let stage = StagingDir::create(&self.output)?;
        if !self.clean {
            let carried = stage.carry_over()?;
            debug!("pipeline"; "carried over {} files", carried);
        }
        for n in &named.artifacts {
            stage.write(&n.file_name, n.artifact.content())?;
        }
        stage.write(&self.manifest_file, manifest_json.as_bytes())?;

        cx.set_named(named);
        self.hooks.call(Hook::Done, &mut cx)?;
        self.check_cancelled()?;

        stage.commit()?;

        let named = cx
            .into_named()
            .ok_or_else(|| anyhow::anyhow!("named output missing after `done`"))?;
        Ok(BuildReport {
            mode: self.mode,
            output: self.output.clone(),
            artifacts: named.artifacts,
            manifest: named.manifest,
            passthrough,
            externals: plan.externals,
        })
    }

    fn check_cancelled(&self) -> Result<(), BuildError> {
        if (self.cancel)() {
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }
}
