//! Build-scoped state shared by plugins during one pass.

use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::Hook;
use crate::core::{BuildMode, Defines};
use crate::output::{Artifact, NamedOutput, NamingPolicy};
use crate::rules::Pattern;

// ============================================================================
// ArtifactSet
// ============================================================================

/// An artifact together with the plugin that added it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedArtifact {
    pub owner: String,
    pub artifact: Artifact,
}

/// Append-only artifact collection.
///
/// Nothing can be removed; logical names are unique. Frozen entering `done`.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    items: Vec<OwnedArtifact>,
    frozen: bool,
}

impl ArtifactSet {
    fn push(&mut self, owner: &str, artifact: Artifact) -> Result<()> {
        if self.frozen {
            bail!("cannot add `{}`: artifacts are frozen", artifact.logical_name());
        }
        if let Some(existing) = self.get(artifact.logical_name()) {
            bail!(
                "`{}` was already emitted by `{}`",
                artifact.logical_name(),
                existing.owner
            );
        }
        self.items.push(OwnedArtifact {
            owner: owner.to_string(),
            artifact,
        });
        Ok(())
    }

    pub fn get(&self, logical_name: &str) -> Option<&OwnedArtifact> {
        self.items
            .iter()
            .find(|owned| owned.artifact.logical_name() == logical_name)
    }

    /// Artifacts in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &OwnedArtifact> {
        self.items.iter()
    }

    /// Entry bundles, in emission order.
    pub fn entries(&self) -> impl Iterator<Item = &Artifact> {
        self.items
            .iter()
            .map(|owned| &owned.artifact)
            .filter(|artifact| artifact.is_entry())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn freeze(&mut self) -> Vec<Artifact> {
        self.frozen = true;
        self.items.iter().map(|owned| owned.artifact.clone()).collect()
    }
}

// ============================================================================
// Externals
// ============================================================================

/// Predicate selecting resources left out of the bundle (test mode).
#[derive(Debug, Clone, Default)]
pub struct Externals {
    vendor: bool,
    outside_root: bool,
    names: Vec<String>,
    patterns: Vec<Pattern>,
}

impl Externals {
    /// Treat anything under a `node_modules` directory as external.
    pub fn set_vendor(&mut self, on: bool) -> &mut Self {
        self.vendor = on;
        self
    }

    /// Treat anything resolving outside the project root as external.
    pub fn set_outside_root(&mut self, on: bool) -> &mut Self {
        self.outside_root = on;
        self
    }

    /// Exclude an identifier verbatim.
    pub fn add_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.push(name.into());
        self
    }

    /// Exclude identifiers matching a pattern.
    pub fn add_pattern(&mut self, pattern: Pattern) -> &mut Self {
        self.patterns.push(pattern);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Keep only the names `keep` accepts.
    pub fn retain_names(&mut self, mut keep: impl FnMut(&str) -> bool) -> &mut Self {
        self.names.retain(|name| keep(name));
        self
    }

    /// Keep only the patterns `keep` accepts.
    pub fn retain_patterns(&mut self, keep: impl FnMut(&Pattern) -> bool) -> &mut Self {
        self.patterns.retain(keep);
        self
    }

    /// Stop excluding `name`; returns whether it was listed.
    pub fn remove_name(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Replace the name list.
    pub fn replace_names<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Exclude nothing.
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.vendor && !self.outside_root && self.names.is_empty() && self.patterns.is_empty()
    }

    /// Whether a resource stays out of the bundle.
    pub fn matches(&self, identifier: &str, path: &Path, root: &Path) -> bool {
        if self.names.iter().any(|name| name == identifier) {
            return true;
        }
        if self.patterns.iter().any(|p| p.is_match(identifier)) {
            return true;
        }
        if self.vendor
            && path
                .components()
                .any(|c| matches!(c, Component::Normal(s) if s == "node_modules"))
        {
            return true;
        }
        self.outside_root && !path.starts_with(root)
    }
}

// ============================================================================
// HookContext
// ============================================================================

#[derive(Debug)]
enum DefineState {
    Open(Defines),
    Frozen(Arc<Defines>),
}

/// Shared state for one pass.
///
/// Constants and externals are editable only up to and during `start`.
/// Artifacts can be added until the set is frozen for naming.
#[derive(Debug)]
pub struct HookContext {
    mode: BuildMode,
    root: PathBuf,
    naming: NamingPolicy,
    public_path: String,
    manifest_file: String,
    defines: DefineState,
    externals: Externals,
    artifacts: ArtifactSet,
    named: Option<NamedOutput>,
    hook: Option<Hook>,
    owner: String,
}

impl HookContext {
    pub fn new(mode: BuildMode, root: &Path, naming: NamingPolicy) -> Self {
        Self {
            mode,
            root: root.to_path_buf(),
            naming,
            public_path: String::new(),
            manifest_file: crate::config::DEFAULT_MANIFEST_FILE.to_string(),
            defines: DefineState::Open(Defines::new()),
            externals: Externals::default(),
            artifacts: ArtifactSet::default(),
            named: None,
            hook: None,
            owner: String::new(),
        }
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }

    pub fn with_manifest_file(mut self, file: impl Into<String>) -> Self {
        self.manifest_file = file.into();
        self
    }

    pub const fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Output-relative path of the precache manifest.
    pub fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    /// Public URL of an output file.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.public_path)
    }

    /// Hook currently running, if any.
    pub const fn hook(&self) -> Option<Hook> {
        self.hook
    }

    // ------------------------------------------------------------------------
    // constants
    // ------------------------------------------------------------------------

    pub fn defines(&self) -> &Defines {
        match &self.defines {
            DefineState::Open(defines) => defines,
            DefineState::Frozen(defines) => defines,
        }
    }

    /// Mutable constants; only before and during `start`.
    pub fn defines_mut(&mut self) -> Result<&mut Defines> {
        self.ensure_setup("defined constants")?;
        match &mut self.defines {
            DefineState::Open(defines) => Ok(defines),
            DefineState::Frozen(_) => bail!("defined constants are frozen"),
        }
    }

    /// Freeze constants for the rest of the pass and share them.
    pub fn freeze_defines(&mut self) -> Arc<Defines> {
        let frozen = match &mut self.defines {
            DefineState::Frozen(defines) => return Arc::clone(defines),
            DefineState::Open(defines) => Arc::new(std::mem::take(defines)),
        };
        self.defines = DefineState::Frozen(Arc::clone(&frozen));
        frozen
    }

    // ------------------------------------------------------------------------
    // externals
    // ------------------------------------------------------------------------

    pub fn externals(&self) -> &Externals {
        &self.externals
    }

    /// Mutable externals; only before and during `start`.
    pub fn externals_mut(&mut self) -> Result<&mut Externals> {
        self.ensure_setup("externals")?;
        Ok(&mut self.externals)
    }

    // ------------------------------------------------------------------------
    // artifacts
    // ------------------------------------------------------------------------

    /// Add an artifact owned by the running plugin.
    pub fn emit(&mut self, artifact: Artifact) -> Result<()> {
        self.artifacts.push(&self.owner, artifact)
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Final output name an artifact will get.
    pub fn final_name(&self, artifact: &Artifact) -> String {
        self.naming.final_name(artifact)
    }

    /// Named output, available during `done`.
    pub fn named(&self) -> Option<&NamedOutput> {
        self.named.as_ref()
    }

    // ------------------------------------------------------------------------
    // pass control
    // ------------------------------------------------------------------------

    pub(crate) fn enter(&mut self, hook: Hook) {
        if hook > Hook::Start {
            self.freeze_defines();
        }
        if hook == Hook::Done {
            self.artifacts.frozen = true;
        }
        self.hook = Some(hook);
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        owner.clone_into(&mut self.owner);
    }

    /// Freeze the artifact set and take a snapshot for naming.
    pub(crate) fn freeze_artifacts(&mut self) -> Vec<Artifact> {
        self.artifacts.freeze()
    }

    pub(crate) fn set_named(&mut self, named: NamedOutput) {
        self.named = Some(named);
    }

    pub(crate) fn into_named(self) -> Option<NamedOutput> {
        self.named
    }

    fn ensure_setup(&self, what: &str) -> Result<()> {
        match self.hook {
            None | Some(Hook::Start) => Ok(()),
            Some(hook) => bail!("{what} can only change during `start`, not `{hook}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> HookContext {
        HookContext::new(
            BuildMode::Test,
            Path::new("/project"),
            NamingPolicy::new("[name].[ext]", 8),
        )
    }

    #[test]
    fn test_defines_editable_only_during_start() {
        let mut cx = context();
        cx.enter(Hook::Start);
        cx.defines_mut().unwrap().insert("DEBUG", "true");

        cx.enter(Hook::BeforeEmit);
        let err = cx.defines_mut().unwrap_err();
        assert!(err.to_string().contains("beforeEmit"));
        assert_eq!(cx.defines().get("DEBUG"), Some("true"));
    }

    #[test]
    fn test_frozen_defines_are_shared() {
        let mut cx = context();
        cx.defines_mut().unwrap().insert("A", "1");
        let first = cx.freeze_defines();
        let second = cx.freeze_defines();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cx.defines_mut().is_err());
    }

    #[test]
    fn test_artifacts_are_append_only() {
        let mut cx = context();
        cx.set_owner("html");
        cx.emit(Artifact::new("index.html", "<html/>")).unwrap();

        cx.set_owner("other");
        let err = cx.emit(Artifact::new("index.html", "<p/>")).unwrap_err();
        assert!(err.to_string().contains("already emitted by `html`"));

        let snapshot = cx.freeze_artifacts();
        assert_eq!(snapshot.len(), 1);
        assert!(cx.emit(Artifact::new("late.js", "x")).is_err());
    }

    #[test]
    fn test_done_freezes_artifacts() {
        let mut cx = context();
        cx.enter(Hook::Done);
        assert!(cx.artifacts().is_frozen());
        assert!(cx.emit(Artifact::new("late.css", "a{}")).is_err());
    }

    #[test]
    fn test_externals_predicate() {
        let mut externals = Externals::default();
        assert!(externals.is_empty());
        externals
            .set_vendor(true)
            .add_name("jquery")
            .add_pattern(Pattern::new("^lodash/").unwrap());

        let root = Path::new("/project");
        assert!(externals.matches("vue", Path::new("/project/node_modules/vue/index.js"), root));
        assert!(externals.matches("jquery", Path::new("/project/jquery"), root));
        assert!(externals.matches("lodash/map", Path::new("/project/lodash/map"), root));
        assert!(!externals.matches("@/app.js", Path::new("/project/src/app.js"), root));

        externals.set_outside_root(true);
        assert!(externals.matches("../shared/x.js", Path::new("/shared/x.js"), root));
    }

    #[test]
    fn test_externals_editing() {
        let mut externals = Externals::default();
        externals
            .add_name("jquery")
            .add_name("lodash")
            .add_pattern(Pattern::new("^@scope/").unwrap());

        assert!(externals.remove_name("jquery"));
        assert!(!externals.remove_name("jquery"));
        assert_eq!(externals.names(), ["lodash"]);

        externals.replace_names(["vue", "axios"]).retain_names(|n| n != "axios");
        assert_eq!(externals.names(), ["vue"]);

        externals.retain_patterns(|p| p.as_str() != "^@scope/");
        assert!(externals.patterns().is_empty());

        externals.set_vendor(true).clear();
        assert!(externals.is_empty());
    }

    #[test]
    fn test_url_for_uses_public_path() {
        let cx = context().with_public_path("/static/");
        assert_eq!(cx.url_for("app.js"), "/static/app.js");
    }
}
