//! Plugin hook lifecycle.
//!
//! Plugins are independent units that tap named lifecycle hooks. A pass
//! runs the hooks in a fixed order, each one a strict barrier:
//!
//! ```text
//! start → (transform + aggregate) → beforeEmit → emit → (freeze, naming) → done
//! ```
//!
//! Callbacks for one hook run in plugin registration order. Every callback
//! sees the same `HookContext`, the only cross-plugin mutable state.

pub mod builtin;
mod context;

pub use context::{ArtifactSet, Externals, HookContext, OwnedArtifact};

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::debug;
use crate::pipeline::BuildError;

// ============================================================================
// Hook
// ============================================================================

/// Lifecycle hooks, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    /// Before any resource is read. Constants and externals are editable.
    Start,
    /// Modules are aggregated; artifacts may be added.
    BeforeEmit,
    /// Last chance to add artifacts.
    Emit,
    /// Artifacts are frozen and named; output is staged, not committed.
    Done,
}

impl Hook {
    pub const ALL: [Self; 4] = [Self::Start, Self::BeforeEmit, Self::Emit, Self::Done];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::BeforeEmit => "beforeEmit",
            Self::Emit => "emit",
            Self::Done => "done",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// A build plugin.
///
/// `register` is called once, in plugin order, before the pass starts.
pub trait Plugin: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn register(self: Arc<Self>, hooks: &mut Hooks);
}

type Callback = Box<dyn Fn(&mut HookContext) -> Result<()> + Send + Sync>;

struct Tap {
    plugin: String,
    callback: Callback,
}

/// Registration table: hook → callbacks in registration order.
#[derive(Default)]
pub struct Hooks {
    table: [Vec<Tap>; 4],
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every plugin, in order.
    pub fn with_plugins(plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        let mut hooks = Self::new();
        for plugin in plugins {
            plugin.register(&mut hooks);
        }
        hooks
    }

    /// Add a callback for `hook` on behalf of `plugin`.
    pub fn tap<F>(&mut self, hook: Hook, plugin: &str, callback: F)
    where
        F: Fn(&mut HookContext) -> Result<()> + Send + Sync + 'static,
    {
        self.table[hook.index()].push(Tap {
            plugin: plugin.to_string(),
            callback: Box::new(callback),
        });
    }

    /// Plugins tapping `hook`, in call order.
    pub fn taps(&self, hook: Hook) -> impl Iterator<Item = &str> {
        self.table[hook.index()].iter().map(|tap| tap.plugin.as_str())
    }

    /// Run every callback for `hook`.
    ///
    /// The first failure aborts the hook; later callbacks do not run.
    pub fn call(&self, hook: Hook, cx: &mut HookContext) -> Result<(), BuildError> {
        cx.enter(hook);
        for tap in &self.table[hook.index()] {
            debug!("plugin"; "{} <- {}", hook, tap.plugin);
            cx.set_owner(&tap.plugin);
            (tap.callback)(cx).map_err(|source| BuildError::plugin(&tap.plugin, hook, source))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for hook in Hook::ALL {
            map.entry(&hook.as_str(), &self.taps(hook).collect::<Vec<_>>());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::output::{Artifact, NamingPolicy};
    use parking_lot::Mutex;
    use std::path::Path;

    fn context() -> HookContext {
        HookContext::new(
            BuildMode::Production,
            Path::new("/project"),
            NamingPolicy::new("[name].[hash].[ext]", 8),
        )
    }

    /// Records every `(plugin, hook)` call into a shared log.
    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn register(self: Arc<Self>, hooks: &mut Hooks) {
            for hook in Hook::ALL {
                let this = Arc::clone(&self);
                hooks.tap(hook, &self.name, move |_| {
                    this.log.lock().push(format!("{}:{}", this.name, hook));
                    Ok(())
                });
            }
        }
    }

    fn recorders(log: &Arc<Mutex<Vec<String>>>) -> Hooks {
        let plugins: Vec<Arc<dyn Plugin>> = ["a", "b"]
            .into_iter()
            .map(|name| {
                Arc::new(Recorder {
                    name: name.into(),
                    log: Arc::clone(log),
                }) as Arc<dyn Plugin>
            })
            .collect();
        Hooks::with_plugins(plugins)
    }

    #[test]
    fn test_hooks_are_strict_barriers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = recorders(&log);
        let mut cx = context();
        for hook in Hook::ALL {
            hooks.call(hook, &mut cx).unwrap();
        }

        assert_eq!(
            *log.lock(),
            [
                "a:start",
                "b:start",
                "a:beforeEmit",
                "b:beforeEmit",
                "a:emit",
                "b:emit",
                "a:done",
                "b:done"
            ]
        );
    }

    #[test]
    fn test_failure_names_plugin_and_hook() {
        let mut hooks = Hooks::new();
        hooks.tap(Hook::Emit, "broken", |_| anyhow::bail!("template missing"));
        hooks.tap(Hook::Emit, "after", |cx| cx.emit(Artifact::new("never.js", "x")));

        let mut cx = context();
        let err = hooks.call(Hook::Emit, &mut cx).unwrap_err();
        match err {
            BuildError::PluginHook { plugin, hook, source } => {
                assert_eq!(plugin, "broken");
                assert_eq!(hook, Hook::Emit);
                assert_eq!(source.to_string(), "template missing");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cx.artifacts().is_empty());
    }

    #[test]
    fn test_emitted_artifacts_record_owner() {
        let mut hooks = Hooks::new();
        hooks.tap(Hook::Emit, "report", |cx| cx.emit(Artifact::new("report.html", "<p/>")));

        let mut cx = context();
        hooks.call(Hook::Emit, &mut cx).unwrap();
        let owned = cx.artifacts().iter().next().unwrap();
        assert_eq!(owned.owner, "report");
        assert_eq!(owned.artifact.logical_name(), "report.html");
    }

    #[test]
    fn test_debug_lists_taps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = recorders(&log);
        let debug = format!("{hooks:?}");
        assert!(debug.contains(r#""beforeEmit": ["a", "b"]"#));
    }
}
