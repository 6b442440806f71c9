//! Name → transformer lookup table.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::{Transformer, builtin};

/// Registered transformers, shared read-only across worker threads.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: FxHashMap<String, Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `raw`, `define`, `minify` and `command`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtin::RAW, builtin::RawTransformer);
        registry.register(builtin::DEFINE, builtin::DefineTransformer);
        registry.register(builtin::MINIFY, builtin::MinifyTransformer);
        registry.register(builtin::COMMAND, builtin::CommandTransformer);
        registry
    }

    /// Register (or replace) a transformer under `name`.
    pub fn register(&mut self, name: impl Into<String>, transformer: impl Transformer + 'static) {
        self.transformers.insert(name.into(), Arc::new(transformer));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transformer>> {
        self.transformers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.transformers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("names", &self.names())
            .finish()
    }
}
