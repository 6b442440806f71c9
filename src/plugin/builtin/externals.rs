//! `externals`: install the exclusion predicate for test builds.

use std::sync::Arc;

use crate::config::ExternalsConfig;
use crate::plugin::{Hook, Hooks, Plugin};

pub struct ExternalsPlugin {
    config: ExternalsConfig,
}

impl ExternalsPlugin {
    pub fn new(config: ExternalsConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ExternalsPlugin {
    fn name(&self) -> &str {
        "externals"
    }

    fn register(self: Arc<Self>, hooks: &mut Hooks) {
        let this = Arc::clone(&self);
        hooks.tap(Hook::Start, self.name(), move |cx| {
            if !cx.mode().allows_externals() {
                return Ok(());
            }
            let config = &this.config;
            let externals = cx.externals_mut()?;
            externals
                .set_vendor(config.vendor)
                .set_outside_root(config.outside_root);
            for name in &config.names {
                externals.add_name(name.as_str());
            }
            if let Some(pattern) = &config.pattern {
                externals.add_pattern(pattern.clone());
            }
            Ok(())
        });
    }
}
