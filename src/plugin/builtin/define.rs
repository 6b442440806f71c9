//! `define`: fill the constant table during `start`.

use anyhow::Context;
use std::sync::Arc;

use crate::config::{DefineValue, KilnConfig};
use crate::plugin::{Hook, Hooks, Plugin};

/// Key always defined from the build mode.
pub const NODE_ENV: &str = "process.env.NODE_ENV";

/// Constants come from, in increasing precedence: the mode (`NODE_ENV`),
/// `[define]`, and `--define`.
pub struct DefinePlugin {
    values: Vec<(String, DefineValue)>,
    overrides: Vec<(String, serde_json::Value)>,
}

impl DefinePlugin {
    pub fn new(
        values: Vec<(String, DefineValue)>,
        overrides: Vec<(String, serde_json::Value)>,
    ) -> Self {
        Self { values, overrides }
    }

    pub fn from_config(config: &KilnConfig) -> Self {
        Self::new(
            config
                .define
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            config.cli_defines.clone(),
        )
    }
}

impl Plugin for DefinePlugin {
    fn name(&self) -> &str {
        "define"
    }

    fn register(self: Arc<Self>, hooks: &mut Hooks) {
        let this = Arc::clone(&self);
        hooks.tap(Hook::Start, self.name(), move |cx| {
            let mode = cx.mode();
            let root = cx.root().to_path_buf();

            let resolved = this
                .values
                .iter()
                .map(|(key, value)| {
                    value
                        .resolve(&root)
                        .with_context(|| format!("constant `{key}`"))
                        .map(|value| (key, value))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let defines = cx.defines_mut()?;
            defines.insert_json(NODE_ENV, &serde_json::Value::from(mode.as_str()));
            for (key, value) in resolved {
                defines.insert_json(key.as_str(), &value);
            }
            for (key, value) in &this.overrides {
                defines.insert_json(key.as_str(), value);
            }
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildMode;
    use crate::output::NamingPolicy;
    use crate::plugin::HookContext;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn run(plugin: DefinePlugin, root: &std::path::Path) -> anyhow::Result<HookContext> {
        let hooks = Hooks::with_plugins([Arc::new(plugin) as Arc<dyn Plugin>]);
        let mut cx = HookContext::new(BuildMode::Production, root, NamingPolicy::new("[name].[ext]", 8));
        hooks.call(Hook::Start, &mut cx)?;
        Ok(cx)
    }

    #[test]
    fn test_defines_from_all_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("conf.json"), r#"{"client_id": "abc123"}"#).unwrap();

        let plugin = DefinePlugin::new(
            vec![
                (
                    "process.env.CLIENT_ID".into(),
                    DefineValue::File {
                        file: "conf.json".into(),
                        pointer: Some("/client_id".into()),
                    },
                ),
                ("DEBUG".into(), DefineValue::Value(json!(true))),
            ],
            vec![("DEBUG".into(), json!(false))],
        );
        let cx = run(plugin, dir.path()).unwrap();

        let defines = cx.defines();
        assert_eq!(defines.get(NODE_ENV), Some("\"production\""));
        assert_eq!(defines.get("process.env.CLIENT_ID"), Some("\"abc123\""));
        assert_eq!(defines.get("DEBUG"), Some("false"));
    }

    #[test]
    fn test_unreadable_source_fails_start() {
        let dir = TempDir::new().unwrap();
        let plugin = DefinePlugin::new(
            vec![(
                "process.env.CLIENT_ID".into(),
                DefineValue::File {
                    file: "conf.json".into(),
                    pointer: None,
                },
            )],
            Vec::new(),
        );
        let err = run(plugin, dir.path()).unwrap_err();
        assert!(err.to_string().contains("plugin `define` failed in `start`"));
    }
}
