//! `command`: run content through an external process.
//!
//! ```toml
//! [[rules]]
//! test = '\.s[ac]ss$'
//! use = [{ name = "command", options = { command = ["sass", "--stdin", "--load-path=$KILN_ROOT/node_modules"] } }]
//! ```
//!
//! Content goes to stdin, stdout becomes the stage output. Arguments may use
//! `$KILN_FILE`, `$KILN_DIR`, `$KILN_ROOT` and `$KILN_MODE`.

use rustc_hash::FxHashMap;

use crate::transform::{Options, TransformContext, TransformError, Transformer};
use crate::utils::exec::Cmd;

/// Pipes content through an external command.
pub struct CommandTransformer;

impl Transformer for CommandTransformer {
    fn transform(
        &self,
        input: Vec<u8>,
        options: &Options,
        cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError> {
        let command = command_option(options)?;
        let vars = build_kiln_vars(cx);
        let resolved = resolve_args(&command, &vars);

        let program = &resolved[0];
        which::which_in(program, std::env::var_os("PATH"), cx.root)
            .map_err(|_| TransformError::Failed(format!("`{program}` not found")))?;

        let output = Cmd::from_slice(&resolved)
            .cwd(cx.root)
            .envs(&vars)
            .stdin(input)
            .run()?;
        Ok(output.stdout)
    }
}

fn command_option(options: &Options) -> Result<Vec<String>, TransformError> {
    let value = options
        .get("command")
        .ok_or_else(|| TransformError::invalid_option("command", "missing"))?;
    let command: Vec<String> = serde_json::from_value(value.clone())
        .map_err(|e| TransformError::invalid_option("command", e.to_string()))?;
    if command.is_empty() {
        return Err(TransformError::invalid_option("command", "must not be empty"));
    }
    Ok(command)
}

/// Build `$KILN_*` variables for one resource.
fn build_kiln_vars(cx: &TransformContext<'_>) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert("KILN_FILE".into(), cx.path.display().to_string());
    vars.insert(
        "KILN_DIR".into(),
        cx.path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    );
    vars.insert("KILN_ROOT".into(), cx.root.display().to_string());
    vars.insert("KILN_MODE".into(), cx.mode().to_string());
    vars
}

/// Replace `$KILN_XXX` occurrences in arguments.
///
/// Longer names are substituted first so `$KILN_DIR` never clobbers a
/// hypothetical `$KILN_DIRNAME`.
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    args.iter()
        .map(|arg| {
            keys.iter().fold(arg.clone(), |acc, key| {
                acc.replace(&format!("${key}"), &vars[key.as_str()])
            })
        })
        .collect()
}
