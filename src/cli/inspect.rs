//! `kiln inspect`: resolution and chain selection for one identifier.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::KilnConfig;
use crate::core::{AssetKind, BuildMode, ResourceRequest};
use crate::log;
use crate::rules::Selection;
use crate::utils::path::relative_to;

/// Print the resolved path and the chain selected in every mode.
pub fn inspect(config: &KilnConfig, spec: &str) -> Result<()> {
    let aliases = config.alias_table()?;
    let rules = config.rule_set();

    let request = ResourceRequest::parse(spec, config.mode());
    let path = aliases.resolve(request.identifier(), config.get_root())?;
    let subject = path.to_string_lossy();

    log!("inspect"; "{}", request);
    println!("  path:    {}", relative_to(&path, config.get_root()).display());
    println!("  context: {}", request.context());
    if !path.exists() {
        println!("  {}", "(file does not exist)".yellow());
    }

    for mode in BuildMode::ALL {
        let selection = rules.select_for(&subject, request.context(), mode);
        let kind = selection.kind.unwrap_or_else(|| AssetKind::from_path(&path));
        println!(
            "  {:<12} {} [{}]",
            mode.as_str(),
            describe(&selection),
            kind.as_str()
        );
    }
    Ok(())
}

fn describe(selection: &Selection) -> String {
    match selection.rule {
        None => "pass-through".dimmed().to_string(),
        Some(index) if selection.chain.is_empty() => {
            format!("rule #{}: (no active stages)", index + 1)
        }
        Some(index) => {
            let stages: Vec<_> = selection.chain.iter().map(|s| s.name()).collect();
            format!("rule #{}: {}", index + 1, stages.join(" -> "))
        }
    }
}
