//! `kiln build`: run one pass and summarize it.

use anyhow::{Context, Result};
use std::time::Instant;

use crate::config::KilnConfig;
use crate::debug;
use crate::log;
use crate::pipeline::{BuildReport, Pipeline};
use crate::transform::TransformerRegistry;
use crate::utils::{format_size, plural_count, path::relative_to};

/// Build the project described by `config`.
pub fn build_project(config: &KilnConfig, registry: TransformerRegistry) -> Result<BuildReport> {
    let started = Instant::now();
    let pipeline = Pipeline::from_config(config, registry)?;
    debug!("build"; "{:?}", pipeline.hooks());

    log!("build"; "{} build", pipeline.mode());
    let report = pipeline
        .run()
        .with_context(|| format!("{} build failed", pipeline.mode()))?;

    print_summary(config, &report);
    log!("build"; "done in {:.2?}", started.elapsed());
    Ok(report)
}

fn print_summary(config: &KilnConfig, report: &BuildReport) {
    for named in &report.artifacts {
        debug!(
            "emit";
            "{} ({})",
            named.file_name,
            format_size(named.artifact.content().len())
        );
    }
    if report.passthrough > 0 {
        debug!("build"; "{} passed through unchanged", plural_count(report.passthrough, "module"));
    }
    if !report.externals.is_empty() {
        log!("build"; "{} left external", plural_count(report.externals.len(), "module"));
    }

    log!(
        "build";
        "{} ({}), {} precached -> {}",
        plural_count(report.artifacts.len(), "artifact"),
        format_size(report.total_size()),
        report.manifest.len(),
        relative_to(&report.output, config.get_root()).display()
    );
}
