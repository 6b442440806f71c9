//! `report`: static bundle size report.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::ReportConfig;
use crate::core::AssetKind;
use crate::log;
use crate::output::Artifact;
use crate::plugin::{Hook, HookContext, Hooks, Plugin};
use crate::utils::format_size;

pub struct ReportPlugin {
    config: ReportConfig,
}

impl ReportPlugin {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    fn render(cx: &HookContext) -> String {
        let mut rows = String::new();
        let mut total = 0;
        for owned in cx.artifacts().iter() {
            let artifact = &owned.artifact;
            let size = artifact.content().len();
            total += size;
            let _ = writeln!(
                rows,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td data-bytes=\"{size}\">{}</td><td>{}</td></tr>",
                cx.final_name(artifact),
                artifact.logical_name(),
                artifact.kind().as_str(),
                owned.owner,
                format_size(size),
                if artifact.is_precached() { "yes" } else { "no" },
            );
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Bundle report ({mode})</title>\n</head>\n<body>\n\
             <h1>Bundle report</h1>\n<p>{count} artifacts, {total} ({mode})</p>\n<table>\n\
             <tr><th>File</th><th>Source</th><th>Kind</th><th>Owner</th><th>Size</th><th>Precached</th></tr>\n\
             {rows}</table>\n</body>\n</html>\n",
            mode = cx.mode(),
            count = cx.artifacts().len(),
            total = format_size(total),
        )
    }
}

impl Plugin for ReportPlugin {
    fn name(&self) -> &str {
        "report"
    }

    fn register(self: Arc<Self>, hooks: &mut Hooks) {
        let this = Arc::clone(&self);
        hooks.tap(Hook::Emit, self.name(), move |cx| {
            let report = Self::render(cx);
            cx.emit(
                Artifact::new(this.config.filename.as_str(), report)
                    .with_kind(AssetKind::Markup)
                    .pinned()
                    .without_precache(),
            )
        });

        let this = Arc::clone(&self);
        hooks.tap(Hook::Done, self.name(), move |_| {
            log!("report"; "bundle report at {}", this.config.filename);
            Ok(())
        });
    }
}
