//! Built-in plugins.
//!
//! | Plugin           | Hook    | Effect                                      |
//! |------------------|---------|---------------------------------------------|
//! | `define`         | start   | constants from config, CLI and mode         |
//! | `externals`      | start   | exclusion predicate (test mode)             |
//! | `html`           | emit    | entry document referencing final names      |
//! | `service-worker` | emit    | pinned worker reading the precache manifest |
//! | `report`         | emit    | bundle size report (not precached)          |

mod define;
mod externals;
mod html;
mod report;
mod service_worker;

pub use define::DefinePlugin;
pub use externals::ExternalsPlugin;
pub use html::HtmlPlugin;
pub use report::ReportPlugin;
pub use service_worker::ServiceWorkerPlugin;

use std::sync::Arc;

use super::Plugin;
use crate::config::KilnConfig;

/// Built-in plugins enabled by `config`, in registration order.
///
/// The service worker comes after every plugin emitting precached
/// artifacts, the report last so it sees everything.
pub fn from_config(config: &KilnConfig) -> Vec<Arc<dyn Plugin>> {
    let mut plugins: Vec<Arc<dyn Plugin>> = vec![
        Arc::new(DefinePlugin::from_config(config)),
        Arc::new(ExternalsPlugin::new(config.plugins.externals.clone())),
    ];
    if config.plugins.html.enable {
        plugins.push(Arc::new(HtmlPlugin::new(config.plugins.html.clone())));
    }
    if config.plugins.service_worker.enable {
        plugins.push(Arc::new(ServiceWorkerPlugin::new(
            config.plugins.service_worker.clone(),
        )));
    }
    if config.plugins.report.enable {
        plugins.push(Arc::new(ReportPlugin::new(config.plugins.report.clone())));
    }
    plugins
}
