//! Configuration section definitions.

mod build;
mod define;
mod plugins;

pub use build::{BuildConfig, DEFAULT_MANIFEST_FILE, EntryConfig, ManifestConfig, NamingConfig};
pub use define::{DefineValue, parse_cli_define};
pub use plugins::{
    ExternalsConfig, HtmlConfig, InlineScripts, PluginsConfig, ReportConfig, ServiceWorkerConfig,
};
