//! `html`: the entry document.
//!
//! Rendered during `emit` from an optional template. Placeholders:
//!
//! | Placeholder           | Replaced with                              |
//! |-----------------------|--------------------------------------------|
//! | `{{ title }}`         | `plugins.html.title`, escaped              |
//! | `{{ styles }}`        | `<link>` tags for entry stylesheets        |
//! | `{{ scripts }}`       | `<script>` tags for entry scripts          |
//! | `{{ inline_script }}` | the inline script configured for the mode  |
//!
//! Missing `styles` go before `</head>`, missing `scripts` and
//! `inline_script` before `</body>`.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::sync::{Arc, OnceLock};

use crate::config::HtmlConfig;
use crate::core::AssetKind;
use crate::output::Artifact;
use crate::plugin::{Hook, HookContext, Hooks, Plugin};
use crate::transform::builtin::minify_js;

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
</head>
<body>
<div id="app"></div>
</body>
</html>
"#;

pub struct HtmlPlugin {
    config: HtmlConfig,
}

impl HtmlPlugin {
    pub fn new(config: HtmlConfig) -> Self {
        Self { config }
    }

    fn render(&self, cx: &HookContext) -> Result<String> {
        let template = match &self.config.template {
            Some(path) => {
                let path = cx.root().join(path);
                fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template `{}`", path.display()))?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let mut styles = String::new();
        let mut scripts = String::new();
        for artifact in cx.artifacts().entries() {
            let url = cx.url_for(&cx.final_name(artifact));
            match artifact.kind() {
                AssetKind::Stylesheet => {
                    styles.push_str(&format!("<link rel=\"stylesheet\" href=\"{url}\">\n"));
                }
                AssetKind::Script => {
                    scripts.push_str(&format!("<script src=\"{url}\"></script>\n"));
                }
                _ => {}
            }
        }

        let inline = match self.config.inline.for_mode(cx.mode()) {
            Some(path) => {
                let path = cx.root().join(path);
                let source = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read inline script `{}`", path.display()))?;
                let source = if cx.mode().is_production() {
                    minify_js(&source).map_err(anyhow::Error::msg)?
                } else {
                    source
                };
                format!("<script>{}</script>\n", source.trim())
            }
            None => String::new(),
        };

        Ok(fill(&template, &escape(&self.config.title), &styles, &scripts, &inline))
    }
}

impl Plugin for HtmlPlugin {
    fn name(&self) -> &str {
        "html"
    }

    fn register(self: Arc<Self>, hooks: &mut Hooks) {
        let this = Arc::clone(&self);
        hooks.tap(Hook::Emit, self.name(), move |cx| {
            let html = this.render(cx)?;
            cx.emit(
                Artifact::new(this.config.filename.as_str(), html)
                    .with_kind(AssetKind::Markup)
                    .pinned(),
            )
        });
    }
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*(title|styles|scripts|inline_script)\s*\}\}")
            .expect("placeholder regex is valid")
    })
}

/// Substitute placeholders, injecting the tag groups the template omits.
fn fill(template: &str, title: &str, styles: &str, scripts: &str, inline: &str) -> String {
    let has = |name: &str| {
        placeholder()
            .captures_iter(template)
            .any(|caps| &caps[1] == name)
    };
    let (has_styles, has_scripts, has_inline) = (has("styles"), has("scripts"), has("inline_script"));

    let mut html = placeholder()
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "title" => title.to_string(),
            "styles" => styles.to_string(),
            "scripts" => scripts.to_string(),
            _ => inline.to_string(),
        })
        .into_owned();

    if !has_styles {
        html = insert_before(&html, "</head>", styles);
    }
    let mut tail = String::new();
    if !has_scripts {
        tail.push_str(scripts);
    }
    if !has_inline {
        tail.push_str(inline);
    }
    insert_before(&html, "</body>", &tail)
}

/// Insert `fragment` before the last `tag`, or append when there is none.
fn insert_before(html: &str, tag: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        return html.to_string();
    }
    match html.rfind(tag) {
        Some(at) => format!("{}{fragment}{}", &html[..at], &html[at..]),
        None => format!("{html}{fragment}"),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
