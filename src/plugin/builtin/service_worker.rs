//! `service-worker`: offline caching driven by the precache manifest.
//!
//! The worker keeps its logical name in every mode and stays out of the
//! manifest itself. It embeds a revision over the precached artifacts known
//! when it is emitted, so browsers see a changed worker whenever the cached
//! set changes.

use std::sync::Arc;

use crate::config::ServiceWorkerConfig;
use crate::core::AssetKind;
use crate::log;
use crate::output::{Artifact, ContentHash};
use crate::plugin::{Hook, HookContext, Hooks, Plugin};

const WORKER_TEMPLATE: &str = r#"const CACHE_ID = __CACHE_ID__;
const REVISION = "__REVISION__";
const MANIFEST_URL = __MANIFEST__;
const CACHE_NAME = CACHE_ID + "-" + REVISION;

self.addEventListener("install", (event) => {
  event.waitUntil(
    fetch(MANIFEST_URL, { cache: "no-store" })
      .then((response) => response.json())
      .then((entries) => caches.open(CACHE_NAME).then((cache) => cache.addAll(entries.map((entry) => entry.path))))
      .then(() => self.skipWaiting())
  );
});

self.addEventListener("activate", (event) => {
  event.waitUntil(
    caches.keys()
      .then((names) => Promise.all(
        names
          .filter((name) => name.startsWith(CACHE_ID + "-") && name !== CACHE_NAME)
          .map((name) => caches.delete(name))
      ))
      .then(() => self.clients.claim())
  );
});

self.addEventListener("fetch", (event) => {
  if (event.request.method !== "GET") {
    return;
  }
  event.respondWith(
    caches.open(CACHE_NAME)
      .then((cache) => cache.match(event.request))
      .then((cached) => cached || fetch(event.request))
  );
});
"#;

pub struct ServiceWorkerPlugin {
    config: ServiceWorkerConfig,
}

impl ServiceWorkerPlugin {
    pub fn new(config: ServiceWorkerConfig) -> Self {
        Self { config }
    }

    /// Digest over `(final name, content hash)` of every precached artifact.
    fn revision(cx: &HookContext) -> ContentHash {
        let mut listing = String::new();
        for owned in cx.artifacts().iter() {
            let artifact = &owned.artifact;
            if artifact.is_precached() {
                listing.push_str(&cx.final_name(artifact));
                listing.push(' ');
                listing.push_str(&artifact.content_hash().to_hex());
                listing.push('\n');
            }
        }
        ContentHash::of(listing.as_bytes())
    }

    fn render(&self, cx: &HookContext) -> String {
        WORKER_TEMPLATE
            .replace("__REVISION__", &Self::revision(cx).short(16))
            .replace("__MANIFEST__", &js_string(&cx.url_for(cx.manifest_file())))
            .replace("__CACHE_ID__", &js_string(&self.config.cache_id))
    }
}

/// Quoted and escaped string literal, valid in JavaScript.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

impl Plugin for ServiceWorkerPlugin {
    fn name(&self) -> &str {
        "service-worker"
    }

    fn register(self: Arc<Self>, hooks: &mut Hooks) {
        let this = Arc::clone(&self);
        hooks.tap(Hook::Emit, self.name(), move |cx| {
            let worker = this.render(cx);
            cx.emit(
                Artifact::new(this.config.filename.as_str(), worker)
                    .with_kind(AssetKind::Script)
                    .pinned()
                    .without_precache(),
            )
        });

        hooks.tap(Hook::Done, self.name(), |cx| {
            if let Some(named) = cx.named() {
                log!("sw"; "precaching {} files", named.manifest.len());
            }
            Ok(())
        });
    }
}
