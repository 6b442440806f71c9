//! Module collection, parallel transformation and per-entry aggregation.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::BuildError;
use crate::config::EntryConfig;
use crate::core::{AssetKind, BuildMode, Defines, ResourceRequest};
use crate::debug;
use crate::logger::ProgressLine;
use crate::output::Artifact;
use crate::plugin::Externals;
use crate::resolve::AliasTable;
use crate::rules::RuleSet;
use crate::transform::{self, TransformContext, TransformerRegistry};

/// One resource scheduled for transformation.
#[derive(Debug, Clone)]
pub struct Module {
    pub request: ResourceRequest,
    pub path: PathBuf,
    /// Index of the owning entry; `None` for standalone assets.
    pub entry: Option<usize>,
    /// Logical name when emitted on its own.
    pub name: String,
}

/// Resources to build, in declaration order.
#[derive(Debug, Default)]
pub struct Plan {
    pub modules: Vec<Module>,
    /// Requests left out by the externals predicate.
    pub externals: Vec<String>,
}

/// Resolve every entry import and standalone asset.
///
/// Entry points resolve relative to the project root. Externals are only
/// consulted when the mode allows them.
pub fn plan(
    entries: &[EntryConfig],
    assets: &[String],
    aliases: &AliasTable,
    externals: &Externals,
    root: &Path,
    mode: BuildMode,
) -> Result<Plan, BuildError> {
    let mut plan = Plan::default();
    let specs = entries
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| entry.import.iter().map(move |spec| (Some(i), spec)))
        .chain(assets.iter().map(|spec| (None, spec)));

    for (entry, spec) in specs {
        let request = ResourceRequest::parse(spec, mode);
        let path = aliases.resolve(request.identifier(), root)?;

        if mode.allows_externals() && externals.matches(request.identifier(), &path, root) {
            debug!("externals"; "skipping {}", request);
            plan.externals.push(request.to_string());
            continue;
        }
        let name = logical_name(&path, aliases.base_for(request.identifier()), root);
        plan.modules.push(Module {
            request,
            path,
            entry,
            name,
        });
    }
    Ok(plan)
}

/// Name of a standalone resource: its path below the alias base, else below
/// the project root, else its file name.
fn logical_name(path: &Path, base: Option<&Path>, root: &Path) -> String {
    let rel = base
        .and_then(|base| path.strip_prefix(base).ok())
        .or_else(|| path.strip_prefix(root).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Read-only state shared by transformation workers.
pub struct Env<'a> {
    pub root: &'a Path,
    pub rules: &'a RuleSet,
    pub registry: &'a TransformerRegistry,
    pub defines: &'a Defines,
    pub cancel: fn() -> bool,
}

/// A transformed module.
#[derive(Debug)]
pub struct Loaded {
    pub kind: AssetKind,
    pub content: Vec<u8>,
    /// No rule matched; content is the source as read.
    pub passthrough: bool,
}

/// Transform all modules in parallel.
///
/// Results keep declaration order; when several modules fail, the first
/// failure in that order is returned.
pub fn transform_all(
    modules: &[Module],
    env: &Env<'_>,
    progress: Option<&ProgressLine>,
) -> Result<Vec<Loaded>, BuildError> {
    let results: Vec<Result<Loaded, BuildError>> = modules
        .par_iter()
        .map(|module| {
            let result = load(module, env);
            if let Some(p) = progress {
                p.inc();
            }
            result
        })
        .collect();

    results.into_iter().collect()
}

fn load(module: &Module, env: &Env<'_>) -> Result<Loaded, BuildError> {
    if (env.cancel)() {
        return Err(BuildError::Cancelled);
    }

    let request = &module.request;
    let subject = module.path.to_string_lossy();
    let selection = env
        .rules
        .select_for(&subject, request.context(), request.mode());
    if selection.is_passthrough() {
        debug!("rules"; "no rule for {}, passing through", request);
    }

    let raw = fs::read(&module.path).map_err(|source| BuildError::ReadSource {
        path: module.path.clone(),
        source,
    })?;

    let cx = TransformContext {
        request,
        path: &module.path,
        root: env.root,
        defines: env.defines,
    };
    let content = transform::apply(&selection.chain, raw, env.registry, &cx)?;

    Ok(Loaded {
        kind: selection
            .kind
            .unwrap_or_else(|| AssetKind::from_path(&module.path)),
        content,
        passthrough: selection.is_passthrough(),
    })
}

/// Build artifacts from transformed modules.
///
/// Per entry, scripts are concatenated into `<entry>.js` and stylesheets
/// into `<entry>.css`, in import order. Everything else is emitted on its
/// own under its logical name, after the entry bundles.
pub fn aggregate(entries: &[EntryConfig], modules: &[Module], loaded: Vec<Loaded>) -> Vec<Artifact> {
    let mut bundles: Vec<[Vec<u8>; 2]> = vec![[Vec::new(), Vec::new()]; entries.len()];
    let mut has_kind: Vec<[bool; 2]> = vec![[false; 2]; entries.len()];
    let mut standalone = Vec::new();

    for (module, loaded) in modules.iter().zip(loaded) {
        let slot = match loaded.kind {
            AssetKind::Script => Some(0),
            AssetKind::Stylesheet => Some(1),
            _ => None,
        };
        match (module.entry, slot) {
            (Some(entry), Some(slot)) => {
                let bundle = &mut bundles[entry][slot];
                bundle.extend_from_slice(&loaded.content);
                if !bundle.is_empty() && !bundle.ends_with(b"\n") {
                    bundle.push(b'\n');
                }
                has_kind[entry][slot] = true;
            }
            _ => {
                standalone.push(
                    Artifact::new(module.name.as_str(), loaded.content).with_kind(loaded.kind),
                );
            }
        }
    }

    let mut artifacts = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        for (slot, kind) in [AssetKind::Script, AssetKind::Stylesheet].into_iter().enumerate() {
            if !has_kind[i][slot] {
                continue;
            }
            let ext = kind.bundle_extension().unwrap_or_default();
            let content = std::mem::take(&mut bundles[i][slot]);
            artifacts.push(
                Artifact::new(format!("{}.{ext}", entry.name), content)
                    .with_kind(kind)
                    .entry(),
            );
        }
    }
    artifacts.extend(standalone);
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Externals;
    use crate::rules::Rule;
    use crate::transform::{Options, TransformError};
    use tempfile::TempDir;

    fn entry(name: &str, import: &[&str]) -> EntryConfig {
        EntryConfig {
            name: name.into(),
            import: import.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn never() -> bool {
        false
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let js = dir.path().join("resources/js");
        fs::create_dir_all(&js).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/vue")).unwrap();
        fs::write(js.join("app.js"), "app()").unwrap();
        fs::write(js.join("util.js"), "util()\n").unwrap();
        fs::write(js.join("app.css"), "body{}").unwrap();
        fs::write(js.join("logo.png"), [0x89, 0x50]).unwrap();
        fs::write(js.join("broken.js"), "x").unwrap();
        fs::write(dir.path().join("node_modules/vue/index.js"), "vue()").unwrap();
        dir
    }

    fn aliases(root: &Path) -> AliasTable {
        AliasTable::new([("@", root.join("resources/js"))]).unwrap()
    }

    fn shout(input: Vec<u8>, _: &Options, _: &TransformContext<'_>) -> Result<Vec<u8>, TransformError> {
        Ok(input.to_ascii_uppercase())
    }

    fn fail(_: Vec<u8>, _: &Options, _: &TransformContext<'_>) -> Result<Vec<u8>, TransformError> {
        Err(TransformError::Failed("boom".into()))
    }

    fn rules() -> RuleSet {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            rules: Vec<Rule>,
        }
        let w: Wrapper = toml::from_str(
            r#"
[[rules]]
test = 'broken\.js$'
use = ["fail"]

[[rules]]
test = '\.js$'
exclude = 'node_modules'
use = ["shout"]
"#,
        )
        .unwrap();
        RuleSet::new(w.rules)
    }

    fn run(dir: &Path, modules: &[Module]) -> Result<Vec<Loaded>, BuildError> {
        let mut registry = TransformerRegistry::new();
        registry.register("shout", shout);
        registry.register("fail", fail);
        let rules = rules();
        let defines = Defines::new();
        let env = Env {
            root: dir,
            rules: &rules,
            registry: &registry,
            defines: &defines,
            cancel: never,
        };
        transform_all(modules, &env, None)
    }

    #[test]
    fn test_plan_resolves_and_skips_externals() {
        let dir = project();
        let entries = [entry("bundle", &["@/app.js", "./node_modules/vue/index.js"])];
        let mut externals = Externals::default();
        externals.set_vendor(true);

        let prod = plan(&entries, &[], &aliases(dir.path()), &externals, dir.path(), BuildMode::Production).unwrap();
        assert_eq!(prod.modules.len(), 2);
        assert!(prod.externals.is_empty());

        let test = plan(&entries, &[], &aliases(dir.path()), &externals, dir.path(), BuildMode::Test).unwrap();
        assert_eq!(test.modules.len(), 1);
        assert_eq!(test.modules[0].path, dir.path().join("resources/js/app.js"));
        assert_eq!(test.externals, ["./node_modules/vue/index.js"]);
    }

    #[test]
    fn test_plan_unresolved_alias() {
        let dir = project();
        let entries = [entry("bundle", &["@lib/app.js"])];
        let err = plan(&entries, &[], &aliases(dir.path()), &Externals::default(), dir.path(), BuildMode::Production)
            .unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedAlias { ref prefix, .. } if prefix == "@lib"));
    }

    #[test]
    fn test_transform_and_aggregate() {
        let dir = project();
        let entries = [entry("bundle", &["@/app.js", "@/util.js", "@/app.css", "./node_modules/vue/index.js"])];
        let assets = ["@/logo.png".to_string()];
        let plan = plan(&entries, &assets, &aliases(dir.path()), &Externals::default(), dir.path(), BuildMode::Development)
            .unwrap();

        let loaded = run(dir.path(), &plan.modules).unwrap();
        assert!(!loaded[0].passthrough);
        assert!(loaded[2].passthrough);
        // excluded by the resolved path, so passed through untouched
        assert!(loaded[3].passthrough);

        let artifacts = aggregate(&entries, &plan.modules, loaded);
        let names: Vec<_> = artifacts.iter().map(Artifact::logical_name).collect();
        assert_eq!(names, ["bundle.js", "bundle.css", "logo.png"]);

        assert_eq!(artifacts[0].content(), b"APP()\nUTIL()\nvue()\n");
        assert!(artifacts[0].is_entry());
        assert_eq!(artifacts[1].content(), b"body{}\n");
        assert_eq!(artifacts[2].kind(), AssetKind::Image);
        assert!(!artifacts[2].is_entry());
    }

    #[test]
    fn test_same_file_names_stay_distinct() {
        let dir = project();
        let js = dir.path().join("resources/js");
        for sub in ["img/a", "img/b"] {
            fs::create_dir_all(js.join(sub)).unwrap();
            fs::write(js.join(sub).join("logo.png"), sub).unwrap();
        }
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/logo.png"), "root").unwrap();

        let assets = ["@/img/a/logo.png", "@/img/b/logo.png", "./static/logo.png", "@/logo.png"]
            .map(String::from);
        let plan = plan(&[], &assets, &aliases(dir.path()), &Externals::default(), dir.path(), BuildMode::Production)
            .unwrap();
        let names: Vec<_> = plan.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["img/a/logo.png", "img/b/logo.png", "static/logo.png", "logo.png"]);

        let loaded = run(dir.path(), &plan.modules).unwrap();
        let artifacts = aggregate(&[], &plan.modules, loaded);
        assert_eq!(artifacts[0].content(), b"img/a");
        assert_eq!(artifacts[1].logical_name(), "img/b/logo.png");
    }

    #[test]
    fn test_logical_name_outside_root() {
        let name = logical_name(Path::new("/shared/x.js"), None, Path::new("/project"));
        assert_eq!(name, "x.js");
    }

    #[test]
    fn test_first_failure_in_declaration_order() {
        let dir = project();
        let entries = [entry("bundle", &["@/app.js", "@/broken.js", "@/missing.js"])];
        let plan = plan(&entries, &[], &aliases(dir.path()), &Externals::default(), dir.path(), BuildMode::Production)
            .unwrap();

        let err = run(dir.path(), &plan.modules).unwrap_err();
        match err {
            BuildError::Transform { resource, stage, .. } => {
                assert_eq!(resource, "@/broken.js");
                assert_eq!(stage, "fail");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_source() {
        let dir = project();
        let entries = [entry("bundle", &["@/missing.js"])];
        let plan = plan(&entries, &[], &aliases(dir.path()), &Externals::default(), dir.path(), BuildMode::Production)
            .unwrap();
        assert!(matches!(run(dir.path(), &plan.modules), Err(BuildError::ReadSource { .. })));
    }
}
