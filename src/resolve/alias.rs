//! Alias table and the pure `resolve` function.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::pipeline::BuildError;
use crate::utils::path::clean_path;

/// Leading characters that mark an identifier segment as an alias claim.
pub const ALIAS_SIGILS: &[char] = &['@', '#'];

/// Logical prefix → absolute base path.
///
/// Prefixes are unique and never overlap as path segments, so at most one
/// alias can match any identifier. Built once per pass, read-only after.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: BTreeMap<String, PathBuf>,
}

impl AliasTable {
    /// Build the table, rejecting empty and overlapping prefixes.
    pub fn new<I, K, P>(entries: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        let mut table = BTreeMap::new();
        for (prefix, base) in entries {
            let prefix = prefix.into().trim_end_matches('/').to_string();
            if prefix.is_empty() {
                return Err(BuildError::AliasConflict {
                    prefix,
                    other: String::new(),
                });
            }
            if let Some(other) = table.keys().find(|existing: &&String| overlaps(existing, &prefix)) {
                return Err(BuildError::AliasConflict {
                    prefix,
                    other: other.clone(),
                });
            }
            table.insert(prefix, clean_path(&base.into()));
        }
        Ok(Self { entries: table })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// Resolve an identifier to an absolute path.
    ///
    /// - registered alias prefix: substitute the base path
    /// - absolute identifier: used as-is
    /// - otherwise: relative to `from_dir`
    ///
    /// Fails only when the first segment claims an alias (starts with a
    /// sigil) that is not registered.
    pub fn resolve(&self, identifier: &str, from_dir: &Path) -> Result<PathBuf, BuildError> {
        if let Some((base, rest)) = self.match_prefix(identifier) {
            return Ok(clean_path(&base.join(rest)));
        }

        if identifier.starts_with('/') {
            return Ok(clean_path(Path::new(identifier)));
        }

        let first = identifier.split('/').next().unwrap_or_default();
        if first.starts_with(ALIAS_SIGILS) {
            return Err(BuildError::UnresolvedAlias {
                identifier: identifier.to_string(),
                prefix: first.to_string(),
            });
        }

        Ok(clean_path(&from_dir.join(identifier)))
    }

    /// Base path of the alias `identifier` starts with, if any.
    pub fn base_for(&self, identifier: &str) -> Option<&Path> {
        self.match_prefix(identifier).map(|(base, _)| base)
    }

    fn match_prefix<'a>(&self, identifier: &'a str) -> Option<(&Path, &'a str)> {
        self.entries.iter().find_map(|(prefix, base)| {
            let rest = identifier.strip_prefix(prefix.as_str())?;
            if rest.is_empty() {
                Some((base.as_path(), ""))
            } else {
                rest.strip_prefix('/').map(|rest| (base.as_path(), rest))
            }
        })
    }
}

/// Two prefixes overlap when one is a segment-prefix of the other.
fn overlaps(a: &str, b: &str) -> bool {
    let segment_prefix = |long: &str, short: &str| {
        long.strip_prefix(short)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    };
    segment_prefix(a, b) || segment_prefix(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new([("@", "/src"), ("fortawesomeDir", "/project/node_modules/@fortawesome")]).unwrap()
    }

    #[test]
    fn test_alias_substitution() {
        let resolved = table().resolve("@/app.js", Path::new("/project")).unwrap();
        assert_eq!(resolved, PathBuf::from("/src/app.js"));

        let resolved = table()
            .resolve("fortawesomeDir/css/all.css", Path::new("/project"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/project/node_modules/@fortawesome/css/all.css"));

        assert_eq!(table().base_for("@/img/logo.png"), Some(Path::new("/src")));
        assert_eq!(table().base_for("@x/logo.png"), None);
        assert_eq!(table().base_for("./logo.png"), None);
    }

    #[test]
    fn test_unregistered_alias_claim_fails() {
        let err = table().resolve("@x/app.js", Path::new("/project")).unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedAlias { ref identifier, ref prefix }
                if identifier == "@x/app.js" && prefix == "@x"
        ));
    }

    #[test]
    fn test_prefix_must_end_at_segment() {
        // "fortawesomeDirX" is not the "fortawesomeDir" alias and has no sigil
        let resolved = table().resolve("fortawesomeDirX/a.css", Path::new("/project")).unwrap();
        assert_eq!(resolved, PathBuf::from("/project/fortawesomeDirX/a.css"));
    }

    #[test]
    fn test_relative_to_from_dir() {
        let resolved = table()
            .resolve("./resources/sass/app.scss", Path::new("/project"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/project/resources/sass/app.scss"));

        let resolved = table().resolve("../shared/x.js", Path::new("/project/src")).unwrap();
        assert_eq!(resolved, PathBuf::from("/project/shared/x.js"));
    }

    #[test]
    fn test_absolute_identifier_passes_through() {
        let resolved = table().resolve("/abs/./a.js", Path::new("/project")).unwrap();
        assert_eq!(resolved, PathBuf::from("/abs/a.js"));
    }

    #[test]
    fn test_overlapping_prefixes_rejected() {
        let err = AliasTable::new([("@", "/a"), ("@/components", "/b")]).unwrap_err();
        assert!(matches!(err, BuildError::AliasConflict { .. }));

        // Sharing characters is fine as long as segments differ
        assert!(AliasTable::new([("@", "/a"), ("@ui", "/b")]).is_ok());
    }
}
