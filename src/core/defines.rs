//! Build-wide defined constants injected into bundled code as literals.

use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Constant name → JavaScript literal source.
///
/// Built during the `start` hook, then frozen behind an `Arc` for the
/// rest of the pass.
#[derive(Debug, Default)]
pub struct Defines {
    values: BTreeMap<String, String>,
    matcher: OnceLock<Option<Regex>>,
}

impl Clone for Defines {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            matcher: OnceLock::new(),
        }
    }
}

impl PartialEq for Defines {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `key` as raw literal source (e.g. `"\"abc\""` or `true`).
    pub fn insert(&mut self, key: impl Into<String>, literal: impl Into<String>) {
        self.values.insert(key.into(), literal.into());
        self.matcher = OnceLock::new();
    }

    /// Define `key` as the JSON encoding of `value`.
    pub fn insert_json(&mut self, key: impl Into<String>, value: &serde_json::Value) {
        self.insert(key, value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every whole-token occurrence of a defined key with its literal.
    ///
    /// `process.env.CLIENT_ID` is replaced, `my_process.env.CLIENT_ID` and
    /// `process.env.CLIENT_IDS` are not. Longer keys win over their prefixes.
    pub fn substitute<'a>(&self, source: &'a str) -> Cow<'a, str> {
        let Some(re) = self.matcher.get_or_init(|| self.build_matcher()) else {
            return Cow::Borrowed(source);
        };

        let mut out = String::with_capacity(source.len());
        let mut last = 0;
        let mut changed = false;
        for caps in re.captures_iter(source) {
            let key = caps.get(2).expect("group 2 always participates");
            let followed_by_ident = source[key.end()..].chars().next().is_some_and(is_ident_char);
            if followed_by_ident {
                continue;
            }
            out.push_str(&source[last..key.start()]);
            out.push_str(&self.values[key.as_str()]);
            last = key.end();
            changed = true;
        }

        if !changed {
            return Cow::Borrowed(source);
        }
        out.push_str(&source[last..]);
        Cow::Owned(out)
    }

    fn build_matcher(&self) -> Option<Regex> {
        if self.values.is_empty() {
            return None;
        }
        let mut keys: Vec<_> = self.values.keys().map(|k| regex::escape(k)).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = format!(r"(^|[^A-Za-z0-9_$.])({})", keys.join("|"));
        Regex::new(&pattern).ok()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defines() -> Defines {
        let mut d = Defines::new();
        d.insert_json("process.env.CLIENT_ID", &serde_json::json!("abc123"));
        d.insert_json("process.env.NODE_ENV", &serde_json::json!("production"));
        d.insert("DEBUG", "false");
        d
    }

    #[test]
    fn test_substitute_whole_tokens() {
        let src = "const id = process.env.CLIENT_ID; if (DEBUG) log(process.env.NODE_ENV);";
        assert_eq!(
            defines().substitute(src),
            r#"const id = "abc123"; if (false) log("production");"#
        );
    }

    #[test]
    fn test_substitute_skips_partial_tokens() {
        let src = "x.DEBUG; DEBUGGER; my_process.env.CLIENT_ID; process.env.CLIENT_IDS";
        assert!(matches!(defines().substitute(src), Cow::Borrowed(_)));
    }

    #[test]
    fn test_adjacent_tokens() {
        assert_eq!(defines().substitute("DEBUG+DEBUG"), "false+false");
    }

    #[test]
    fn test_empty_defines_is_identity() {
        assert!(matches!(Defines::new().substitute("DEBUG"), Cow::Borrowed("DEBUG")));
    }

    #[test]
    fn test_insert_resets_matcher() {
        let mut d = defines();
        assert_eq!(d.substitute("VERSION"), "VERSION");
        d.insert("VERSION", "\"1.0\"");
        assert_eq!(d.substitute("VERSION"), "\"1.0\"");
    }
}
