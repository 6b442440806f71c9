//! Resource requests: what to load and in which import context.

use super::BuildMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// How a resource is being imported.
///
/// Used as the discriminant for `one_of` sub-rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportContext {
    /// Imported directly as a module (the default).
    #[default]
    Module,
    /// Imported from a template context (e.g. a component's template block).
    Template,
    /// Imported as raw content.
    Raw,
}

impl ImportContext {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Template => "template",
            Self::Raw => "raw",
        }
    }

    fn from_query(query: &str) -> Option<Self> {
        match query {
            "" | "module" => Some(Self::Module),
            "template" => Some(Self::Template),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

impl fmt::Display for ImportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to load one resource.
///
/// Identity is `identifier + context`; the mode is carried along but does not
/// distinguish requests.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    identifier: String,
    context: ImportContext,
    mode: BuildMode,
}

impl ResourceRequest {
    pub fn new(identifier: impl Into<String>, context: ImportContext, mode: BuildMode) -> Self {
        Self {
            identifier: identifier.into(),
            context,
            mode,
        }
    }

    /// Parse the textual form `path?context`.
    ///
    /// An unknown query is kept as part of the identifier.
    pub fn parse(spec: &str, mode: BuildMode) -> Self {
        if let Some((path, query)) = spec.rsplit_once('?')
            && let Some(context) = ImportContext::from_query(query)
        {
            return Self::new(path, context, mode);
        }
        Self::new(spec, ImportContext::Module, mode)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub const fn context(&self) -> ImportContext {
        self.context
    }

    pub const fn mode(&self) -> BuildMode {
        self.mode
    }
}

impl PartialEq for ResourceRequest {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.context == other.context
    }
}

impl Eq for ResourceRequest {}

impl Hash for ResourceRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
        self.context.hash(state);
    }
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            ImportContext::Module => f.write_str(&self.identifier),
            ctx => write!(f, "{}?{}", self.identifier, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_parse_context_query() {
        let req = ResourceRequest::parse("views/list.pug?template", BuildMode::Production);
        assert_eq!(req.identifier(), "views/list.pug");
        assert_eq!(req.context(), ImportContext::Template);

        let req = ResourceRequest::parse("@/app.js", BuildMode::Production);
        assert_eq!(req.identifier(), "@/app.js");
        assert_eq!(req.context(), ImportContext::Module);
    }

    #[test]
    fn test_parse_unknown_query_stays_in_identifier() {
        let req = ResourceRequest::parse("font.woff?v=3", BuildMode::Development);
        assert_eq!(req.identifier(), "font.woff?v=3");
        assert_eq!(req.context(), ImportContext::Module);
    }

    #[test]
    fn test_identity_ignores_mode() {
        let a = ResourceRequest::new("a.js", ImportContext::Raw, BuildMode::Production);
        let b = ResourceRequest::new("a.js", ImportContext::Raw, BuildMode::Development);
        let c = ResourceRequest::new("a.js", ImportContext::Module, BuildMode::Production);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: FxHashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display_round_trips_context() {
        let req = ResourceRequest::new("x.pug", ImportContext::Template, BuildMode::Test);
        assert_eq!(req.to_string(), "x.pug?template");
        assert_eq!(ResourceRequest::parse(&req.to_string(), BuildMode::Test), req);
    }
}
