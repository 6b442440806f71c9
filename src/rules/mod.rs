//! Rule matching: resource identifier → ordered transformer chain.
//!
//! Rules are a plain ordered list of predicate + payload pairs. The first
//! rule whose `test` matches wins; there is no specificity scoring, so the
//! declaration order in `kiln.toml` is the whole story.
//!
//! ```toml
//! [[rules]]
//! test = '\.pug$'
//!   [[rules.one_of]]
//!   context = "template"
//!   use = ["pug"]
//!   [[rules.one_of]]
//!   use = ["raw", "pug"]
//! ```

mod pattern;

pub use pattern::Pattern;

use serde::{Deserialize, Serialize};

use crate::core::{AssetKind, BuildMode, ImportContext, ResourceRequest};
use crate::transform::TransformerRef;

/// A top-level rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Predicate over the resource identifier.
    pub test: Pattern,

    /// Identifiers matching this are skipped by the rule.
    #[serde(default)]
    pub exclude: Option<Pattern>,

    /// Chain applied when no sub-rule matches (or none are declared).
    #[serde(default, rename = "use")]
    pub chain: Vec<TransformerRef>,

    /// Conditional sub-rules keyed on the import context.
    #[serde(default)]
    pub one_of: Vec<SubRule>,

    /// Override the inferred asset kind of the output.
    #[serde(default)]
    pub kind: Option<AssetKind>,
}

/// A sub-rule selected by import context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubRule {
    /// Context this sub-rule applies to; `None` matches any context.
    #[serde(default)]
    pub context: Option<ImportContext>,

    #[serde(default, rename = "use")]
    pub chain: Vec<TransformerRef>,

    #[serde(default)]
    pub kind: Option<AssetKind>,
}

impl Rule {
    fn matches(&self, identifier: &str) -> bool {
        self.test.is_match(identifier)
            && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(identifier))
    }

    /// Pick the chain for a context: first matching sub-rule, else own chain.
    fn branch(&self, context: ImportContext) -> (&[TransformerRef], Option<AssetKind>) {
        self.one_of
            .iter()
            .find(|sub| sub.context.is_none_or(|c| c == context))
            .map_or((self.chain.as_slice(), self.kind), |sub| {
                (sub.chain.as_slice(), sub.kind.or(self.kind))
            })
    }
}

/// Outcome of chain selection for one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Index of the winning rule, `None` for pass-through.
    pub rule: Option<usize>,
    /// Stages active in the requested mode, in execution order.
    pub chain: Vec<TransformerRef>,
    /// Kind override from the winning (sub-)rule.
    pub kind: Option<AssetKind>,
}

impl Selection {
    /// No rule matched: identity transform.
    pub const fn is_passthrough(&self) -> bool {
        self.rule.is_none()
    }
}

/// Ordered, read-only rule list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Select the chain for `identifier` in `context` under `mode`.
    ///
    /// Mode-conditional stages are filtered here, once per resource.
    /// No matching rule yields an empty chain.
    pub fn select_chain(
        &self,
        identifier: &str,
        context: ImportContext,
        mode: BuildMode,
    ) -> Vec<TransformerRef> {
        self.select_for(identifier, context, mode).chain
    }

    /// Like `select_chain`, for a request.
    pub fn select(&self, request: &ResourceRequest) -> Selection {
        self.select_for(request.identifier(), request.context(), request.mode())
    }

    /// Full selection with `subject` as the string rules are tested against.
    ///
    /// The pipeline passes the resolved path, so `exclude = 'node_modules'`
    /// also catches aliased identifiers.
    pub fn select_for(&self, subject: &str, context: ImportContext, mode: BuildMode) -> Selection {
        let Some((index, rule)) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(subject))
        else {
            return Selection {
                rule: None,
                chain: Vec::new(),
                kind: None,
            };
        };

        let (chain, kind) = rule.branch(context);
        Selection {
            rule: Some(index),
            chain: chain
                .iter()
                .filter(|stage| stage.is_active(mode))
                .cloned()
                .collect(),
            kind,
        }
    }
}
