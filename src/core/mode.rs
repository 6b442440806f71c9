//! Build mode threaded through every pipeline component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build mode for a single pass.
///
/// Passed explicitly to the rule matcher (stage selection), the naming
/// policy and the plugins. Never read from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Fast iteration: stable file names, no hash in names.
    Development,
    /// Deployable output: content hash embedded in file names.
    #[default]
    Production,
    /// Test/server bundle: third-party modules may be left external.
    Test,
}

impl BuildMode {
    pub const ALL: [Self; 3] = [Self::Development, Self::Production, Self::Test];

    /// Check if this is production mode.
    #[inline]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether emitted file names carry the content hash.
    #[inline]
    pub const fn hashes_names(self) -> bool {
        self.is_production()
    }

    /// Whether external-dependency exclusion applies.
    #[inline]
    pub const fn allows_externals(self) -> bool {
        matches!(self, Self::Test)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown build mode `{other}`")),
        }
    }
}
