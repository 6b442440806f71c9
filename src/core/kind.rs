//! Asset kind definitions.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of build output.
///
/// Decides how module resources are aggregated per entry and which
/// artifacts are listed in the precache manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Stylesheet,
    Markup,
    Image,
    Font,
    Other,
}

impl AssetKind {
    /// Infer kind from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::from_extension(path.as_ref().extension().and_then(|e| e.to_str()))
    }

    pub fn from_extension(ext: Option<&str>) -> Self {
        let Some(ext) = ext else {
            return Self::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "vue" => Self::Script,
            "css" | "scss" | "sass" | "less" => Self::Stylesheet,
            "html" | "htm" | "hbs" | "pug" => Self::Markup,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" => Self::Image,
            "woff" | "woff2" | "eot" | "ttf" | "otf" => Self::Font,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Markup => "markup",
            Self::Image => "image",
            Self::Font => "font",
            Self::Other => "other",
        }
    }

    /// Kinds listed in the precache manifest.
    #[inline]
    pub const fn is_cache_eligible(self) -> bool {
        matches!(self, Self::Script | Self::Markup | Self::Stylesheet)
    }

    /// Extension of the aggregated per-entry output, for kinds that aggregate.
    pub const fn bundle_extension(self) -> Option<&'static str> {
        match self {
            Self::Script => Some("js"),
            Self::Stylesheet => Some("css"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(AssetKind::from_path("src/app.js"), AssetKind::Script);
        assert_eq!(AssetKind::from_path("sass/app.SCSS"), AssetKind::Stylesheet);
        assert_eq!(AssetKind::from_path("index.hbs"), AssetKind::Markup);
        assert_eq!(AssetKind::from_path("logo.png"), AssetKind::Image);
        assert_eq!(AssetKind::from_path("fa.woff2"), AssetKind::Font);
        assert_eq!(AssetKind::from_path("LICENSE"), AssetKind::Other);
    }

    #[test]
    fn test_cache_eligibility() {
        assert!(AssetKind::Script.is_cache_eligible());
        assert!(AssetKind::Stylesheet.is_cache_eligible());
        assert!(AssetKind::Markup.is_cache_eligible());
        assert!(!AssetKind::Image.is_cache_eligible());
        assert!(!AssetKind::Font.is_cache_eligible());
    }
}
