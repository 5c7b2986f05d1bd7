//! Domain types shared by every siteforge crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AssetClass
// ---------------------------------------------------------------------------

/// The folder-based classification of a source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Styles,
    Scripts,
    Images,
    Fonts,
    Templates,
}

impl AssetClass {
    /// All classes in a stable order.
    pub fn all() -> &'static [AssetClass] {
        &[
            AssetClass::Styles,
            AssetClass::Scripts,
            AssetClass::Images,
            AssetClass::Fonts,
            AssetClass::Templates,
        ]
    }

    /// Sub-folder of the build tree that holds this class's outputs.
    ///
    /// Templates render to the build root, so their folder is empty.
    pub fn build_folder(&self) -> &'static str {
        match self {
            AssetClass::Styles => "css",
            AssetClass::Scripts => "js",
            AssetClass::Images => "images",
            AssetClass::Fonts => "fonts",
            AssetClass::Templates => "",
        }
    }

    /// Sub-folder of the assets tree that holds this class's sources.
    pub fn source_folder(&self) -> &'static str {
        // Same layout on both sides, except templates which live in the src root.
        self.build_folder()
    }

    /// File extension the reference rewriter scans for this class, if any.
    pub fn rewrite_extension(&self) -> Option<&'static str> {
        match self {
            AssetClass::Styles => Some("css"),
            AssetClass::Scripts => Some("js"),
            AssetClass::Templates => Some("html"),
            AssetClass::Images | AssetClass::Fonts => None,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Styles => write!(f, "styles"),
            AssetClass::Scripts => write!(f, "scripts"),
            AssetClass::Images => write!(f, "images"),
            AssetClass::Fonts => write!(f, "fonts"),
            AssetClass::Templates => write!(f, "html"),
        }
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "styles" | "css" => Ok(AssetClass::Styles),
            "scripts" | "js" => Ok(AssetClass::Scripts),
            "images" => Ok(AssetClass::Images),
            "fonts" => Ok(AssetClass::Fonts),
            "html" | "templates" => Ok(AssetClass::Templates),
            other => Err(format!(
                "unknown asset class '{other}'; expected: styles, scripts, images, fonts, html"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for class in AssetClass::all() {
            let parsed: AssetClass = class.to_string().parse().expect("parse");
            assert_eq!(parsed, *class);
        }
    }

    #[test]
    fn templates_render_to_build_root() {
        assert_eq!(AssetClass::Templates.build_folder(), "");
        assert_eq!(AssetClass::Styles.build_folder(), "css");
    }

    #[test]
    fn only_referencing_classes_are_rewritten() {
        assert_eq!(AssetClass::Images.rewrite_extension(), None);
        assert_eq!(AssetClass::Fonts.rewrite_extension(), None);
        assert_eq!(AssetClass::Templates.rewrite_extension(), Some("html"));
    }

    #[test]
    fn unknown_class_is_rejected() {
        let err = "videos".parse::<AssetClass>().unwrap_err();
        assert!(err.contains("videos"));
    }
}
