//! lightningcss passes over compiled stylesheets.
//!
//! `styles:compile` runs [`prefix`] so the build folder holds readable CSS
//! with vendor prefixes for the configured browsers; `styles:optimize` runs
//! [`minify`] with the same targets so the prefixes survive minification.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::error::AssetError;

/// Browserslist queries to lightningcss targets. No queries means no
/// prefixing at all.
pub fn targets_for(queries: &[String]) -> Result<Targets, AssetError> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries).map_err(|e| AssetError::Browsers {
        queries: queries.join(", "),
        message: e.to_string(),
    })?;
    Ok(browsers.map(Targets::from).unwrap_or_default())
}

/// Add the vendor prefixes `targets` need, keeping the output readable.
pub fn prefix(path: &Path, source: &str, targets: Targets) -> Result<String, AssetError> {
    process(path, source, targets, false)
}

pub fn minify(path: &Path, source: &str, targets: Targets) -> Result<String, AssetError> {
    process(path, source, targets, true)
}

fn process(path: &Path, source: &str, targets: Targets, minify: bool) -> Result<String, AssetError> {
    let fail = |message: String| AssetError::Stylesheet {
        path: path.to_path_buf(),
        message,
    };
    let options = ParserOptions {
        filename: path.display().to_string(),
        ..ParserOptions::default()
    };
    let mut sheet = StyleSheet::parse(source, options).map_err(|e| fail(e.to_string()))?;
    // Without browsers the declarations are printed as written.
    if targets.browsers.is_some() {
        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| fail(e.to_string()))?;
    }
    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;
    Ok(printed.code)
}
