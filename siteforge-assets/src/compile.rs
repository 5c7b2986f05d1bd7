//! Compile steps for the non-template asset classes.
//!
//! Sources are read from the assets tree and never modified; every output is
//! written into the class's build folder.

use std::path::PathBuf;

use siteforge_core::{AssetClass, ProjectConfig, ProjectPaths};

use crate::error::{io_err, AssetError};
use crate::stylesheet;
use crate::tool::run_tool;
use crate::writer::{atomic_write, copy_tree, has_extension};

/// `styles:compile`: run the stylesheet compiler on the configured entry,
/// producing `build/css/<stem>.css`. A plain `.css` entry is copied through.
/// Either way the output is then vendor-prefixed for `styles.browsers`.
pub fn compile_styles(
    paths: &ProjectPaths,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, AssetError> {
    let entry = paths.assets.join(&config.styles.entry);
    if !entry.is_file() {
        return Err(AssetError::MissingEntry { path: entry });
    }
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "styles".to_string());
    let out_dir = paths.class_build(AssetClass::Styles);
    std::fs::create_dir_all(&out_dir).map_err(|e| io_err(&out_dir, e))?;
    let output = out_dir.join(format!("{stem}.css"));

    if has_extension(&entry, "css") {
        let bytes = std::fs::read(&entry).map_err(|e| io_err(&entry, e))?;
        atomic_write(&output, &bytes)?;
    } else {
        run_tool(&config.styles.command, &entry, &output, &paths.root)?;
        if !output.is_file() {
            return Err(AssetError::ToolFailed {
                program: config.styles.command.first().cloned().unwrap_or_default(),
                status: "exit status: 0".into(),
                stderr: format!("no output written to {}", output.display()),
            });
        }
    }

    let targets = stylesheet::targets_for(&config.styles.browsers)?;
    if targets.browsers.is_some() {
        let css = std::fs::read_to_string(&output).map_err(|e| io_err(&output, e))?;
        let prefixed = stylesheet::prefix(&output, &css, targets)?;
        atomic_write(&output, prefixed.as_bytes())?;
    }

    tracing::info!("styles: {}", output.display());
    Ok(vec![output])
}

/// `scripts:compile`: concatenate the configured entries, in order, into
/// `build/js/<bundle>`.
pub fn compile_scripts(
    paths: &ProjectPaths,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, AssetError> {
    let mut bundle = String::new();
    for entry in &config.scripts.entries {
        let path = paths.assets.join(entry);
        if !path.is_file() {
            return Err(AssetError::MissingEntry { path });
        }
        let source = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        if !bundle.is_empty() && !bundle.ends_with('\n') {
            bundle.push('\n');
        }
        bundle.push_str(&source);
    }

    let output = paths
        .class_build(AssetClass::Scripts)
        .join(&config.scripts.bundle);
    atomic_write(&output, bundle.as_bytes())?;
    tracing::info!("scripts: {}", output.display());
    Ok(vec![output])
}

/// `images:compile` / `fonts:compile`: mirror the class's source folder.
pub fn copy_class(paths: &ProjectPaths, class: AssetClass) -> Result<Vec<PathBuf>, AssetError> {
    let src = paths.class_source(class);
    if !src.exists() {
        tracing::debug!("{class}: no sources at {}", src.display());
        return Ok(Vec::new());
    }
    let written = copy_tree(&src, &paths.class_build(class))?;
    tracing::info!("{class}: {} file(s)", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProjectPaths, ProjectConfig) {
        let root = TempDir::new().unwrap();
        let mut config = ProjectConfig::default();
        config.styles.entry = PathBuf::from("css/styles.css");
        config.scripts.entries = vec![PathBuf::from("js/a.js"), PathBuf::from("js/b.js")];
        let paths = ProjectPaths::resolve(root.path(), &config);
        (root, paths, config)
    }

    fn put(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn css_entry_is_copied_through() {
        let (_root, paths, mut config) = setup();
        config.styles.browsers.clear();
        put(&paths.assets.join("css/styles.css"), "body { color: red; }");
        let out = compile_styles(&paths, &config).unwrap();
        assert_eq!(out, vec![paths.build.join("css/styles.css")]);
        assert_eq!(std::fs::read_to_string(&out[0]).unwrap(), "body { color: red; }");
    }

    #[test]
    fn compiled_styles_are_vendor_prefixed() {
        let (_root, paths, config) = setup();
        put(
            &paths.assets.join("css/styles.css"),
            ".row { display: flex; user-select: none; }",
        );
        let out = compile_styles(&paths, &config).unwrap();
        let css = std::fs::read_to_string(&out[0]).unwrap();
        assert!(css.contains("-ms-flexbox"), "got: {css}");
        assert!(css.matches("user-select").count() > 1, "got: {css}");
        assert!(css.contains("display: flex"), "got: {css}");
    }

    #[test]
    fn missing_styles_entry_is_reported() {
        let (_root, paths, config) = setup();
        let err = compile_styles(&paths, &config).unwrap_err();
        assert!(matches!(err, AssetError::MissingEntry { .. }), "got: {err}");
    }

    #[test]
    fn scripts_are_concatenated_in_order() {
        let (_root, paths, config) = setup();
        put(&paths.assets.join("js/a.js"), "var a = 1;");
        put(&paths.assets.join("js/b.js"), "var b = 2;\n");
        let out = compile_scripts(&paths, &config).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out[0]).unwrap(),
            "var a = 1;\nvar b = 2;\n"
        );
    }

    #[test]
    fn absent_font_folder_is_not_an_error() {
        let (_root, paths, _config) = setup();
        assert!(copy_class(&paths, AssetClass::Fonts).unwrap().is_empty());
    }

    #[test]
    fn images_are_mirrored() {
        let (_root, paths, _config) = setup();
        put(&paths.assets.join("images/icons/a.png"), "png");
        let out = copy_class(&paths, AssetClass::Images).unwrap();
        assert_eq!(out, vec![paths.build.join("images/icons/a.png")]);
    }
}
