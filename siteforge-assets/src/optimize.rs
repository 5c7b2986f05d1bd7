//! In-place optimisation of build outputs.
//!
//! CSS goes through lightningcss ([`stylesheet`]), JavaScript through oxc and
//! HTML through minify-html (with its embedded CSS and JS minifiers on).
//! Images are handed to an optional external optimiser.

use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use siteforge_core::{AssetClass, ProjectConfig, ProjectPaths};

use crate::error::{io_err, AssetError};
use crate::stylesheet;
use crate::tool::run_tool;
use crate::writer::{atomic_write, collect_files, collect_with_extension};

// ---------------------------------------------------------------------------
// Minifiers
// ---------------------------------------------------------------------------

/// Minify a script bundle. Bundles are classic scripts concatenated from
/// several files, so top-level names are left alone and only locals are
/// mangled. Every parser error is reported, not just the first.
pub fn minify_js(path: &Path, source: &str) -> Result<String, AssetError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AssetError::Minify {
            path: path.to_path_buf(),
            message,
        });
    }
    let mut program = parsed.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(false),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions::default()),
    };
    let minified = Minifier::new(options).minify(&allocator, &mut program);
    let codegen = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    Ok(Codegen::new()
        .with_options(codegen)
        .with_scoping(minified.scoping)
        .build(&program)
        .code)
}

/// Minify markup, collapsing whitespace and minifying inline styles/scripts.
pub fn minify_markup(source: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    minify_html::minify(source, &cfg)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn rewrite_each<F>(files: Vec<PathBuf>, mut f: F) -> Result<Vec<PathBuf>, AssetError>
where
    F: FnMut(&Path, &str) -> Result<String, AssetError>,
{
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let source = std::fs::read_to_string(&file).map_err(|e| io_err(&file, e))?;
        let minified = f(&file, &source)?;
        atomic_write(&file, minified.as_bytes())?;
        tracing::debug!("minified: {}", file.display());
        written.push(file);
    }
    Ok(written)
}

/// `styles:optimize`: minify with the prefixing targets of `styles:compile`
/// so no prefix is dropped.
pub fn optimize_styles(
    paths: &ProjectPaths,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, AssetError> {
    let targets = stylesheet::targets_for(&config.styles.browsers)?;
    let files = collect_with_extension(&paths.class_build(AssetClass::Styles), "css")?;
    let written = rewrite_each(files, |path, src| stylesheet::minify(path, src, targets))?;
    tracing::info!("styles: minified {} file(s)", written.len());
    Ok(written)
}

/// `scripts:optimize`
pub fn optimize_scripts(paths: &ProjectPaths) -> Result<Vec<PathBuf>, AssetError> {
    let files = collect_with_extension(&paths.class_build(AssetClass::Scripts), "js")?;
    let written = rewrite_each(files, minify_js)?;
    tracing::info!("scripts: minified {} file(s)", written.len());
    Ok(written)
}

/// `html:optimize`: every `*.html` anywhere in the build tree.
pub fn optimize_markup(paths: &ProjectPaths) -> Result<Vec<PathBuf>, AssetError> {
    let files = collect_with_extension(&paths.build, "html")?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let source = std::fs::read(&file).map_err(|e| io_err(&file, e))?;
        atomic_write(&file, &minify_markup(&source))?;
        written.push(file);
    }
    tracing::info!("html: minified {} file(s)", written.len());
    Ok(written)
}

/// `images:optimize`: run the configured optimiser on each image in place.
/// Without an optimiser the step only logs.
pub fn optimize_images(
    paths: &ProjectPaths,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, AssetError> {
    if config.images.optimizer.is_empty() {
        tracing::info!("images: no optimizer configured, skipping");
        return Ok(Vec::new());
    }
    let files = collect_files(&paths.class_build(AssetClass::Images))?;
    for file in &files {
        run_tool(&config.images.optimizer, file, file, &paths.root)?;
    }
    tracing::info!("images: optimized {} file(s)", files.len());
    Ok(files)
}
