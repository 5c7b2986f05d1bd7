//! Project configuration: `siteforge.yaml` at the project root.
//!
//! Every field is optional; the defaults reproduce the conventional layout:
//!
//! ```text
//! <root>/
//!   siteforge.yaml          (optional)
//!   src/
//!     assets/{css,js,images,fonts}/
//!     templates/            (layouts and partials, never rendered directly)
//!     rev-manifest.json     (written by versioning)
//!   build/                  (output)
//! ```
//!
//! # API pattern
//!
//! Like the rest of the workspace, loading takes an explicit root:
//! [`load_at`] reads `<root>/siteforge.yaml`, or returns
//! [`ProjectConfig::default`] when the file does not exist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "siteforge.yaml";

/// Long-lived cache header applied to every published object.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=31536000, no-transform, public";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Stylesheet compilation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Entry stylesheet, relative to the assets dir.
    pub entry: PathBuf,
    /// External compiler invocation; `{input}` and `{output}` are substituted.
    pub command: Vec<String>,
    /// Browserslist queries for vendor prefixing. Empty disables it.
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("css/styles.scss"),
            command: vec!["sass".into(), "{input}".into(), "{output}".into()],
            browsers: vec!["last 2 versions".into()],
        }
    }
}

/// Script bundling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Script files concatenated in order, relative to the assets dir.
    pub entries: Vec<PathBuf>,
    /// Bundle file name written under `build/js/`.
    pub bundle: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            entries: vec![PathBuf::from("js/scripts.js")],
            bundle: "scripts.js".into(),
        }
    }
}

/// Image optimisation settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// In-place optimiser invocation (`{input}`/`{output}` substituted).
    /// Empty means `images:optimize` is a no-op.
    pub optimizer: Vec<String>,
}

/// Dev server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".into(),
        }
    }
}

/// Publishing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub cache_control: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            cache_control: DEFAULT_CACHE_CONTROL.into(),
        }
    }
}

/// Content pipeline (pages + posts). Its presence switches `html:compile`
/// from plain template rendering to the page/post pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub pages_dir: PathBuf,
    pub posts_dir: PathBuf,
    /// YAML site metadata merged into every page context.
    pub site_data: PathBuf,
    /// Layout applied to posts that do not name one.
    pub post_layout: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            pages_dir: PathBuf::from("src/pages"),
            posts_dir: PathBuf::from("src/posts"),
            site_data: PathBuf::from("src/site.yaml"),
            post_layout: "post.html".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

/// Root of `siteforge.yaml`. All paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub src_dir: PathBuf,
    pub build_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub manifest: PathBuf,
    pub styles: StylesConfig,
    pub scripts: ScriptsConfig,
    pub images: ImagesConfig,
    pub server: ServerConfig,
    pub publish: PublishConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            build_dir: PathBuf::from("build"),
            assets_dir: PathBuf::from("src/assets"),
            templates_dir: PathBuf::from("src/templates"),
            manifest: PathBuf::from("src/rev-manifest.json"),
            styles: StylesConfig::default(),
            scripts: ScriptsConfig::default(),
            images: ImagesConfig::default(),
            server: ServerConfig::default(),
            publish: PublishConfig::default(),
            content: None,
        }
    }
}

impl ProjectConfig {
    /// Reject settings that would only fail later, mid-build.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.styles.command.is_empty() {
            return Err(CoreError::Invalid("styles.command must not be empty".into()));
        }
        if self.scripts.bundle.trim().is_empty() {
            return Err(CoreError::Invalid("scripts.bundle must not be empty".into()));
        }
        if self.build_dir.as_os_str().is_empty() {
            return Err(CoreError::Invalid("build_dir must not be empty".into()));
        }
        Ok(())
    }
}

/// `<root>/siteforge.yaml`. Pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load the project config from `root`.
///
/// Returns defaults if the file is absent, `CoreError::Parse` (with path +
/// line context) if it is malformed YAML.
pub fn load_at(root: &Path) -> Result<ProjectConfig, CoreError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    // An empty file is a valid "all defaults" config.
    if contents.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig =
        serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let root = TempDir::new().expect("tempdir");
        let config = load_at(root.path()).expect("load");
        assert_eq!(config, ProjectConfig::default());
        assert!(config.content.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let root = TempDir::new().expect("tempdir");
        std::fs::write(
            config_path_at(root.path()),
            "build_dir: dist\nstyles:\n  entry: css/main.css\n",
        )
        .expect("write");

        let config = load_at(root.path()).expect("load");
        assert_eq!(config.build_dir, PathBuf::from("dist"));
        assert_eq!(config.styles.entry, PathBuf::from("css/main.css"));
        assert_eq!(config.styles.command[0], "sass");
        assert_eq!(config.styles.browsers, vec!["last 2 versions".to_string()]);
        assert_eq!(config.scripts.bundle, "scripts.js");
    }

    #[test]
    fn content_section_enables_content_pipeline() {
        let root = TempDir::new().expect("tempdir");
        std::fs::write(config_path_at(root.path()), "content:\n  post_layout: article.html\n")
            .expect("write");

        let config = load_at(root.path()).expect("load");
        let content = config.content.expect("content section");
        assert_eq!(content.post_layout, "article.html");
        assert_eq!(content.posts_dir, PathBuf::from("src/posts"));
    }

    #[test]
    fn empty_styles_command_is_invalid() {
        let root = TempDir::new().expect("tempdir");
        std::fs::write(config_path_at(root.path()), "styles:\n  command: []\n").expect("write");
        let err = load_at(root.path()).unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)), "got: {err}");
    }
}
