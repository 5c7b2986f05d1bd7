use std::path::{Path, PathBuf};

use crate::config::{ContentConfig, ProjectConfig};
use crate::types::AssetClass;

pub const STATE_DIR: &str = ".siteforge";
pub const PUBLISH_CACHE_FILE: &str = "publish-cache.json";

/// Config paths resolved against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub src: PathBuf,
    pub build: PathBuf,
    pub assets: PathBuf,
    pub templates: PathBuf,
    pub manifest: PathBuf,
}

impl ProjectPaths {
    pub fn resolve(root: &Path, config: &ProjectConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            src: root.join(&config.src_dir),
            build: root.join(&config.build_dir),
            assets: root.join(&config.assets_dir),
            templates: root.join(&config.templates_dir),
            manifest: root.join(&config.manifest),
        }
    }

    /// Where sources of `class` live. Templates live directly under `src`.
    pub fn class_source(&self, class: AssetClass) -> PathBuf {
        match class {
            AssetClass::Templates => self.src.clone(),
            other => self.assets.join(other.source_folder()),
        }
    }

    /// Where outputs of `class` are written.
    pub fn class_build(&self, class: AssetClass) -> PathBuf {
        match class {
            AssetClass::Templates => self.build.clone(),
            other => self.build.join(other.build_folder()),
        }
    }

    pub fn publish_cache(&self) -> PathBuf {
        publish_cache_path(&self.root)
    }

    pub fn pages_dir(&self, content: &ContentConfig) -> PathBuf {
        self.root.join(&content.pages_dir)
    }

    pub fn posts_dir(&self, content: &ContentConfig) -> PathBuf {
        self.root.join(&content.posts_dir)
    }

    pub fn site_data(&self, content: &ContentConfig) -> PathBuf {
        self.root.join(&content.site_data)
    }
}

pub fn publish_cache_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(PUBLISH_CACHE_FILE)
}

/// `path` relative to `base` with `/` separators, as used for manifest keys
/// and object keys. `None` if `path` is not under `base`.
pub fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
