//! Error types for siteforge-renderer.

use std::path::PathBuf;

use thiserror::Error;

use siteforge_assets::AssetError;

/// All errors that can arise while loading content or rendering templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a rendered page failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Filesystem error while reading content or writing pages.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Front matter block is not valid YAML for the expected shape.
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Site metadata file is malformed or not a mapping.
    #[error("invalid site data at {path}: {message}")]
    SiteData { path: PathBuf, message: String },

    /// A post's name does not follow `YYYY-MM-DD-slug`.
    #[error("post name must look like YYYY-MM-DD-slug: {path}")]
    PostName { path: PathBuf },
}

/// Convenience constructor for [`RenderError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
