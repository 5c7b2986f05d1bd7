//! Error types for siteforge-assets.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while compiling, optimising, versioning or
/// rewriting build assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON could not be read or written.
    #[error("manifest JSON error at {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configured entry file does not exist.
    #[error("entry not found: {path}")]
    MissingEntry { path: PathBuf },

    /// An external tool could not be started.
    #[error("failed to start `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool exited unsuccessfully.
    #[error("`{program}` failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// lightningcss rejected a stylesheet.
    #[error("stylesheet error in {path}: {message}")]
    Stylesheet { path: PathBuf, message: String },

    /// The configured browser queries could not be resolved.
    #[error("invalid browser queries '{queries}': {message}")]
    Browsers { queries: String, message: String },

    /// The script minifier rejected a bundle.
    #[error("could not minify {path}: {message}")]
    Minify { path: PathBuf, message: String },

    /// The rewrite pattern could not be built from the manifest keys.
    #[error("rewrite pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Convenience constructor for [`AssetError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> AssetError {
    AssetError::Io {
        path: path.into(),
        source,
    }
}
