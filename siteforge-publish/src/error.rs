//! Error types for siteforge-publish.

use std::path::PathBuf;

use thiserror::Error;

use siteforge_assets::AssetError;

/// All errors that can arise while gzipping, uploading or invalidating.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Walking or writing the build tree failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Publish cache JSON error.
    #[error("publish cache JSON error at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The storage CLI could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An object upload was rejected.
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    /// The CDN rejected an invalidation request.
    #[error("CDN invalidation failed: {message}")]
    Invalidation { message: String },
}

/// Convenience constructor for [`PublishError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}
