//! Error types for siteforge-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading project configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load. Includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required environment variable is absent or empty.
    #[error("could not deploy. {var} ENV variable is missing.")]
    MissingEnv { var: &'static str },

    /// The config names something that cannot work (e.g. an empty tool command).
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
