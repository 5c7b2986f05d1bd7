//! siteforge core library: project config, deployment environment, path
//! layout and the asset classification shared by every other crate.
//!
//! - [`config`]: `siteforge.yaml` loading with defaults
//! - [`env`]: fail-fast deployment variable lookup
//! - [`paths`]: root-relative path resolution
//! - [`types`]: [`AssetClass`]

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{ContentConfig, ProjectConfig};
pub use env::AwsEnv;
pub use error::{io_err, CoreError};
pub use paths::{relative_key, ProjectPaths};
pub use types::AssetClass;
