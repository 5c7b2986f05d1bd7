//! siteforge publishing: gzip twins, object storage uploads and CDN
//! invalidation.
//!
//! Storage and CDN sit behind the [`ObjectStore`] and [`CdnInvalidator`]
//! traits; the shipped implementations drive the `aws` CLI.

pub mod cache;
pub mod cdn;
pub mod error;
pub mod gzip;
pub mod publisher;
pub mod store;

pub use cdn::{invalidation_paths, AwsCliInvalidator, CdnInvalidator};
pub use error::PublishError;
pub use publisher::{publish, PublishReport, PublishRequest, PublishScope};
pub use store::{AwsCliStore, DeploymentObject, ObjectStore};
