//! siteforge asset steps: compile, optimise, version and rewrite build outputs.
//!
//! Every public step is blocking file-system work; the pipeline crate runs
//! them on tokio's blocking pool.

pub mod compile;
pub mod error;
pub mod manifest;
pub mod optimize;
pub mod rewrite;
pub mod stylesheet;
pub mod tool;
pub mod version;
pub mod writer;

pub use error::AssetError;
pub use manifest::Manifest;
pub use rewrite::Rewriter;
