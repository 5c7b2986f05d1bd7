//! Error types for siteforge-pipeline.

use thiserror::Error;

use siteforge_assets::AssetError;
use siteforge_core::CoreError;
use siteforge_publish::PublishError;
use siteforge_renderer::RenderError;

use crate::step::Step;

/// Why a single step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The runner has no implementation for this step.
    #[error("step {0} is not supported by this runner")]
    Unsupported(Step),
}

/// All errors that can arise while planning or executing an operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither an operation nor a step has this name.
    #[error("unknown operation or step '{0}'")]
    UnknownName(String),

    /// The step graph is not a DAG.
    #[error("step graph has a cycle through {0}")]
    Cycle(Step),

    /// Two steps that may run at the same time write the same resource.
    #[error("{first} and {second} may run concurrently but both write {resource}")]
    WriteConflict {
        first: Step,
        second: Step,
        resource: String,
    },

    /// A step failed; steps already running were awaited, nothing else started.
    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: StepError,
    },

    /// The async runtime could not be started.
    #[error("could not start the runtime: {0}")]
    Runtime(String),

    /// A step panicked or its task was aborted.
    #[error("step task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
