//! siteforge orchestration: named steps, the step DAG and its scheduler.
//!
//! An [`Operation`] expands to stages of [`Step`]s, which become a
//! [`TaskGraph`]. [`execute`] runs the graph with a [`StepRunner`];
//! [`BuildRunner`] is the runner that does the real work.

pub mod error;
pub mod graph;
pub mod operation;
pub mod runner;
pub mod scheduler;
pub mod step;

pub use error::{PipelineError, StepError};
pub use graph::TaskGraph;
pub use operation::{check_env, Operation, ResolvedEnv};
pub use runner::BuildRunner;
pub use scheduler::{execute, execute_blocking, RunReport, StepOutput, StepRecord, StepRunner};
pub use step::{Resource, Step};
