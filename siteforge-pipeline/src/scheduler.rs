//! Ready-node execution of a [`TaskGraph`].
//!
//! Every step whose predecessors have all completed is started on tokio's
//! blocking pool. After the first failure nothing new is started; steps
//! already running are awaited and the first error is returned.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::error::{PipelineError, StepError};
use crate::graph::TaskGraph;
use crate::step::Step;

/// What a step produced, handed to every step that runs after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Files written or rewritten.
    pub files: Vec<PathBuf>,
    /// Object keys uploaded.
    pub published: Vec<String>,
    /// CDN paths a later invalidation step should drop.
    pub invalidate: Vec<String>,
}

impl StepOutput {
    pub fn files(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: Step,
    pub output: StepOutput,
    pub elapsed: Duration,
}

/// Completed steps in completion order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub records: Vec<StepRecord>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn get(&self, step: Step) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.step == step)
    }

    pub fn steps(&self) -> Vec<Step> {
        self.records.iter().map(|r| r.step).collect()
    }
}

/// Executes one step. Called on a blocking thread.
pub trait StepRunner: Send + Sync + 'static {
    /// `inputs` holds the outputs of every step that completed before this
    /// one in the graph (all transitive predecessors).
    fn run(&self, step: Step, inputs: &[(Step, StepOutput)]) -> Result<StepOutput, StepError>;
}

/// Run every step of `graph`. The graph is validated first.
pub async fn execute<R: StepRunner>(
    graph: &TaskGraph,
    runner: Arc<R>,
) -> Result<RunReport, PipelineError> {
    graph.validate()?;
    let started = Instant::now();

    let mut waiting: HashMap<Step, usize> = graph
        .steps()?
        .into_iter()
        .map(|s| (s, graph.dependencies(s).len()))
        .collect();
    let mut outputs: HashMap<Step, StepOutput> = HashMap::new();
    let mut report = RunReport::default();
    let mut failure: Option<PipelineError> = None;
    let mut running: JoinSet<(Step, Duration, Result<StepOutput, StepError>)> = JoinSet::new();

    let mut ready: Vec<Step> = take_ready(&mut waiting);
    loop {
        if failure.is_none() {
            for step in ready.drain(..) {
                let inputs: Vec<(Step, StepOutput)> = graph
                    .ancestors(step)
                    .into_iter()
                    .filter_map(|a| outputs.get(&a).map(|o| (a, o.clone())))
                    .collect();
                let runner = runner.clone();
                tracing::info!("starting {step}");
                running.spawn_blocking(move || {
                    let begun = Instant::now();
                    let result = runner.run(step, &inputs);
                    (step, begun.elapsed(), result)
                });
            }
        }

        let Some(joined) = running.join_next().await else {
            break;
        };
        let (step, elapsed, result) = match joined {
            Ok(done) => done,
            Err(err) => {
                failure.get_or_insert(PipelineError::Join(err));
                continue;
            }
        };

        match result {
            Ok(output) => {
                tracing::info!("finished {step} in {} ms", elapsed.as_millis());
                for next in graph.dependents(step) {
                    if let Some(n) = waiting.get_mut(&next) {
                        *n -= 1;
                    }
                }
                ready.extend(take_ready(&mut waiting));
                outputs.insert(step, output.clone());
                report.records.push(StepRecord {
                    step,
                    output,
                    elapsed,
                });
            }
            Err(source) => {
                tracing::error!("{step} failed: {source}");
                failure.get_or_insert(PipelineError::StepFailed { step, source });
            }
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }
    report.elapsed = started.elapsed();
    Ok(report)
}

/// Run `graph` on a fresh multi-thread runtime, blocking the caller.
pub fn execute_blocking<R: StepRunner>(
    graph: &TaskGraph,
    runner: Arc<R>,
) -> Result<RunReport, PipelineError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| PipelineError::Runtime(e.to_string()))?;
    runtime.block_on(execute(graph, runner))
}

/// Remove and return the steps with no outstanding predecessors.
fn take_ready(waiting: &mut HashMap<Step, usize>) -> Vec<Step> {
    let mut ready: Vec<Step> = waiting
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(s, _)| *s)
        .collect();
    ready.sort();
    for step in &ready {
        waiting.remove(step);
    }
    ready
}
