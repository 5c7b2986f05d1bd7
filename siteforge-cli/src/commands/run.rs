//! Run one operation or step from the project root.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use siteforge_core::{config, ProjectPaths};
use siteforge_pipeline::{execute_blocking, BuildRunner, Operation};
use siteforge_publish::{AwsCliInvalidator, AwsCliStore, CdnInvalidator, ObjectStore};

use super::summary;

pub fn run(root: &Path, name: &str) -> Result<()> {
    let op: Operation = name.parse()?;
    let config = config::load_at(root).context("failed to load siteforge.yaml")?;
    config.validate()?;

    // Fail before any step runs. The error is shown as-is.
    let paths = ProjectPaths::resolve(root, &config);
    let runner = BuildRunner::for_operation(
        &op,
        paths.clone(),
        config.clone(),
        |var| std::env::var(var).ok(),
        |aws| {
            let store: Arc<dyn ObjectStore> = Arc::new(AwsCliStore::new(aws.clone()));
            let cdn: Arc<dyn CdnInvalidator> = Arc::new(AwsCliInvalidator::new(aws));
            (store, cdn)
        },
    )?;
    let runner = Arc::new(runner);

    let graph = op.graph();
    if !graph.is_empty() {
        let report =
            execute_blocking(&graph, runner.clone()).with_context(|| format!("{op} failed"))?;
        summary::print(&op, &report);
    }

    if op.serves() {
        let watch = op.watches().then(|| runner.clone());
        siteforge_server::start_blocking(paths, config, watch).context("dev server failed")?;
    }
    Ok(())
}
