//! `default` and `serve`: the dev server, optionally with the watcher.

use std::sync::Arc;

use tokio::sync::broadcast;

use siteforge_core::{ProjectConfig, ProjectPaths};
use siteforge_pipeline::BuildRunner;

use crate::error::{io_err, ServerError};
use crate::serve::serve;
use crate::watcher::{watch_task, Classifier};

/// Start a runtime and block until the server (and watcher) exit.
pub fn start_blocking(
    paths: ProjectPaths,
    config: ProjectConfig,
    runner: Option<Arc<BuildRunner>>,
) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(paths, config, runner))
}

/// Serve the build tree. With a runner, sources are also watched and
/// rebuilt. Ctrl-c, or either task ending, shuts everything down.
pub async fn run(
    paths: ProjectPaths,
    config: ProjectConfig,
    runner: Option<Arc<BuildRunner>>,
) -> Result<(), ServerError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let server_handle = {
        let shutdown = shutdown_tx.clone();
        let addr = config.server.addr.clone();
        let build = paths.build.clone();
        tokio::spawn(async move {
            let result = serve(&addr, build, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let classifier = Classifier::new(&paths, &config);
        tokio::spawn(async move {
            let result = match runner {
                Some(runner) => watch_task(classifier, runner, shutdown.subscribe()).await,
                None => Ok(()),
            };
            if result.is_err() {
                let _ = shutdown.send(());
            }
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(ServerError::Signal(err.to_string())),
                    }
                }
            }
        })
    };

    let (server_result, watcher_result, signal_result) =
        tokio::join!(server_handle, watcher_handle, signal_handle);

    handle_join("server", server_result)?;
    handle_join("watcher", watcher_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(ServerError::Join {
            task,
            message: err.to_string(),
        }),
    }
}
