//! Source watching: a change under `src/` recompiles the asset class it
//! belongs to.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use siteforge_core::{AssetClass, ProjectConfig, ProjectPaths};
use siteforge_pipeline::{execute, BuildRunner, Operation, Step};

use crate::error::ServerError;

/// Events for one path closer together than this are dropped.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Maps changed paths to the asset class that has to be rebuilt.
#[derive(Debug, Clone)]
pub struct Classifier {
    assets: PathBuf,
    build: PathBuf,
    manifest: PathBuf,
    content_roots: Vec<PathBuf>,
}

impl Classifier {
    /// Roots are canonicalised so they match the real paths notify reports.
    pub fn new(paths: &ProjectPaths, config: &ProjectConfig) -> Self {
        let mut content_roots = vec![canonical(&paths.src), canonical(&paths.templates)];
        if let Some(content) = &config.content {
            content_roots.push(canonical(&paths.pages_dir(content)));
            content_roots.push(canonical(&paths.posts_dir(content)));
            content_roots.push(canonical(&paths.site_data(content)));
        }
        Self {
            assets: canonical(&paths.assets),
            build: canonical(&paths.build),
            manifest: canonical(&paths.manifest),
            content_roots,
        }
    }

    /// Directories to register with the watcher.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for root in std::iter::once(&self.assets).chain(&self.content_roots) {
            let dir = if root.is_file() {
                root.parent().map(Path::to_path_buf)
            } else {
                Some(root.clone())
            };
            if let Some(dir) = dir {
                if dir.exists() && !roots.iter().any(|r| dir.starts_with(r)) {
                    roots.retain(|r| !r.starts_with(&dir));
                    roots.push(dir);
                }
            }
        }
        roots
    }

    pub fn classify(&self, path: &Path) -> Option<AssetClass> {
        if path.starts_with(&self.build) || path == self.manifest {
            return None;
        }
        if let Ok(rel) = path.strip_prefix(&self.assets) {
            let folder = rel.components().next()?.as_os_str().to_str()?;
            return AssetClass::all()
                .iter()
                .copied()
                .find(|c| *c != AssetClass::Templates && c.source_folder() == folder);
        }
        let ext = path.extension().and_then(|e| e.to_str())?;
        let is_content = matches!(ext, "html" | "md" | "markdown" | "yaml" | "yml");
        if is_content && self.content_roots.iter().any(|r| path.starts_with(r)) {
            return Some(AssetClass::Templates);
        }
        None
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

pub fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

/// Watch sources until shutdown, running `<class>:compile` for each change.
/// A failed rebuild is logged and watching continues.
pub async fn watch_task(
    classifier: Classifier,
    runner: Arc<BuildRunner>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    for root in classifier.watch_roots() {
        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::info!("watching {}", root.display());
    }

    let mut debounce = HashMap::<PathBuf, Instant>::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }

                let mut classes = BTreeSet::new();
                for path in &event.paths {
                    let Some(class) = classifier.classify(path) else { continue };
                    if should_process_event_with_threshold(&mut debounce, path, Instant::now(), DEBOUNCE_WINDOW) {
                        classes.insert(class);
                    }
                }
                for class in classes {
                    rebuild(class, runner.clone()).await;
                }
            }
        }
    }
    Ok(())
}

async fn rebuild(class: AssetClass, runner: Arc<BuildRunner>) {
    let step = Step::Compile(class);
    match execute(&Operation::Single(step).graph(), runner).await {
        Ok(report) => tracing::info!(
            "rebuilt {step} in {} ms",
            report.elapsed.as_millis()
        ),
        Err(err) => tracing::error!(error = %err, "rebuild of {step} failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteforge_core::ContentConfig;
    use tempfile::TempDir;

    fn classifier(tmp: &TempDir, content: bool) -> Classifier {
        let mut config = ProjectConfig::default();
        if content {
            config.content = Some(ContentConfig::default());
        }
        let paths = ProjectPaths::resolve(tmp.path(), &config);
        for dir in ["src/assets/css", "src/templates", "build"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        Classifier::new(&paths, &config)
    }

    #[test]
    fn asset_folders_map_to_their_class() {
        let tmp = TempDir::new().unwrap();
        let c = classifier(&tmp, false);
        let assets = canonical(&tmp.path().join("src/assets"));
        assert_eq!(c.classify(&assets.join("css/_vars.scss")), Some(AssetClass::Styles));
        assert_eq!(c.classify(&assets.join("js/app.js")), Some(AssetClass::Scripts));
        assert_eq!(c.classify(&assets.join("images/a.png")), Some(AssetClass::Images));
        assert_eq!(c.classify(&assets.join("fonts/b.woff2")), Some(AssetClass::Fonts));
        assert_eq!(c.classify(&assets.join("misc/readme.txt")), None);
    }

    #[test]
    fn markup_and_content_rebuild_html_but_outputs_do_not() {
        let tmp = TempDir::new().unwrap();
        let c = classifier(&tmp, true);
        let root = canonical(tmp.path());
        assert_eq!(c.classify(&root.join("src/templates/base.html")), Some(AssetClass::Templates));
        assert_eq!(c.classify(&root.join("src/posts/2021-03-01-a/index.md")), Some(AssetClass::Templates));
        assert_eq!(c.classify(&root.join("src/site.yaml")), Some(AssetClass::Templates));
        assert_eq!(c.classify(&root.join("src/rev-manifest.json")), None);
        assert_eq!(c.classify(&root.join("build/index.html")), None);
    }

    #[test]
    fn nested_roots_collapse_into_their_parent() {
        let tmp = TempDir::new().unwrap();
        let c = classifier(&tmp, false);
        assert_eq!(c.watch_roots(), vec![canonical(&tmp.path().join("src"))]);
    }

    #[test]
    fn debounce_drops_repeats_inside_the_window() {
        let mut seen = HashMap::new();
        let path = Path::new("/p/src/assets/css/a.scss");
        let t0 = Instant::now();
        assert!(should_process_event_with_threshold(&mut seen, path, t0, DEBOUNCE_WINDOW));
        assert!(!should_process_event_with_threshold(
            &mut seen,
            path,
            t0 + Duration::from_millis(100),
            DEBOUNCE_WINDOW
        ));
        assert!(should_process_event_with_threshold(
            &mut seen,
            path,
            t0 + Duration::from_millis(400),
            DEBOUNCE_WINDOW
        ));
    }
}
