//! Publishing the build tree to an [`ObjectStore`].
//!
//! Markup (`*.html`, `*.html.gz`) and everything else are published by two
//! separate steps. Objects whose digest matches the publish cache are
//! skipped. The cache is only written after every upload of a run succeeded:
//! a key uploaded by a failed run is uploaded and reported again on retry, so
//! it still reaches CDN invalidation.

use std::path::Path;

use siteforge_assets::writer::collect_files;

use crate::cache::{self, digest};
use crate::error::{io_err, PublishError};
use crate::store::{DeploymentObject, ObjectStore};

/// Which half of the build tree a publish step covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishScope {
    Markup,
    Assets,
}

impl PublishScope {
    pub fn includes(&self, object: &DeploymentObject) -> bool {
        match self {
            PublishScope::Markup => object.is_markup(),
            PublishScope::Assets => !object.is_markup(),
        }
    }
}

/// Outcome of one publish step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Keys uploaded by this run, in upload order.
    pub uploaded: Vec<String>,
    /// Keys skipped because the stored copy is current.
    pub unchanged: Vec<String>,
}

/// Publishing parameters shared by both scopes.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub build_dir: &'a Path,
    pub cache_path: &'a Path,
    pub cache_control: &'a str,
    pub scope: PublishScope,
}

/// Upload every changed object in `request.scope`.
pub fn publish(
    store: &dyn ObjectStore,
    request: &PublishRequest<'_>,
) -> Result<PublishReport, PublishError> {
    let mut cache = cache::load_at(request.cache_path, store.bucket())?;
    let mut report = PublishReport::default();

    upload_changed(store, request, &mut cache, &mut report)?;
    if !report.uploaded.is_empty() {
        cache.published_at = chrono::Utc::now();
        cache::save_at(request.cache_path, &cache)?;
    }

    tracing::info!(
        "publish {:?}: {} uploaded, {} unchanged",
        request.scope,
        report.uploaded.len(),
        report.unchanged.len()
    );
    Ok(report)
}

fn upload_changed(
    store: &dyn ObjectStore,
    request: &PublishRequest<'_>,
    cache: &mut cache::PublishCache,
    report: &mut PublishReport,
) -> Result<(), PublishError> {
    for file in collect_files(request.build_dir)? {
        let Some(object) =
            DeploymentObject::for_file(request.build_dir, &file, request.cache_control)
        else {
            continue;
        };
        if !request.scope.includes(&object) {
            continue;
        }
        let bytes = std::fs::read(&file).map_err(|e| io_err(&file, e))?;
        let hash = digest(&bytes);
        if cache.is_current(&object.key, &hash) {
            tracing::debug!("unchanged: {}", object.key);
            report.unchanged.push(object.key);
            continue;
        }
        store.put(&object)?;
        cache.record(object.key.clone(), hash);
        report.uploaded.push(object.key);
    }
    Ok(())
}
