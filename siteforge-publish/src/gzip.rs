//! `build:gzip`: a `.gz` twin next to every build file.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use siteforge_assets::writer::{atomic_write, collect_files, has_extension};

use crate::error::{io_err, PublishError};

/// Gzip `bytes` at maximum compression. The header carries no mtime, so equal
/// input gives equal output.
pub fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// `<path>.gz`
pub fn twin_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.gz", path.display()))
}

/// Write `<file>.gz` for every non-`.gz` file under `build_dir`. Existing
/// twins are overwritten. Returns the twins written.
pub fn gzip_build(build_dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    let mut written = Vec::new();
    for file in collect_files(build_dir)? {
        if has_extension(&file, "gz") {
            continue;
        }
        let bytes = std::fs::read(&file).map_err(|e| io_err(&file, e))?;
        let compressed = gzip_bytes(&bytes).map_err(|e| io_err(&file, e))?;
        let twin = twin_path(&file);
        atomic_write(&twin, &compressed)?;
        written.push(twin);
    }
    tracing::info!("gzip: {} file(s)", written.len());
    Ok(written)
}
