//! File-system helpers shared by every asset step.
//!
//! Writes go to a `<path>.siteforge.tmp` sibling and are renamed into place,
//! so a failed step never leaves a half-written output behind.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{io_err, AssetError};

/// Suffix of the temporary sibling used by [`atomic_write`].
pub const TMP_SUFFIX: &str = ".siteforge.tmp";

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically write `bytes` to `path`, creating parent directories.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()))
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Every regular file under `dir`, sorted. A missing `dir` yields no files.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            io_err(path, e.into())
        })?;
        if entry.file_type().is_file() && !is_tmp(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Files under `dir` whose name ends in `.<ext>`.
pub fn collect_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, AssetError> {
    Ok(collect_files(dir)?
        .into_iter()
        .filter(|p| has_extension(p, ext))
        .collect())
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

fn is_tmp(path: &Path) -> bool {
    path.to_string_lossy().ends_with(TMP_SUFFIX)
}

// ---------------------------------------------------------------------------
// copy_tree
// ---------------------------------------------------------------------------

/// Mirror every file under `src` into `dst`, keeping relative paths.
/// Returns the written destination paths.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let mut written = Vec::new();
    for file in collect_files(src)? {
        let Ok(rel) = file.strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::copy(&file, &target).map_err(|e| io_err(&file, e))?;
        tracing::debug!("copied: {} -> {}", file.display(), target.display());
        written.push(target);
    }
    Ok(written)
}
