//! Content-hash versioning of build outputs.
//!
//! Every file in a build subfolder is renamed to `<stem>-<hash>.<ext>`, where
//! `hash` is the first [`HASH_LEN`] hex characters of the SHA-256 of its
//! content. The returned manifest delta maps build-relative original paths to
//! build-relative hashed paths.

use std::path::Path;

use sha2::{Digest, Sha256};

use siteforge_core::relative_key;

use crate::error::{io_err, AssetError};
use crate::manifest::Manifest;
use crate::writer::{collect_files, has_extension};

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 10;

/// Truncated SHA-256 hex digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    let mut digest = hex::encode(h.finalize());
    digest.truncate(HASH_LEN);
    digest
}

/// `css/styles.css` + `1a2b3c4d5e` -> `css/styles-1a2b3c4d5e.css`.
///
/// Only the last extension moves (`app.min.js` -> `app.min-<hash>.js`); a
/// name without extension just gets the suffix.
pub fn hashed_name(key: &str, hash: &str) -> String {
    let (dir, file) = match key.rfind('/') {
        Some(i) => key.split_at(i + 1),
        None => ("", key),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = file.split_at(dot);
            format!("{dir}{stem}-{hash}{ext}")
        }
        _ => format!("{dir}{file}-{hash}"),
    }
}

/// Version every file under `<build_root>/<folder>` in place.
///
/// Files that are already values in `known` (previously versioned) and
/// `.gz` twins are left alone, so running twice never hashes a hash.
/// Returns the manifest delta for the files renamed by this call.
pub fn version_folder(
    build_root: &Path,
    folder: &str,
    known: &Manifest,
) -> Result<Manifest, AssetError> {
    let dir = if folder.is_empty() {
        build_root.to_path_buf()
    } else {
        build_root.join(folder)
    };
    let already: std::collections::BTreeSet<&str> =
        known.values().map(String::as_str).collect();

    let mut delta = Manifest::new();
    for file in collect_files(&dir)? {
        if has_extension(&file, "gz") {
            continue;
        }
        let Some(key) = relative_key(build_root, &file) else {
            continue;
        };
        if already.contains(key.as_str()) {
            tracing::debug!("already versioned: {key}");
            continue;
        }
        let bytes = std::fs::read(&file).map_err(|e| io_err(&file, e))?;
        let value = hashed_name(&key, &content_hash(&bytes));
        let target = build_root.join(&value);
        std::fs::rename(&file, &target).map_err(|e| io_err(&file, e))?;
        tracing::debug!("versioned: {key} -> {value}");
        delta.insert(key, value);
    }

    let label = if folder.is_empty() { "build" } else { folder };
    tracing::info!("{label}: versioned {} file(s)", delta.len());
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("css/styles.css", "css/styles-abc.css")]
    #[case("js/app.min.js", "js/app.min-abc.js")]
    #[case("fonts/LICENSE", "fonts/LICENSE-abc")]
    #[case("robots.txt", "robots-abc.txt")]
    #[case("images/.hidden", "images/.hidden-abc")]
    fn hashed_name_cases(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(hashed_name(key, "abc"), expected);
    }

    #[test]
    fn hash_is_truncated_sha256() {
        // sha256("") = e3b0c44298fc1c14...
        assert_eq!(content_hash(b""), "e3b0c44298");
        assert_eq!(content_hash(b"x").len(), HASH_LEN);
    }
}
