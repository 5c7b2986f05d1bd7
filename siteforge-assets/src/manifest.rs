//! Versioning manifest: original build-relative path to hashed path.
//!
//! Persisted as pretty JSON with sorted keys. Entries accumulate across
//! versioning passes: [`merge`] never drops a key and the newer value wins.
//! Writes use the same atomic `.tmp` + rename pattern as every other output.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{io_err, AssetError};
use crate::writer::atomic_write;

/// Sorted in-memory manifest.
pub type Manifest = BTreeMap<String, String>;

/// Load the manifest at `path`. Returns an empty manifest if the file does
/// not exist yet.
pub fn load_at(path: &Path) -> Result<Manifest, AssetError> {
    if !path.exists() {
        return Ok(Manifest::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Manifest::new());
    }
    serde_json::from_str(&contents).map_err(|source| AssetError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Save `manifest` to `path` atomically.
pub fn save_at(path: &Path, manifest: &Manifest) -> Result<(), AssetError> {
    let mut json = serde_json::to_string_pretty(manifest).map_err(|source| {
        AssetError::Manifest {
            path: path.to_path_buf(),
            source,
        }
    })?;
    json.push('\n');
    atomic_write(path, json.as_bytes())
}

/// Merge `delta` into `base`; keys in `delta` overwrite.
pub fn merge(base: &mut Manifest, delta: Manifest) {
    base.extend(delta);
}

/// Load, merge `delta`, save. Returns the merged manifest.
///
/// Not synchronised: concurrent callers must serialise around it.
pub fn merge_into(path: &Path, delta: Manifest) -> Result<Manifest, AssetError> {
    let mut manifest = load_at(path)?;
    let added = delta.len();
    merge(&mut manifest, delta);
    save_at(path, &manifest)?;
    tracing::debug!(
        "manifest: merged {added} entr(y/ies), {} total at {}",
        manifest.len(),
        path.display()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(k: &str, v: &str) -> Manifest {
        Manifest::from([(k.to_string(), v.to_string())])
    }

    #[test]
    fn missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load_at(&tmp.path().join("rev-manifest.json")).unwrap().is_empty());
    }

    #[test]
    fn merge_keeps_prior_entries_and_last_write_wins() {
        let mut base = entry("images/a.png", "images/a-0000000000.png");
        base.insert("css/s.css".into(), "css/s-1111111111.css".into());
        merge(&mut base, entry("css/s.css", "css/s-2222222222.css"));
        assert_eq!(base["images/a.png"], "images/a-0000000000.png");
        assert_eq!(base["css/s.css"], "css/s-2222222222.css");
    }

    #[test]
    fn saved_json_has_sorted_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rev-manifest.json");
        let mut m = entry("z.js", "z-1.js");
        m.insert("a.css".into(), "a-1.css".into());
        save_at(&path, &m).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.find("a.css").unwrap() < text.find("z.js").unwrap());
        assert_eq!(load_at(&path).unwrap(), m);
    }

    #[test]
    fn corrupt_manifest_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rev-manifest.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_at(&path).unwrap_err();
        assert!(err.to_string().contains("rev-manifest.json"), "got: {err}");
    }
}
