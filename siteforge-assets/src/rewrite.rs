//! Reference rewriting: replace manifest keys inside build files with their
//! versioned paths.
//!
//! A directory-rooted occurrence (`/css/styles.css`, the `/` starting an
//! absolute path) becomes `<base>/css/styles-<hash>.css`. Any other
//! occurrence (`../images/a.png`) becomes the hashed path only. A key
//! embedded in a longer name (`css/styles.css.map`, `mycss/styles.css`) is
//! left untouched. Longer keys win over shorter ones at the same position.
//!
//! Hashed values never contain their key, so rewriting is idempotent.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{io_err, AssetError};
use crate::manifest::Manifest;
use crate::writer::{atomic_write, collect_with_extension};

/// Compiled rewriter for one manifest + base URL.
#[derive(Debug)]
pub struct Rewriter {
    pattern: Option<Regex>,
    manifest: Manifest,
    base_url: String,
}

impl Rewriter {
    pub fn new(manifest: &Manifest, base_url: &str) -> Result<Self, AssetError> {
        let mut keys: Vec<&str> = manifest.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };
        Ok(Self {
            pattern,
            manifest: manifest.clone(),
            base_url: siteforge_core::env::normalize_base_url(base_url),
        })
    }

    /// Rewrite `text`, returning the new text and the number of replacements.
    pub fn rewrite_str(&self, text: &str) -> (String, usize) {
        let Some(pattern) = &self.pattern else {
            return (text.to_string(), 0);
        };
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut pos = 0;
        let mut count = 0;

        while let Some(m) = pattern.find_at(text, pos) {
            let (start, end) = (m.start(), m.end());
            if !standalone(bytes, start, end) {
                pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let Some(value) = self.manifest.get(m.as_str()) else {
                pos = end;
                continue;
            };
            if start > copied && is_rooted(bytes, start) {
                out.push_str(&text[copied..start - 1]);
                out.push_str(&self.base_url);
                out.push('/');
            } else {
                out.push_str(&text[copied..start]);
            }
            out.push_str(value);
            copied = end;
            pos = end;
            count += 1;
        }
        out.push_str(&text[copied..]);
        (out, count)
    }

    /// Rewrite one file in place; only written when something changed.
    pub fn rewrite_file(&self, path: &Path) -> Result<usize, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let (rewritten, count) = self.rewrite_str(&text);
        if count > 0 && rewritten != text {
            atomic_write(path, rewritten.as_bytes())?;
            tracing::debug!("rewrote {count} reference(s) in {}", path.display());
        }
        Ok(count)
    }
}

/// Rewrite every `*.<ext>` file under `build_root`. Returns changed files.
pub fn rewrite_build(
    build_root: &Path,
    ext: &str,
    manifest: &Manifest,
    base_url: &str,
) -> Result<Vec<PathBuf>, AssetError> {
    let rewriter = Rewriter::new(manifest, base_url)?;
    let mut changed = Vec::new();
    for file in collect_with_extension(build_root, ext)? {
        if rewriter.rewrite_file(&file)? > 0 {
            changed.push(file);
        }
    }
    tracing::info!("{ext}: rewrote references in {} file(s)", changed.len());
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_path_byte(b: u8) -> bool {
    is_name_byte(b) || b == b'.' || b == b'/' || b == b':' || b == b'~'
}

/// The match is not part of a longer file or directory name.
fn standalone(bytes: &[u8], start: usize, end: usize) -> bool {
    if start > 0 {
        let before = bytes[start - 1];
        if is_name_byte(before) || before == b'.' {
            return false;
        }
    }
    match bytes.get(end) {
        Some(&b) if is_name_byte(b) => false,
        Some(b'.') => !bytes.get(end + 1).is_some_and(|b| is_name_byte(*b)),
        _ => true,
    }
}

/// The byte before `start` is a `/` that itself begins an absolute path.
fn is_rooted(bytes: &[u8], start: usize) -> bool {
    if start == 0 || bytes[start - 1] != b'/' {
        return false;
    }
    start == 1 || !is_path_byte(bytes[start - 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "https://cdn.example.com";

    fn manifest() -> Manifest {
        Manifest::from([
            ("css/styles.css".to_string(), "css/styles-1a2b3c4d5e.css".to_string()),
            ("images/a.png".to_string(), "images/a-0f0f0f0f0f.png".to_string()),
            ("images/a.png.webp".to_string(), "images/a.png-9999999999.webp".to_string()),
        ])
    }

    fn rewrite(text: &str) -> String {
        Rewriter::new(&manifest(), BASE).unwrap().rewrite_str(text).0
    }

    #[rstest]
    #[case(
        r#"<link href="/css/styles.css">"#,
        r#"<link href="https://cdn.example.com/css/styles-1a2b3c4d5e.css">"#
    )]
    #[case(
        "background: url(../images/a.png);",
        "background: url(../images/a-0f0f0f0f0f.png);"
    )]
    #[case(
        "url('/images/a.png.webp')",
        "url('https://cdn.example.com/images/a.png-9999999999.webp')"
    )]
    #[case("css/styles.css.map", "css/styles.css.map")]
    #[case("/mycss/styles.css", "/mycss/styles.css")]
    #[case("/css/styles.css?v=2", "https://cdn.example.com/css/styles-1a2b3c4d5e.css?v=2")]
    #[case("see css/styles.css.", "see css/styles-1a2b3c4d5e.css.")]
    fn rewrite_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rewrite(input), expected);
    }

    #[test]
    fn every_occurrence_is_counted() {
        let r = Rewriter::new(&manifest(), BASE).unwrap();
        let (out, n) = r.rewrite_str("/css/styles.css /css/styles.css css/styles.css");
        assert_eq!(n, 3);
        assert_eq!(out.matches("styles-1a2b3c4d5e.css").count(), 3);
    }

    #[test]
    fn rewriting_twice_equals_rewriting_once() {
        let text = r#"<img src="/images/a.png"><a href="../css/styles.css">"#;
        let once = rewrite(text);
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn empty_manifest_is_identity() {
        let r = Rewriter::new(&Manifest::new(), BASE).unwrap();
        assert_eq!(r.rewrite_str("/css/styles.css"), ("/css/styles.css".to_string(), 0));
    }

    #[test]
    fn base_url_trailing_slash_is_not_doubled() {
        let r = Rewriter::new(&manifest(), "https://cdn.example.com/").unwrap();
        let (out, _) = r.rewrite_str("/css/styles.css");
        assert_eq!(out, "https://cdn.example.com/css/styles-1a2b3c4d5e.css");
    }
}
