//! Blog posts: `YYYY-MM-DD-slug` entries under the posts directory.
//!
//! A post is either a folder (`2021-03-04-hello/index.md`) or a single file
//! (`2021-03-04-hello.md`). Markdown and HTML bodies are both accepted. The
//! date and canonical URL come from the name, never from the body.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::error::{io_err, RenderError};
use crate::frontmatter::{parse_front_matter, FrontMatter};
use crate::markdown::render_markdown;

fn post_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").expect("post name regex"))
}

/// Split `2021-03-04-hello-world` into its date and slug.
pub fn parse_post_name(name: &str) -> Option<(NaiveDate, String)> {
    let caps = post_name_re().captures(name)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((date, caps[4].to_string()))
}

/// `/<year>/<month>/<slug>`
pub fn post_url(date: NaiveDate, slug: &str) -> String {
    format!("/{}/{}/{slug}", date.format("%Y"), date.format("%m"))
}

/// A loaded, markdown-rendered post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub slug: String,
    pub date: NaiveDate,
    pub url: String,
    pub front: FrontMatter,
    /// Rendered HTML body.
    pub content: String,
    pub source: PathBuf,
}

impl Post {
    /// Output path relative to the build root: `<year>/<month>/<slug>/index.html`.
    pub fn output_rel(&self) -> PathBuf {
        PathBuf::from(self.url.trim_start_matches('/')).join("index.html")
    }

    pub fn title(&self) -> &str {
        self.front.title.as_deref().unwrap_or(&self.slug)
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            title: self.title().to_string(),
            slug: self.slug.clone(),
            date: self.date.format("%Y-%m-%d").to_string(),
            url: self.url.clone(),
            tags: self.front.tags.clone(),
            content: self.content.clone(),
            extra: self.front.extra.clone(),
        }
    }
}

/// Template-facing view of a post (`posts` in every page context).
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub url: String,
    pub tags: Vec<String>,
    pub content: String,
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_yaml::Value>,
}

/// Load one post from its entry (folder or file) under the posts dir.
pub fn load_post(entry: &Path) -> Result<Post, RenderError> {
    let (name, body_path) = if entry.is_dir() {
        let name = file_name(entry);
        let body = ["index.md", "index.markdown", "index.html"]
            .iter()
            .map(|f| entry.join(f))
            .find(|p| p.is_file())
            .ok_or_else(|| io_err(entry.join("index.md"), std::io::ErrorKind::NotFound.into()))?;
        (name, body)
    } else {
        let name = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name, entry.to_path_buf())
    };

    let (date, slug) = parse_post_name(&name).ok_or_else(|| RenderError::PostName {
        path: entry.to_path_buf(),
    })?;

    let raw = std::fs::read_to_string(&body_path).map_err(|e| io_err(&body_path, e))?;
    let (front, body) = parse_front_matter(&raw, &body_path)?;
    let content = if is_markdown(&body_path) {
        render_markdown(body)
    } else {
        body.to_string()
    };

    Ok(Post {
        url: post_url(date, &slug),
        slug,
        date,
        front,
        content,
        source: body_path,
    })
}

/// Load every post under `posts_dir`, in directory order. A missing dir
/// yields no posts; entries that are neither post folders nor content files
/// are ignored.
pub fn load_posts(posts_dir: &Path) -> Result<Vec<Post>, RenderError> {
    if !posts_dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(posts_dir)
        .map_err(|e| io_err(posts_dir, e))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut posts = Vec::new();
    for entry in entries {
        if entry.is_file() && !is_content_file(&entry) {
            continue;
        }
        if file_name(&entry).starts_with('.') {
            continue;
        }
        posts.push(load_post(&entry)?);
    }
    tracing::debug!("loaded {} post(s) from {}", posts.len(), posts_dir.display());
    Ok(posts)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}

pub(crate) fn is_content_file(path: &Path) -> bool {
    is_markdown(path) || path.extension().and_then(|e| e.to_str()) == Some("html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("2021-03-04-hello-world", 2021, 3, 4, "hello-world")]
    #[case("1999-12-31-party", 1999, 12, 31, "party")]
    fn names_split_into_date_and_slug(
        #[case] name: &str,
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
        #[case] slug: &str,
    ) {
        let (date, s) = parse_post_name(name).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(s, slug);
    }

    #[rstest]
    #[case("hello-world")]
    #[case("2021-13-01-bad-month")]
    #[case("2021-03-04-")]
    fn bad_names_are_rejected(#[case] name: &str) {
        assert!(parse_post_name(name).is_none());
    }

    #[test]
    fn url_and_output_path_follow_the_date() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2021-03-04-hello");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.md"), "---\ntitle: Hi\n---\n*x*").unwrap();

        let post = load_post(&dir).unwrap();
        assert_eq!(post.url, "/2021/03/hello");
        assert_eq!(post.output_rel(), PathBuf::from("2021/03/hello/index.html"));
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
        assert_eq!(post.content, "<p><em>x</em></p>\n");
        assert_eq!(post.title(), "Hi");
    }

    #[test]
    fn single_file_posts_are_supported() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("2020-01-02-solo.md"), "text").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "solo");
        assert_eq!(posts[0].title(), "solo");
    }

    #[test]
    fn misnamed_post_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("draft.md"), "text").unwrap();
        let err = load_posts(tmp.path()).unwrap_err();
        assert!(matches!(err, RenderError::PostName { .. }), "got: {err}");
    }
}
