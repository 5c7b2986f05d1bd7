//! Render context: site-wide data plus the page being rendered.
//!
//! The [`SiteIndex`] is built once from the loaded posts and threaded into
//! every render; nothing accumulates globally.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{io_err, RenderError};
use crate::frontmatter::FrontMatter;
use crate::post::{Post, PostSummary};

// ---------------------------------------------------------------------------
// SiteIndex
// ---------------------------------------------------------------------------

/// Posts sorted newest first, plus the deduplicated tag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteIndex {
    pub posts: Vec<Post>,
    pub tags: BTreeSet<String>,
}

impl SiteIndex {
    /// Sort by descending date (ties by slug) and collect tags.
    pub fn build(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        let tags = posts
            .iter()
            .flat_map(|p| p.front.tags.iter().cloned())
            .collect();
        Self { posts, tags }
    }

    pub fn summaries(&self) -> Vec<PostSummary> {
        self.posts.iter().map(Post::summary).collect()
    }
}

// ---------------------------------------------------------------------------
// SiteContext
// ---------------------------------------------------------------------------

/// Values shared by every page of one build.
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Top-level keys from the site metadata file.
    pub site: Map<String, Value>,
    pub now: DateTime<Utc>,
    posts: Value,
    tags: Value,
}

impl SiteContext {
    pub fn new(
        site: Map<String, Value>,
        index: &SiteIndex,
        now: DateTime<Utc>,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            site,
            now,
            posts: serde_json::to_value(index.summaries())?,
            tags: serde_json::to_value(&index.tags)?,
        })
    }

    /// Context for a page: site data, then `now`/`posts`/`tags`, then the
    /// page's own front matter on top, then `content` and `url`.
    pub fn page_context(
        &self,
        front: &FrontMatter,
        content: &str,
        url: &str,
    ) -> Result<tera::Context, RenderError> {
        let mut map = self.site.clone();
        map.insert("now".into(), Value::String(self.now.to_rfc3339()));
        map.insert("posts".into(), self.posts.clone());
        map.insert("tags".into(), self.tags.clone());

        let page = serde_json::to_value(front)?;
        if let Value::Object(fields) = &page {
            for (k, v) in fields {
                map.insert(k.clone(), v.clone());
            }
        }
        map.insert("page".into(), page);
        map.insert("content".into(), Value::String(content.to_string()));
        map.insert("url".into(), Value::String(url.to_string()));

        Ok(tera::Context::from_value(Value::Object(map))?)
    }
}

/// Load the site metadata file. A missing file is an empty mapping.
pub fn load_site_data(path: &Path) -> Result<Map<String, Value>, RenderError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(&raw).map_err(|e| RenderError::SiteData {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RenderError::SiteData {
            path: path.to_path_buf(),
            message: "expected a mapping at the top level".into(),
        }),
    }
}
