//! `html:compile` for both project layouts.
//!
//! Without a `content:` section every `src/**/*.html` outside the templates
//! and assets directories is rendered as a template into the same relative
//! path under the build root. With one, pages and posts go through
//! [`build_content`]: load posts, build the [`SiteIndex`], render everything
//! against one [`SiteContext`].

use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use siteforge_assets::writer::atomic_write;
use siteforge_core::{relative_key, ContentConfig, ProjectConfig, ProjectPaths};

use crate::context::{load_site_data, SiteContext, SiteIndex};
use crate::engine::TemplateEngine;
use crate::error::{io_err, RenderError};
use crate::frontmatter::{parse_front_matter, FrontMatter};
use crate::markdown::render_markdown;
use crate::post::{is_content_file, is_markdown, load_posts};

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A page source with its front matter stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Source path relative to its root, `/` separated.
    pub rel: String,
    pub front: FrontMatter,
    pub body: String,
    pub markdown: bool,
}

impl Page {
    /// Output path relative to the build root (`.md` becomes `.html`).
    pub fn output_rel(&self) -> PathBuf {
        let rel = PathBuf::from(&self.rel);
        if self.markdown {
            rel.with_extension("html")
        } else {
            rel
        }
    }

    /// Site URL: `/about.html`, and `/blog/` for `blog/index.html`.
    pub fn url(&self) -> String {
        let out = self.output_rel().to_string_lossy().replace('\\', "/");
        match out.strip_suffix("index.html") {
            Some(dir) => format!("/{dir}"),
            None => format!("/{out}"),
        }
    }
}

fn read_page(root: &Path, path: &Path) -> Result<Option<Page>, RenderError> {
    let Some(rel) = relative_key(root, path) else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let (front, body) = parse_front_matter(&raw, path)?;
    Ok(Some(Page {
        rel,
        front,
        body: body.to_string(),
        markdown: is_markdown(path),
    }))
}

/// Collect content files under `root`, skipping any path under `exclude`.
fn collect_pages(
    root: &Path,
    exclude: &[&Path],
    accept: fn(&Path) -> bool,
) -> Result<Vec<Page>, RenderError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut pages = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !exclude.iter().any(|x| e.path().starts_with(x)));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() || !accept(entry.path()) {
            continue;
        }
        if let Some(page) = read_page(root, entry.path())? {
            pages.push(page);
        }
    }
    Ok(pages)
}

fn is_html(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("html")
}

/// Every `.html`/`.md` page under `pages_dir`.
pub fn load_pages(pages_dir: &Path) -> Result<Vec<Page>, RenderError> {
    collect_pages(pages_dir, &[], is_content_file)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_output(path: &Path, contents: &str) -> Result<(), RenderError> {
    atomic_write(path, contents.as_bytes())?;
    tracing::debug!("rendered: {}", path.display());
    Ok(())
}

fn wrap_in_layout(
    engine: &TemplateEngine,
    site: &SiteContext,
    front: &FrontMatter,
    layout: Option<&str>,
    content: String,
    url: &str,
) -> Result<String, RenderError> {
    match layout {
        Some(layout) => engine.render(layout, &site.page_context(front, &content, url)?),
        None => Ok(content),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render every page and post into `build_dir`. Returns written files.
pub fn render_site(
    engine: &TemplateEngine,
    site: &SiteContext,
    index: &SiteIndex,
    pages: &[Page],
    post_layout: &str,
    build_dir: &Path,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();

    for page in pages {
        let url = page.url();
        let content = if page.markdown {
            render_markdown(&page.body)
        } else {
            engine.render_page(&page.rel, &site.page_context(&page.front, "", &url)?)?
        };
        let html = wrap_in_layout(
            engine,
            site,
            &page.front,
            page.front.layout.as_deref(),
            content,
            &url,
        )?;
        let out = build_dir.join(page.output_rel());
        write_output(&out, &html)?;
        written.push(out);
    }

    for post in &index.posts {
        let layout = post.front.layout.as_deref().unwrap_or(post_layout);
        let html = wrap_in_layout(
            engine,
            site,
            &post.front,
            Some(layout),
            post.content.clone(),
            &post.url,
        )?;
        let out = build_dir.join(post.output_rel());
        write_output(&out, &html)?;
        written.push(out);
    }

    Ok(written)
}

/// Content pipeline: pages, posts, tags and site data.
pub fn build_content(
    paths: &ProjectPaths,
    content: &ContentConfig,
) -> Result<Vec<PathBuf>, RenderError> {
    let site_data = load_site_data(&paths.site_data(content))?;
    let index = SiteIndex::build(load_posts(&paths.posts_dir(content))?);
    let pages = load_pages(&paths.pages_dir(content))?;

    let page_sources: Vec<(String, String)> = pages
        .iter()
        .filter(|p| !p.markdown)
        .map(|p| (p.rel.clone(), p.body.clone()))
        .collect();
    let engine = TemplateEngine::new(&paths.templates, &page_sources)?;
    let site = SiteContext::new(site_data, &index, Utc::now())?;

    let written = render_site(
        &engine,
        &site,
        &index,
        &pages,
        &content.post_layout,
        &paths.build,
    )?;
    tracing::info!(
        "html: {} page(s), {} post(s), {} tag(s)",
        pages.len(),
        index.posts.len(),
        index.tags.len()
    );
    Ok(written)
}

/// Template-only layout: render `src/**/*.html` outside templates/assets.
pub fn compile_templates(paths: &ProjectPaths) -> Result<Vec<PathBuf>, RenderError> {
    let exclude = [
        paths.templates.as_path(),
        paths.assets.as_path(),
        paths.build.as_path(),
    ];
    let pages = collect_pages(&paths.src, &exclude, is_html)?;
    let page_sources: Vec<(String, String)> = pages
        .iter()
        .map(|p| (p.rel.clone(), p.body.clone()))
        .collect();
    let engine = TemplateEngine::new(&paths.templates, &page_sources)?;
    let site = SiteContext::new(Default::default(), &SiteIndex::default(), Utc::now())?;
    let written = render_site(&engine, &site, &SiteIndex::default(), &pages, "", &paths.build)?;
    tracing::info!("html: {} template(s)", written.len());
    Ok(written)
}

/// `html:compile`, dispatching on whether the content pipeline is configured.
pub fn compile_html(
    paths: &ProjectPaths,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, RenderError> {
    match &config.content {
        Some(content) => build_content(paths, content),
        None => compile_templates(paths),
    }
}
