//! Tera rendering engine.
//!
//! Layouts and partials are loaded from the templates directory under their
//! path relative to it (`layout.html`, `partials/nav.html`), so pages can
//! `{% extends "layout.html" %}`. Pages themselves are registered under
//! [`PAGE_PREFIX`] to keep them apart from layouts of the same name.
//!
//! Autoescaping is off: `{{ content }}` is already HTML.

use std::path::Path;

use tera::Tera;
use walkdir::WalkDir;

use siteforge_core::relative_key;

use crate::error::{io_err, RenderError};

/// Name prefix for page templates.
pub const PAGE_PREFIX: &str = "@page/";

/// Template name under which a page source is registered.
pub fn page_template_name(rel: &str) -> String {
    format!("{PAGE_PREFIX}{rel}")
}

fn load_layouts(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut templates = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = relative_key(dir, entry.path()) else {
            continue;
        };
        let contents =
            std::fs::read_to_string(entry.path()).map_err(|e| io_err(entry.path(), e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

/// Tera-based engine over one templates directory plus registered pages.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load every file under `templates_dir` and register `pages`
    /// (`(relative source path, template body)`) in one batch, so
    /// inheritance between any of them resolves.
    pub fn new(templates_dir: &Path, pages: &[(String, String)]) -> Result<Self, RenderError> {
        let mut templates = load_layouts(templates_dir)?;
        templates.extend(
            pages
                .iter()
                .map(|(rel, body)| (page_template_name(rel), body.clone())),
        );

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)?;
        Ok(TemplateEngine { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a layout or partial by name.
    pub fn render(&self, name: &str, ctx: &tera::Context) -> Result<String, RenderError> {
        Ok(self.tera.render(name, ctx)?)
    }

    /// Render a registered page.
    pub fn render_page(&self, rel: &str, ctx: &tera::Context) -> Result<String, RenderError> {
        self.render(&page_template_name(rel), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pages_extend_layouts_from_the_templates_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("layout.html"),
            "<main>{% block body %}{% endblock %}</main>",
        )
        .unwrap();
        let pages = vec![(
            "index.html".to_string(),
            r#"{% extends "layout.html" %}{% block body %}{{ greeting }}{% endblock %}"#
                .to_string(),
        )];
        let engine = TemplateEngine::new(tmp.path(), &pages).unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("greeting", "<b>hi</b>");
        let out = engine.render_page("index.html", &ctx).unwrap();
        assert_eq!(out, "<main><b>hi</b></main>");
    }

    #[test]
    fn nested_templates_use_forward_slash_names() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("partials")).unwrap();
        std::fs::write(tmp.path().join("partials").join("nav.html"), "<nav/>").unwrap();
        let engine = TemplateEngine::new(tmp.path(), &[]).unwrap();
        assert!(engine.has_template("partials/nav.html"));
    }

    #[test]
    fn missing_templates_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let engine = TemplateEngine::new(&tmp.path().join("none"), &[]).unwrap();
        assert!(!engine.has_template("layout.html"));
    }
}
