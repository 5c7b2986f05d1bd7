//! html:compile end to end, for both project layouts.

use assert_fs::prelude::*;
use predicates::prelude::*;
use siteforge_core::{ContentConfig, ProjectConfig, ProjectPaths};
use siteforge_renderer::compile_html;

const LAYOUT: &str = r#"<html><title>{{ title }} | {{ site_name }}</title><body>{% block body %}{{ content }}{% endblock %}</body></html>"#;

const POST_LAYOUT: &str = r#"{% extends "layout.html" %}{% block body %}<article data-url="{{ url }}">{{ content }}</article>{% endblock %}"#;

const INDEX_PAGE: &str = r#"---
title: Home
---
{% extends "layout.html" %}{% block body %}{% for p in posts %}<a href="{{ p.url }}">{{ p.title }}</a>{% endfor %}|{% for t in tags %}{{ t }},{% endfor %}{% endblock %}"#;

// ---------------------------------------------------------------------------
// 1. Content layout
// ---------------------------------------------------------------------------

fn content_project() -> (assert_fs::TempDir, ProjectPaths, ProjectConfig) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("src/templates/layout.html").write_str(LAYOUT).expect("layout");
    root.child("src/templates/post.html").write_str(POST_LAYOUT).expect("post layout");
    root.child("src/site.yaml")
        .write_str("site_name: Forge\ntitle: Default\n")
        .expect("site");
    root.child("src/pages/index.html").write_str(INDEX_PAGE).expect("index");
    root.child("src/posts/2020-05-01-older/index.md")
        .write_str("---\ntitle: Older\ntags: [rust]\n---\nold *body*\n")
        .expect("older");
    root.child("src/posts/2021-02-03-newer.md")
        .write_str("---\ntitle: Newer\ntags: [web, rust]\n---\nnew body\n")
        .expect("newer");

    let config = ProjectConfig {
        content: Some(ContentConfig::default()),
        ..ProjectConfig::default()
    };
    let paths = ProjectPaths::resolve(root.path(), &config);
    (root, paths, config)
}

#[test]
fn posts_render_to_dated_paths_through_the_post_layout() {
    let (root, paths, config) = content_project();
    compile_html(&paths, &config).expect("compile");

    root.child("build/2020/05/older/index.html").assert(
        predicate::str::contains(r#"<article data-url="/2020/05/older"><p>old <em>body</em></p>"#)
            .and(predicate::str::contains("<title>Older | Forge</title>")),
    );
    root.child("build/2021/02/newer/index.html")
        .assert(predicate::path::exists());
}

#[test]
fn index_lists_posts_newest_first_with_sorted_tags() {
    let (root, paths, config) = content_project();
    compile_html(&paths, &config).expect("compile");

    root.child("build/index.html").assert(predicate::str::contains(
        r#"<a href="/2021/02/newer">Newer</a><a href="/2020/05/older">Older</a>|rust,web,"#,
    ));
    root.child("build/index.html")
        .assert(predicate::str::contains("<title>Home | Forge</title>"));
}

#[test]
fn missing_post_layout_fails_the_step() {
    let (root, paths, mut config) = content_project();
    if let Some(content) = config.content.as_mut() {
        content.post_layout = "missing.html".into();
    }
    let err = compile_html(&paths, &config).unwrap_err();
    assert!(err.to_string().contains("template"), "got: {err}");
    root.child("build/2020/05/older/index.html")
        .assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 2. Template-only layout
// ---------------------------------------------------------------------------

#[test]
fn src_html_is_rendered_but_templates_are_not() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("src/templates/layout.html")
        .write_str("<body>{% block body %}{% endblock %}</body>")
        .expect("layout");
    root.child("src/about.html")
        .write_str(r#"{% extends "layout.html" %}{% block body %}About us{% endblock %}"#)
        .expect("about");
    root.child("src/assets/js/widget.html").write_str("raw").expect("asset");

    let config = ProjectConfig::default();
    let paths = ProjectPaths::resolve(root.path(), &config);
    let written = compile_html(&paths, &config).expect("compile");

    assert_eq!(written, vec![paths.build.join("about.html")]);
    root.child("build/about.html")
        .assert(predicate::str::contains("<body>About us</body>"));
    root.child("build/templates/layout.html")
        .assert(predicate::path::missing());
    root.child("build/assets/js/widget.html")
        .assert(predicate::path::missing());
}
