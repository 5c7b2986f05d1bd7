//! siteforge renderer: templates, front matter, markdown, posts and the
//! site-wide index.
//!
//! - [`pages::compile_html`]: the `html:compile` step
//! - [`post::load_posts`] → [`SiteIndex::build`] → [`pages::render_site`]

pub mod context;
pub mod engine;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod pages;
pub mod post;

pub use context::{SiteContext, SiteIndex};
pub use engine::TemplateEngine;
pub use error::RenderError;
pub use frontmatter::FrontMatter;
pub use pages::{compile_html, Page};
pub use post::Post;
