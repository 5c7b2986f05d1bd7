//! Front matter: a `---` delimited YAML block at the head of a content file.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

const DELIMITER: &str = "---";

/// Metadata stripped from the head of a page or post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Layout template wrapping the rendered content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Any other keys, exposed to templates unchanged.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Split `content` into `(front matter, body)`.
///
/// The opening `---` must be the first line and the closing `---` must sit on
/// its own line. Without both, the whole input is body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix(DELIMITER)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse the front matter of `content`, returning it with the remaining body.
/// Content without a block gets [`FrontMatter::default`].
pub fn parse_front_matter<'a>(
    content: &'a str,
    path: &Path,
) -> Result<(FrontMatter, &'a str), RenderError> {
    match split_front_matter(content) {
        (Some(yaml), body) if yaml.trim().is_empty() => Ok((FrontMatter::default(), body)),
        (Some(yaml), body) => {
            let front = serde_yaml::from_str(yaml).map_err(|source| RenderError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((front, body))
        }
        (None, body) => Ok((FrontMatter::default(), body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_stripped_from_body() {
        let src = "---\ntitle: Hello\ntags: [rust, web]\nhero: big.png\n---\n# Body\n";
        let (front, body) = parse_front_matter(src, Path::new("a.md")).unwrap();
        assert_eq!(front.title.as_deref(), Some("Hello"));
        assert_eq!(front.tags, vec!["rust", "web"]);
        assert_eq!(
            front.extra.get("hero").and_then(|v| v.as_str()),
            Some("big.png")
        );
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn no_block_means_default_and_full_body() {
        let (front, body) = parse_front_matter("<p>hi</p>", Path::new("a.html")).unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, "<p>hi</p>");
    }

    #[test]
    fn horizontal_rule_in_body_is_not_a_delimiter() {
        let src = "intro\n---\nmore";
        assert_eq!(split_front_matter(src), (None, src));
    }

    #[test]
    fn unclosed_block_is_body() {
        let src = "---\ntitle: x\nno end";
        assert_eq!(split_front_matter(src), (None, src));
    }

    #[test]
    fn date_parses_as_calendar_date() {
        let src = "---\ndate: 2021-03-04\n---\n";
        let (front, _) = parse_front_matter(src, Path::new("a.md")).unwrap();
        assert_eq!(front.date, NaiveDate::from_ymd_opt(2021, 3, 4));
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let src = "---\ntags: [unclosed\n---\n";
        let err = parse_front_matter(src, Path::new("posts/bad.md")).unwrap_err();
        assert!(err.to_string().contains("posts/bad.md"), "got: {err}");
    }
}
