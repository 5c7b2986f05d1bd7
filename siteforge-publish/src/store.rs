//! Object storage: the [`ObjectStore`] seam and its `aws s3` implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use mime_guess::mime;
use siteforge_core::{relative_key, AwsEnv};

use crate::error::PublishError;

// ---------------------------------------------------------------------------
// DeploymentObject
// ---------------------------------------------------------------------------

/// One build file as it will be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentObject {
    /// Object key: the build-relative path, `/` separated.
    pub key: String,
    pub path: PathBuf,
    pub content_type: String,
    /// `Some("gzip")` for `.gz` twins.
    pub content_encoding: Option<&'static str>,
    pub cache_control: String,
}

impl DeploymentObject {
    /// Describe `path` (under `build_dir`) for upload. `None` if the file is
    /// outside the build tree.
    pub fn for_file(build_dir: &Path, path: &Path, cache_control: &str) -> Option<Self> {
        let key = relative_key(build_dir, path)?;
        let (content_type, content_encoding) = match key.strip_suffix(".gz") {
            Some(inner) => (content_type_for(inner), Some("gzip")),
            None => (content_type_for(&key), None),
        };
        Some(Self {
            key,
            path: path.to_path_buf(),
            content_type,
            content_encoding,
            cache_control: cache_control.to_string(),
        })
    }

    /// Markup objects: `*.html` and their `*.html.gz` twins.
    pub fn is_markup(&self) -> bool {
        is_markup_key(&self.key)
    }
}

pub fn is_markup_key(key: &str) -> bool {
    key.ends_with(".html") || key.ends_with(".html.gz")
}

/// Content type guessed from the last extension of `name`. Textual types
/// carry `charset=utf-8`.
pub fn content_type_for(name: &str) -> String {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    let textual = mime.type_() == mime::TEXT || mime.subtype() == mime::JAVASCRIPT;
    if textual && mime.get_param(mime::CHARSET).is_none() {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Destination for published objects.
pub trait ObjectStore: Send + Sync {
    /// Bucket (or equivalent) name, used to scope the publish cache.
    fn bucket(&self) -> &str;

    /// Upload one object, overwriting any existing one with the same key.
    fn put(&self, object: &DeploymentObject) -> Result<(), PublishError>;
}

/// Uploads through the `aws` CLI. Credentials are passed in the child's
/// environment, never on the command line.
#[derive(Debug, Clone)]
pub struct AwsCliStore {
    env: AwsEnv,
    program: String,
}

impl AwsCliStore {
    pub fn new(env: AwsEnv) -> Self {
        Self {
            env,
            program: "aws".into(),
        }
    }

    /// Use a different executable (for wrappers such as `aws-vault exec`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments for uploading `object`.
    pub fn put_args(&self, object: &DeploymentObject) -> Vec<String> {
        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            object.path.display().to_string(),
            format!("s3://{}/{}", self.env.bucket, object.key),
            "--cache-control".to_string(),
            object.cache_control.clone(),
            "--content-type".to_string(),
            object.content_type.clone(),
        ];
        if let Some(encoding) = object.content_encoding {
            args.push("--content-encoding".to_string());
            args.push(encoding.to_string());
        }
        args.extend([
            "--region".to_string(),
            self.env.region.clone(),
            "--only-show-errors".to_string(),
        ]);
        args
    }
}

/// Run an `aws` subcommand with the credentials from `env`.
pub(crate) fn run_aws(
    program: &str,
    env: &AwsEnv,
    args: &[String],
) -> Result<std::process::Output, PublishError> {
    Command::new(program)
        .args(args)
        .env("AWS_ACCESS_KEY_ID", &env.access_key_id)
        .env("AWS_SECRET_ACCESS_KEY", &env.secret_access_key)
        .env("AWS_REGION", &env.region)
        .env("AWS_DEFAULT_REGION", &env.region)
        .output()
        .map_err(|source| PublishError::Spawn {
            program: program.to_string(),
            source,
        })
}

impl ObjectStore for AwsCliStore {
    fn bucket(&self) -> &str {
        &self.env.bucket
    }

    fn put(&self, object: &DeploymentObject) -> Result<(), PublishError> {
        let out = run_aws(&self.program, &self.env, &self.put_args(object))?;
        if !out.status.success() {
            return Err(PublishError::Upload {
                key: object.key.clone(),
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        tracing::info!("uploaded: {}", object.key);
        Ok(())
    }
}
