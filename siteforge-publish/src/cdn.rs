//! CDN cache invalidation.

use siteforge_core::AwsEnv;

use crate::error::PublishError;
use crate::store::run_aws;

/// Something that can drop cached copies of paths at the edge.
pub trait CdnInvalidator: Send + Sync {
    /// Invalidate `paths` (each starting with `/`). An empty list is a no-op.
    fn invalidate(&self, paths: &[String]) -> Result<(), PublishError>;
}

/// `aws cloudfront create-invalidation` on one distribution.
#[derive(Debug, Clone)]
pub struct AwsCliInvalidator {
    env: AwsEnv,
    program: String,
}

impl AwsCliInvalidator {
    pub fn new(env: AwsEnv) -> Self {
        Self {
            env,
            program: "aws".into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn invalidate_args(&self, paths: &[String]) -> Vec<String> {
        let mut args = vec![
            "cloudfront".to_string(),
            "create-invalidation".to_string(),
            "--distribution-id".to_string(),
            self.env.distribution.clone(),
            "--paths".to_string(),
        ];
        args.extend(paths.iter().cloned());
        args
    }
}

impl CdnInvalidator for AwsCliInvalidator {
    fn invalidate(&self, paths: &[String]) -> Result<(), PublishError> {
        if paths.is_empty() {
            tracing::info!("cdn: nothing to invalidate");
            return Ok(());
        }
        let out = run_aws(&self.program, &self.env, &self.invalidate_args(paths))?;
        if !out.status.success() {
            return Err(PublishError::Invalidation {
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        tracing::info!(
            "cdn: invalidated {} path(s) on {}",
            paths.len(),
            self.env.distribution
        );
        Ok(())
    }
}

/// `/key` for every key.
pub fn invalidation_paths(keys: &[String]) -> Vec<String> {
    keys.iter().map(|k| format!("/{}", k.trim_start_matches('/'))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_become_rooted_paths() {
        let keys = vec!["index.html".to_string(), "2021/03/a/index.html.gz".to_string()];
        assert_eq!(
            invalidation_paths(&keys),
            vec!["/index.html", "/2021/03/a/index.html.gz"]
        );
    }

    #[test]
    fn args_name_the_distribution() {
        let inv = AwsCliInvalidator::new(AwsEnv {
            access_key_id: "a".into(),
            secret_access_key: "b".into(),
            region: "us-east-1".into(),
            bucket: "c".into(),
            distribution: "EDFDVBD6EXAMPLE".into(),
        });
        let args = inv.invalidate_args(&["/index.html".to_string()]);
        assert_eq!(
            args,
            vec![
                "cloudfront",
                "create-invalidation",
                "--distribution-id",
                "EDFDVBD6EXAMPLE",
                "--paths",
                "/index.html"
            ]
        );
    }

    #[test]
    fn empty_invalidation_never_runs_the_cli() {
        let inv = AwsCliInvalidator::new(AwsEnv {
            access_key_id: "a".into(),
            secret_access_key: "b".into(),
            region: "r".into(),
            bucket: "c".into(),
            distribution: "d".into(),
        })
        .with_program("siteforge-no-such-aws-binary");
        inv.invalidate(&[]).unwrap();
    }
}
