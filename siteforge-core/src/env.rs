//! Deployment settings read from the process environment.
//!
//! Validation is all-or-nothing and happens before any side effect: callers
//! resolve every variable through [`require_with`] up front and only then
//! start work.

use crate::error::CoreError;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION: &str = "AWS_REGION";
pub const S3_BUCKET: &str = "S3_BUCKET";
pub const CLOUDFRONT_DISTRIBUTION: &str = "CLOUDFRONT_DISTRIBUTION";
pub const PRODUCTION_ASSET_URL: &str = "PRODUCTION_ASSET_URL";

/// Variables needed to talk to object storage and the CDN, in check order.
pub const AWS_VARS: &[&str] = &[
    AWS_ACCESS_KEY_ID,
    AWS_SECRET_ACCESS_KEY,
    AWS_REGION,
    S3_BUCKET,
    CLOUDFRONT_DISTRIBUTION,
];

/// Every variable a full deploy needs.
pub const DEPLOY_VARS: &[&str] = &[
    AWS_ACCESS_KEY_ID,
    AWS_SECRET_ACCESS_KEY,
    AWS_REGION,
    S3_BUCKET,
    CLOUDFRONT_DISTRIBUTION,
    PRODUCTION_ASSET_URL,
];

/// Storage + CDN credentials and targets.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsEnv {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub distribution: String,
}

// Manual impl keeps the secret out of logs.
impl std::fmt::Debug for AwsEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsEnv")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("distribution", &self.distribution)
            .finish()
    }
}

impl AwsEnv {
    /// Resolve every AWS variable through `lookup`, failing on the first absent one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            access_key_id: require_with(&lookup, AWS_ACCESS_KEY_ID)?,
            secret_access_key: require_with(&lookup, AWS_SECRET_ACCESS_KEY)?,
            region: require_with(&lookup, AWS_REGION)?,
            bucket: require_with(&lookup, S3_BUCKET)?,
            distribution: require_with(&lookup, CLOUDFRONT_DISTRIBUTION)?,
        })
    }
}

/// Return the value of `var` or `CoreError::MissingEnv`. Empty counts as missing.
pub fn require_with<F>(lookup: &F, var: &'static str) -> Result<String, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CoreError::MissingEnv { var }),
    }
}

/// Strip trailing slashes so `<base>/<path>` never doubles them.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn full_env() -> HashMap<&'static str, String> {
        DEPLOY_VARS
            .iter()
            .map(|var| (*var, format!("value-of-{var}")))
            .collect()
    }

    #[test]
    fn complete_env_resolves() {
        let env = full_env();
        let aws = AwsEnv::from_lookup(|k| env.get(k).cloned()).expect("aws env");
        assert_eq!(aws.bucket, "value-of-S3_BUCKET");
        assert_eq!(aws.distribution, "value-of-CLOUDFRONT_DISTRIBUTION");
    }

    #[rstest]
    #[case(AWS_ACCESS_KEY_ID)]
    #[case(AWS_SECRET_ACCESS_KEY)]
    #[case(AWS_REGION)]
    #[case(S3_BUCKET)]
    #[case(CLOUDFRONT_DISTRIBUTION)]
    fn each_missing_var_is_reported(#[case] missing: &'static str) {
        let mut env = full_env();
        env.remove(missing);
        let err = AwsEnv::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        match err {
            CoreError::MissingEnv { var } => assert_eq!(var, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = full_env();
        env.insert(S3_BUCKET, "   ".into());
        let err = AwsEnv::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET ENV variable is missing"));
    }

    #[test]
    fn require_with_returns_the_value() {
        let env = full_env();
        let url = require_with(&|k: &str| env.get(k).cloned(), PRODUCTION_ASSET_URL).unwrap();
        assert_eq!(url, "value-of-PRODUCTION_ASSET_URL");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(normalize_base_url("https://cdn.example.com/"), "https://cdn.example.com");
        assert_eq!(normalize_base_url("https://cdn.example.com"), "https://cdn.example.com");
    }

    #[test]
    fn debug_output_hides_secret() {
        let env = full_env();
        let aws = AwsEnv::from_lookup(|k| env.get(k).cloned()).expect("aws env");
        let printed = format!("{aws:?}");
        assert!(!printed.contains("value-of-AWS_SECRET_ACCESS_KEY"));
    }
}
