//! Named build steps and the resources they touch.
//!
//! Every step can be invoked on its own by name (`styles:compile`,
//! `build:gzip`, ...). The resource declarations drive graph validation:
//! two steps that may run at the same time must not write the same resource.

use std::fmt;
use std::str::FromStr;

use siteforge_core::AssetClass;

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Something a step reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Source tree of one class.
    Source(AssetClass),
    /// Build outputs of one class.
    Build(AssetClass),
    /// The versioning manifest. Writers are serialised by the runner.
    Manifest,
    /// Remote storage and CDN.
    Remote,
}

impl Resource {
    /// Concurrent writers of this resource are safe.
    pub fn allows_concurrent_writers(&self) -> bool {
        matches!(self, Resource::Manifest)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Source(c) => write!(f, "{c} sources"),
            Resource::Build(c) => write!(f, "{c} build output"),
            Resource::Manifest => write!(f, "the manifest"),
            Resource::Remote => write!(f, "remote storage"),
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Clean,
    Compile(AssetClass),
    Optimize(AssetClass),
    Version(AssetClass),
    Replace(AssetClass),
    Gzip,
    PublishHtml,
    PublishAssets,
    InvalidateCdn,
}

const OPTIMIZABLE: &[AssetClass] = &[
    AssetClass::Styles,
    AssetClass::Scripts,
    AssetClass::Images,
    AssetClass::Templates,
];

const VERSIONABLE: &[AssetClass] = &[
    AssetClass::Images,
    AssetClass::Fonts,
    AssetClass::Styles,
    AssetClass::Scripts,
];

const REWRITABLE: &[AssetClass] = &[
    AssetClass::Styles,
    AssetClass::Scripts,
    AssetClass::Templates,
];

impl Step {
    /// Every valid step.
    pub fn all() -> Vec<Step> {
        let mut steps = vec![Step::Clean];
        steps.extend(AssetClass::all().iter().map(|c| Step::Compile(*c)));
        steps.extend(OPTIMIZABLE.iter().map(|c| Step::Optimize(*c)));
        steps.extend(VERSIONABLE.iter().map(|c| Step::Version(*c)));
        steps.extend(REWRITABLE.iter().map(|c| Step::Replace(*c)));
        steps.extend([
            Step::Gzip,
            Step::PublishHtml,
            Step::PublishAssets,
            Step::InvalidateCdn,
        ]);
        steps
    }

    /// The class/phase combination exists.
    pub fn is_valid(&self) -> bool {
        match self {
            Step::Optimize(c) => OPTIMIZABLE.contains(c),
            Step::Version(c) => VERSIONABLE.contains(c),
            Step::Replace(c) => REWRITABLE.contains(c),
            _ => true,
        }
    }

    pub fn reads(&self) -> Vec<Resource> {
        match *self {
            Step::Clean => vec![],
            Step::Compile(c) => vec![Resource::Source(c)],
            Step::Optimize(c) => vec![Resource::Build(c)],
            Step::Version(c) | Step::Replace(c) => vec![Resource::Build(c), Resource::Manifest],
            Step::Gzip => all_build(),
            Step::PublishHtml => vec![Resource::Build(AssetClass::Templates)],
            Step::PublishAssets => all_build()
                .into_iter()
                .filter(|r| *r != Resource::Build(AssetClass::Templates))
                .collect(),
            Step::InvalidateCdn => vec![Resource::Remote],
        }
    }

    pub fn writes(&self) -> Vec<Resource> {
        match *self {
            Step::Clean | Step::Gzip => all_build(),
            Step::Compile(c) | Step::Optimize(c) | Step::Replace(c) => vec![Resource::Build(c)],
            Step::Version(c) => vec![Resource::Build(c), Resource::Manifest],
            Step::PublishHtml | Step::PublishAssets | Step::InvalidateCdn => vec![Resource::Remote],
        }
    }

    /// Needs `PRODUCTION_ASSET_URL`.
    pub fn needs_asset_url(&self) -> bool {
        matches!(self, Step::Replace(_))
    }

    /// Needs storage/CDN credentials.
    pub fn needs_aws(&self) -> bool {
        matches!(
            self,
            Step::PublishHtml | Step::PublishAssets | Step::InvalidateCdn
        )
    }
}

fn all_build() -> Vec<Resource> {
    AssetClass::all().iter().map(|c| Resource::Build(*c)).collect()
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Clean => write!(f, "clean"),
            Step::Compile(c) => write!(f, "{c}:compile"),
            Step::Optimize(c) => write!(f, "{c}:optimize"),
            Step::Version(c) => write!(f, "{c}:version"),
            Step::Replace(c) => write!(f, "{c}:replace"),
            Step::Gzip => write!(f, "build:gzip"),
            Step::PublishHtml => write!(f, "build:s3:publish:html"),
            Step::PublishAssets => write!(f, "build:s3:publish:assets"),
            Step::InvalidateCdn => write!(f, "build:cdn:invalidate"),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = match s {
            "clean" => Step::Clean,
            "build:gzip" => Step::Gzip,
            "build:s3:publish:html" => Step::PublishHtml,
            "build:s3:publish:assets" => Step::PublishAssets,
            "build:cdn:invalidate" => Step::InvalidateCdn,
            other => {
                let (class, phase) = other
                    .split_once(':')
                    .ok_or_else(|| format!("unknown step '{other}'"))?;
                let class: AssetClass = class.parse()?;
                match phase {
                    "compile" => Step::Compile(class),
                    "optimize" => Step::Optimize(class),
                    "version" => Step::Version(class),
                    "replace" => Step::Replace(class),
                    _ => return Err(format!("unknown step '{other}'")),
                }
            }
        };
        if step.is_valid() {
            Ok(step)
        } else {
            Err(format!("there is no step '{s}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn every_step_name_parses_back() {
        for step in Step::all() {
            assert_eq!(step.to_string().parse::<Step>(), Ok(step));
        }
    }

    #[rstest]
    #[case("fonts:optimize")]
    #[case("html:version")]
    #[case("images:replace")]
    #[case("styles:deploy")]
    #[case("videos:compile")]
    #[case("deploy")]
    fn invalid_names_are_rejected(#[case] name: &str) {
        assert!(name.parse::<Step>().is_err(), "{name} parsed");
    }

    #[test]
    fn versioning_writes_the_manifest() {
        let w = Step::Version(AssetClass::Images).writes();
        assert!(w.contains(&Resource::Manifest));
        assert!(w.contains(&Resource::Build(AssetClass::Images)));
    }

    #[test]
    fn html_compile_is_named_after_display_of_templates() {
        assert_eq!(Step::Compile(AssetClass::Templates).to_string(), "html:compile");
    }
}
