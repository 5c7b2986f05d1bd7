//! Named operations and the environment gate that runs before them.

use std::fmt;
use std::str::FromStr;

use siteforge_core::env::{self, AWS_VARS, PRODUCTION_ASSET_URL};
use siteforge_core::{AssetClass, AwsEnv, CoreError};

use crate::error::PipelineError;
use crate::graph::TaskGraph;
use crate::step::Step;

/// What the single positional command-line name selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Compile everything, then serve and watch.
    Default,
    Build,
    Optimize,
    Version,
    Gzip,
    Deploy,
    Clean,
    Serve,
    /// Any step invoked on its own.
    Single(Step),
}

impl Operation {
    pub const NAMES: &'static [&'static str] = &[
        "default",
        "build",
        "build:optimize",
        "build:version",
        "build:gzip",
        "build:deploy",
        "clean",
        "serve",
    ];

    /// Stages of the operation. Steps inside a stage run concurrently; each
    /// stage starts after the previous one completed.
    pub fn stages(&self) -> Vec<Vec<Step>> {
        match self {
            Operation::Default => vec![compile_all()],
            Operation::Build => vec![vec![Step::Clean], compile_all()],
            Operation::Optimize => optimize_stages(),
            Operation::Version => version_stages(),
            Operation::Gzip => vec![vec![Step::Gzip]],
            Operation::Deploy => {
                let mut stages = optimize_stages();
                stages.extend(version_stages());
                stages.extend([
                    vec![Step::Gzip],
                    vec![Step::PublishHtml],
                    vec![Step::PublishAssets],
                    vec![Step::InvalidateCdn],
                ]);
                stages
            }
            Operation::Clean => vec![vec![Step::Clean]],
            Operation::Serve => Vec::new(),
            Operation::Single(step) => vec![vec![*step]],
        }
    }

    pub fn graph(&self) -> TaskGraph {
        TaskGraph::from_stages(&self.stages())
    }

    pub fn steps(&self) -> Vec<Step> {
        self.stages().into_iter().flatten().collect()
    }

    /// Starts the dev server after its steps.
    pub fn serves(&self) -> bool {
        matches!(self, Operation::Default | Operation::Serve)
    }

    /// Rebuilds on source changes while serving.
    pub fn watches(&self) -> bool {
        matches!(self, Operation::Default)
    }

    /// Variables that must be present before anything runs, in check order.
    pub fn required_env(&self) -> Vec<&'static str> {
        let steps = self.steps();
        let mut vars = Vec::new();
        if steps.iter().any(Step::needs_aws) {
            vars.extend_from_slice(AWS_VARS);
        }
        if steps.iter().any(Step::needs_asset_url) {
            vars.push(PRODUCTION_ASSET_URL);
        }
        vars
    }
}

fn compile_all() -> Vec<Step> {
    AssetClass::all().iter().map(|c| Step::Compile(*c)).collect()
}

fn optimize_stages() -> Vec<Vec<Step>> {
    vec![
        vec![Step::Clean],
        compile_all(),
        vec![
            Step::Optimize(AssetClass::Styles),
            Step::Optimize(AssetClass::Scripts),
            Step::Optimize(AssetClass::Images),
            Step::Optimize(AssetClass::Templates),
        ],
    ]
}

/// Images and fonts first so the CSS/JS that reference them are rewritten
/// before CSS/JS are hashed themselves; HTML is rewritten last.
fn version_stages() -> Vec<Vec<Step>> {
    vec![
        vec![
            Step::Version(AssetClass::Images),
            Step::Version(AssetClass::Fonts),
        ],
        vec![
            Step::Replace(AssetClass::Styles),
            Step::Replace(AssetClass::Scripts),
        ],
        vec![
            Step::Version(AssetClass::Styles),
            Step::Version(AssetClass::Scripts),
        ],
        vec![Step::Replace(AssetClass::Templates)],
    ]
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Default => "default",
            Operation::Build => "build",
            Operation::Optimize => "build:optimize",
            Operation::Version => "build:version",
            Operation::Gzip => "build:gzip",
            Operation::Deploy => "build:deploy",
            Operation::Clean => "clean",
            Operation::Serve => "serve",
            Operation::Single(step) => return write!(f, "{step}"),
        };
        f.write_str(name)
    }
}

impl FromStr for Operation {
    type Err = PipelineError;

    /// Operation names win over step names (`build:gzip`, `clean`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => Operation::Default,
            "build" => Operation::Build,
            "build:optimize" => Operation::Optimize,
            "build:version" => Operation::Version,
            "build:gzip" => Operation::Gzip,
            "build:deploy" => Operation::Deploy,
            "clean" => Operation::Clean,
            "serve" => Operation::Serve,
            other => other
                .parse::<Step>()
                .map(Operation::Single)
                .map_err(|_| PipelineError::UnknownName(other.to_string()))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Environment gate
// ---------------------------------------------------------------------------

/// Environment resolved for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnv {
    pub asset_url: Option<String>,
    pub aws: Option<AwsEnv>,
}

/// Check every variable `op` needs, failing on the first one missing.
/// Nothing has run when this returns an error.
pub fn check_env<F>(op: &Operation, lookup: F) -> Result<ResolvedEnv, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = ResolvedEnv::default();
    let required = op.required_env();
    if required.is_empty() {
        return Ok(resolved);
    }
    for var in required.iter().copied() {
        env::require_with(&lookup, var)?;
    }
    if required.contains(&AWS_VARS[0]) {
        resolved.aws = Some(AwsEnv::from_lookup(&lookup)?);
    }
    if required.contains(&PRODUCTION_ASSET_URL) {
        let url = env::require_with(&lookup, PRODUCTION_ASSET_URL)?;
        resolved.asset_url = Some(env::normalize_base_url(&url));
    }
    Ok(resolved)
}
