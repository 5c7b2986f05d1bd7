//! The production [`StepRunner`]: dispatches each step to the asset,
//! renderer and publish crates.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use siteforge_assets::{compile, manifest, optimize, rewrite, version};
use siteforge_core::env::{CLOUDFRONT_DISTRIBUTION, PRODUCTION_ASSET_URL, S3_BUCKET};
use siteforge_core::{AssetClass, AwsEnv, CoreError, ProjectConfig, ProjectPaths};
use siteforge_publish::{
    gzip, invalidation_paths, publish, CdnInvalidator, ObjectStore, PublishRequest, PublishScope,
};
use siteforge_renderer::compile_html;

use crate::error::StepError;
use crate::operation::{check_env, Operation};
use crate::scheduler::{StepOutput, StepRunner};
use crate::step::Step;

pub struct BuildRunner {
    paths: ProjectPaths,
    config: ProjectConfig,
    asset_url: Option<String>,
    store: Option<Arc<dyn ObjectStore>>,
    cdn: Option<Arc<dyn CdnInvalidator>>,
    manifest_lock: Mutex<()>,
}

impl BuildRunner {
    pub fn new(paths: ProjectPaths, config: ProjectConfig) -> Self {
        Self {
            paths,
            config,
            asset_url: None,
            store: None,
            cdn: None,
            manifest_lock: Mutex::new(()),
        }
    }

    /// Base URL prefixed to rooted references by the `*:replace` steps.
    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = Some(url.into());
        self
    }

    pub fn with_publisher(
        mut self,
        store: Arc<dyn ObjectStore>,
        cdn: Arc<dyn CdnInvalidator>,
    ) -> Self {
        self.store = Some(store);
        self.cdn = Some(cdn);
        self
    }

    /// Check every variable `op` needs, then build its runner. `connect` is
    /// only called once the storage and CDN settings are all present, so a
    /// missing variable never reaches a store or CDN client.
    pub fn for_operation<L, C>(
        op: &Operation,
        paths: ProjectPaths,
        config: ProjectConfig,
        lookup: L,
        connect: C,
    ) -> Result<Self, CoreError>
    where
        L: Fn(&str) -> Option<String>,
        C: FnOnce(AwsEnv) -> (Arc<dyn ObjectStore>, Arc<dyn CdnInvalidator>),
    {
        let env = check_env(op, lookup)?;
        let mut runner = Self::new(paths, config);
        if let Some(url) = env.asset_url {
            runner = runner.with_asset_url(url);
        }
        if let Some(aws) = env.aws {
            let (store, cdn) = connect(aws);
            runner = runner.with_publisher(store, cdn);
        }
        Ok(runner)
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    fn lock_manifest(&self) -> MutexGuard<'_, ()> {
        self.manifest_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clean(&self) -> Result<StepOutput, StepError> {
        let build = &self.paths.build;
        if build.exists() {
            std::fs::remove_dir_all(build).map_err(|e| StepError::Io {
                path: build.clone(),
                source: e,
            })?;
            tracing::info!("removed {}", build.display());
        }
        Ok(StepOutput::default())
    }

    fn compile(&self, class: AssetClass) -> Result<StepOutput, StepError> {
        let files = match class {
            AssetClass::Styles => compile::compile_styles(&self.paths, &self.config)?,
            AssetClass::Scripts => compile::compile_scripts(&self.paths, &self.config)?,
            AssetClass::Images | AssetClass::Fonts => compile::copy_class(&self.paths, class)?,
            AssetClass::Templates => compile_html(&self.paths, &self.config)?,
        };
        Ok(StepOutput::files(files))
    }

    fn optimize(&self, class: AssetClass) -> Result<StepOutput, StepError> {
        let files = match class {
            AssetClass::Styles => optimize::optimize_styles(&self.paths, &self.config)?,
            AssetClass::Scripts => optimize::optimize_scripts(&self.paths)?,
            AssetClass::Images => optimize::optimize_images(&self.paths, &self.config)?,
            AssetClass::Templates => optimize::optimize_markup(&self.paths)?,
            AssetClass::Fonts => return Err(StepError::Unsupported(Step::Optimize(class))),
        };
        Ok(StepOutput::files(files))
    }

    /// Version one build folder and merge the delta into the manifest. The
    /// load/rename/merge sequence runs under the manifest lock.
    fn version(&self, class: AssetClass) -> Result<StepOutput, StepError> {
        let _guard = self.lock_manifest();
        let known = manifest::load_at(&self.paths.manifest)?;
        let delta = version::version_folder(&self.paths.build, class.build_folder(), &known)?;
        let files: Vec<PathBuf> = delta.values().map(|v| self.paths.build.join(v)).collect();
        let merged = manifest::merge_into(&self.paths.manifest, delta)?;
        tracing::info!(
            "{class}: versioned {} file(s), manifest has {} entries",
            files.len(),
            merged.len()
        );
        Ok(StepOutput::files(files))
    }

    fn replace(&self, class: AssetClass) -> Result<StepOutput, StepError> {
        let ext = class
            .rewrite_extension()
            .ok_or(StepError::Unsupported(Step::Replace(class)))?;
        let base = self.asset_url.as_deref().ok_or(CoreError::MissingEnv {
            var: PRODUCTION_ASSET_URL,
        })?;
        let current = {
            let _guard = self.lock_manifest();
            manifest::load_at(&self.paths.manifest)?
        };
        let files = rewrite::rewrite_build(&self.paths.build, ext, &current, base)?;
        Ok(StepOutput::files(files))
    }

    fn publish(&self, scope: PublishScope) -> Result<StepOutput, StepError> {
        let store = self
            .store
            .as_ref()
            .ok_or(CoreError::MissingEnv { var: S3_BUCKET })?;
        let cache_path = self.paths.publish_cache();
        let request = PublishRequest {
            build_dir: &self.paths.build,
            cache_path: &cache_path,
            cache_control: &self.config.publish.cache_control,
            scope,
        };
        let report = publish(store.as_ref(), &request)?;
        let invalidate = match scope {
            PublishScope::Markup => invalidation_paths(&report.uploaded),
            PublishScope::Assets => Vec::new(),
        };
        Ok(StepOutput {
            files: Vec::new(),
            published: report.uploaded,
            invalidate,
        })
    }

    fn invalidate(&self, inputs: &[(Step, StepOutput)]) -> Result<StepOutput, StepError> {
        let cdn = self.cdn.as_ref().ok_or(CoreError::MissingEnv {
            var: CLOUDFRONT_DISTRIBUTION,
        })?;
        let mut paths: Vec<String> = inputs
            .iter()
            .flat_map(|(_, out)| out.invalidate.iter().cloned())
            .collect();
        paths.sort();
        paths.dedup();
        cdn.invalidate(&paths)?;
        Ok(StepOutput {
            invalidate: paths,
            ..StepOutput::default()
        })
    }
}

impl StepRunner for BuildRunner {
    fn run(&self, step: Step, inputs: &[(Step, StepOutput)]) -> Result<StepOutput, StepError> {
        match step {
            Step::Clean => self.clean(),
            Step::Compile(class) => self.compile(class),
            Step::Optimize(class) => self.optimize(class),
            Step::Version(class) => self.version(class),
            Step::Replace(class) => self.replace(class),
            Step::Gzip => Ok(StepOutput::files(gzip::gzip_build(&self.paths.build)?)),
            Step::PublishHtml => self.publish(PublishScope::Markup),
            Step::PublishAssets => self.publish(PublishScope::Assets),
            Step::InvalidateCdn => self.invalidate(inputs),
        }
    }
}
