//! siteforge: static site asset pipeline.
//!
//! # Usage
//!
//! ```text
//! siteforge                  # compile, serve and watch
//! siteforge build            # clean + compile
//! siteforge build:optimize   # ... + minify
//! siteforge build:version    # hash assets and rewrite references
//! siteforge build:deploy     # optimize, version, gzip, publish, invalidate
//! siteforge styles:compile   # any single step
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::Parser;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "siteforge",
    version,
    about = "Compile, version and deploy a static site",
    long_about = None,
)]
struct Cli {
    /// Operation (build, build:deploy, serve, ...) or single step
    /// (styles:compile, html:replace, ...) to run.
    #[arg(default_value = "default")]
    name: String,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("could not determine the current directory")?;
    // A missing .env is fine; the environment gate reports what is needed.
    let env_file = root.join(".env");
    if let Err(err) = dotenvy::from_path(&env_file) {
        if !err.not_found() {
            return Err(err).with_context(|| format!("failed to load {}", env_file.display()));
        }
    }
    siteforge_server::init_tracing();
    commands::run::run(&root, &cli.name)
}
