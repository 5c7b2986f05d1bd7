//! siteforge dev server: static serving of the build tree plus a source
//! watcher that recompiles changed asset classes.

pub mod dev;
pub mod error;
pub mod serve;
pub mod watcher;

pub use dev::start_blocking;
pub use error::ServerError;

/// Install the global tracing subscriber. `RUST_LOG` wins over the `info`
/// default. Calling it twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
