//! Logging setup for hosts that embed the state upgrader.
//!
//! Upgrades are traced with `tracing`; nothing is printed unless the host
//! installs a subscriber. These helpers install one that writes to
//! **stderr**, so stdout stays free for whatever protocol the host speaks.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`, `aviatrix_provider_state=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show every upgrader step
//! RUST_LOG=aviatrix_provider_state=debug ./terraform-provider-aviatrix
//!
//! # Also show the field policies as they fire
//! RUST_LOG=aviatrix_provider_state::policy=trace ./terraform-provider-aviatrix
//! ```

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize the default logging subscriber at `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
///
/// # Example
///
/// ```no_run
/// aviatrix_provider_state::init_logging();
/// tracing::info!("provider starting");
/// ```
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`], with `default_level` used when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning `false` if a subscriber is already set.
///
/// Safe to call from tests and from hosts that may have set up their own
/// subscriber.
pub fn try_init_logging() -> bool {
    subscriber("info").try_init().is_ok()
}
