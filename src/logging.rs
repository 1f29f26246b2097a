//! Logging initialization and configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "winrm_shell=info";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Registry with `filter` and a compact formatter, ready to install.
fn subscriber(filter: EnvFilter) -> impl SubscriberInitExt {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `winrm_shell=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    subscriber(default_filter()).init();
}

/// Try to initialize the logging system.
///
/// Returns `Err` if a subscriber is already installed.
pub fn try_init() -> Result<(), TryInitError> {
    subscriber(default_filter()).try_init()
}

/// Try to initialize logging with an explicit filter, such as the
/// `logging.level` value of a [`Config`](crate::Config).
///
/// A filter string that does not parse falls back to the default.
pub fn try_init_with_filter(filter: &str) -> Result<(), TryInitError> {
    subscriber(parse_filter(filter)).try_init()
}

fn parse_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
