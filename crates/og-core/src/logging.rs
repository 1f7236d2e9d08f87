//! Process-wide `tracing` subscriber setup.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "OG_BRIDGE_LOG";

const DEFAULT_FILTER: &str = "info";

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install a `fmt` subscriber filtered by [`LOG_ENV`].
///
/// Safe to call repeatedly; only the first call has an effect. If the host
/// process already installed a global subscriber, that one is kept.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed");
        }
    });
}
