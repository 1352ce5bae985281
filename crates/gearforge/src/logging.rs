//! Tracing setup for gearforge hosts.
//!
//! Auto-detects the filter from `RUST_LOG`, defaulting to `gearforge=info`.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the tracing subscriber.
///
/// Safe to call multiple times - only the first call has effect. Does
/// nothing when the host already installed a global subscriber.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gearforge=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
