//! Process-wide tracing setup shared by the frontdesk binaries and tests.

pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};

/// Initialize tracing with JSON output and `RUST_LOG` filtering.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(&LogConfig::from_env());
}
