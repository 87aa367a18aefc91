//! Process-wide tracing setup shared by the binaries.

/// Subscriber setup (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialize tracing with explicit settings.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_with(settings: &LogSettings) {
    tracing::init(settings);
}
