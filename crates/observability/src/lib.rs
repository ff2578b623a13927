//! Tracing and logging (shared setup).

/// Initialize process-wide tracing/logging in the given format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use tracing::{LogFormat, UnknownLogFormat};
