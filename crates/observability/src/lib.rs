//! Process-wide tracing setup shared by the catalog binaries and tests.

/// Initialize structured logging for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Subscriber construction (filters, JSON formatting).
pub mod tracing;
