//! Test logging.
//!
//! Every failure recorded on a [`TestContext`](crate::TestContext) is also
//! emitted as a `tracing` event. These helpers install a subscriber that
//! writes through libtest's capture, so the events show up next to the
//! failing test only.

use std::sync::Once;

use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging at `DEBUG`.
///
/// Safe to call multiple times; only initializes once. Registered async
/// tests call this automatically.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::DEBUG);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops. A subscriber installed by
/// the application is left alone.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}
