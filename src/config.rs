//! Configuration records for waits and async tests.
//!
//! Defaults mirror the usual "eventually" conventions: one second to settle,
//! polled every ten milliseconds, and a failing future fails the test.

use std::time::Duration;

/// Default time a wait or an async test is given to settle.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default pause between two evaluations of a polled expression.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a polled expression is scheduled.
///
/// # Example
///
/// ```rust
/// use testkit_expect::PollConfig;
/// use std::time::Duration;
///
/// let config = PollConfig::new()
///     .timeout(Duration::from_secs(3))
///     .interval(Duration::from_millis(50));
///
/// assert_eq!(config.timeout, Duration::from_secs(3));
/// assert_eq!(config.interval, Duration::from_millis(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Give up after this long.
    pub timeout: Duration,
    /// Sleep this long between attempts.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Configuration for a registered async test.
///
/// `timeout` bounds the test body. `poll` is the default used by waits
/// inside the body, such as [`TestContext::wait_until`](crate::TestContext::wait_until).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncTestConfig {
    /// How long the body's future is given to settle.
    pub timeout: Duration,
    /// Whether an `Err` from the body fails the test.
    pub fail_on_error: bool,
    /// Default poll configuration for waits inside the body.
    pub poll: PollConfig,
}

impl Default for AsyncTestConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            fail_on_error: true,
            poll: PollConfig::default(),
        }
    }
}

impl AsyncTestConfig {
    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time the body is given to settle.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Choose whether an `Err` from the body fails the test.
    #[must_use]
    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// Set the default poll configuration for waits inside the body.
    #[must_use]
    pub fn poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Poll configuration the runner uses to wait for the body itself.
    #[must_use]
    pub(crate) fn settle_poll(&self) -> PollConfig {
        self.poll.timeout(self.timeout)
    }
}
