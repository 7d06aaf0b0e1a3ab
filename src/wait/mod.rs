//! Polling waiters.
//!
//! Waiters evaluate an expression repeatedly until it holds, yielding to the
//! runtime between attempts. A wait that never holds records a single
//! expectation failure on the [`TestContext`] at the caller's location and
//! resolves to a "not satisfied" value; it never panics.
//!
//! - [`TestContext::wait_until`] - wait for a `bool` to become `true`
//! - [`TestContext::wait_for`] - wait for an `Option` to become `Some`
//! - [`TestContext::wait_until_done`] - wait for a [`Done`] signal
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use testkit_expect::TestContext;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cx = TestContext::new("flag");
//! let flag = Arc::new(AtomicBool::new(false));
//!
//! let setter = Arc::clone(&flag);
//! tokio::spawn(async move { setter.store(true, Ordering::SeqCst) });
//!
//! assert!(cx.wait_until(|| flag.load(Ordering::SeqCst)).await);
//! assert!(cx.is_clean());
//! # }
//! ```

mod done;
mod probe;

use std::future::Future;
use std::panic::Location;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::PollConfig;
use crate::context::{Failure, TestContext};

pub use done::Done;
pub(crate) use done::SignalOnDrop;
pub use probe::Probe;

/// Floor for the polling interval, so a paused clock can still advance.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl TestContext {
    /// Wait until `expression` yields `true`.
    ///
    /// Uses the context's default [`PollConfig`]. Resolves to `false`, after
    /// recording one expectation failure, if the timeout passes or the
    /// expression returns an `Err`.
    #[track_caller]
    pub fn wait_until<F, R>(&self, expression: F) -> impl Future<Output = bool>
    where
        F: FnMut() -> R,
        R: Probe<bool>,
    {
        self.wait_until_with(self.poll_config(), expression)
    }

    /// [`wait_until`](Self::wait_until) with an explicit poll configuration.
    #[track_caller]
    pub fn wait_until_with<F, R>(
        &self,
        config: PollConfig,
        mut expression: F,
    ) -> impl Future<Output = bool>
    where
        F: FnMut() -> R,
        R: Probe<bool>,
    {
        let location = Location::caller();
        let cx = self.clone();
        async move {
            cx.poll_until(
                location,
                config,
                "expected condition to eventually be true",
                move || expression().into_probe(),
            )
            .await
        }
    }

    /// Wait until `expression` yields `Some`, then return the value.
    ///
    /// Once the wait is satisfied the expression is evaluated **once more**
    /// to fetch the value, so it must be idempotent. Otherwise the returned
    /// value may differ from the one that ended the wait.
    ///
    /// A timeout records an expectation failure. An error or `None` from the
    /// fetching evaluation records a test failure. All three resolve to
    /// `None`.
    #[track_caller]
    pub fn wait_for<T, F, R>(&self, expression: F) -> impl Future<Output = Option<T>>
    where
        F: FnMut() -> R,
        R: Probe<Option<T>>,
    {
        self.wait_for_with(self.poll_config(), expression)
    }

    /// [`wait_for`](Self::wait_for) with an explicit poll configuration.
    #[track_caller]
    pub fn wait_for_with<T, F, R>(
        &self,
        config: PollConfig,
        mut expression: F,
    ) -> impl Future<Output = Option<T>>
    where
        F: FnMut() -> R,
        R: Probe<Option<T>>,
    {
        let location = Location::caller();
        let cx = self.clone();
        async move {
            let present = cx
                .poll_until(
                    location,
                    config,
                    "expected value to eventually be present",
                    || expression().into_probe().map(|value| value.is_some()),
                )
                .await;
            if !present {
                return None;
            }

            match expression().into_probe() {
                Ok(Some(value)) => Some(value),
                Ok(None) => {
                    cx.record(Failure::test(
                        location,
                        "value was present while polling but absent when retrieved",
                    ));
                    None
                }
                Err(error) => {
                    cx.record(Failure::test(
                        location,
                        format!("error thrown while retrieving value: {error}"),
                    ));
                    None
                }
            }
        }
    }

    /// Run `action` and wait until it signals the [`Done`] it was given.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use testkit_expect::TestContext;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cx = TestContext::new("done");
    /// let finished = cx
    ///     .wait_until_done(Duration::from_secs(1), |done| {
    ///         tokio::spawn(async move { done.signal() });
    ///     })
    ///     .await;
    /// assert!(finished);
    /// # }
    /// ```
    #[track_caller]
    pub fn wait_until_done<F>(&self, timeout: Duration, action: F) -> impl Future<Output = bool>
    where
        F: FnOnce(Done),
    {
        self.wait_until_done_at(
            Location::caller(),
            self.poll_config().timeout(timeout),
            "expected done to be signalled",
            action,
        )
    }

    pub(crate) fn wait_until_done_at<F>(
        &self,
        location: &'static Location<'static>,
        config: PollConfig,
        expectation: &'static str,
        action: F,
    ) -> impl Future<Output = bool>
    where
        F: FnOnce(Done),
    {
        let cx = self.clone();
        async move {
            let done = Done::new();
            action(done.clone());
            cx.poll_until(location, config, expectation, || Ok(done.is_signaled()))
                .await
        }
    }

    async fn poll_until<F>(
        &self,
        location: &'static Location<'static>,
        config: PollConfig,
        expectation: &str,
        mut check: F,
    ) -> bool
    where
        F: FnMut() -> Result<bool, String>,
    {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(config.timeout);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match check() {
                Ok(true) => {
                    tracing::debug!(attempts, "wait satisfied");
                    return true;
                }
                Ok(false) => tracing::trace!(attempts, "wait not yet satisfied"),
                Err(error) => {
                    self.record(Failure::expectation(
                        location,
                        format!("{expectation}, but evaluation failed with {error}"),
                    ));
                    return false;
                }
            }

            let interval = config.interval.max(MIN_POLL_INTERVAL);
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.record(Failure::expectation(
                            location,
                            format!(
                                "{expectation}, still unsatisfied after {:?} ({attempts} attempts)",
                                config.timeout
                            ),
                        ));
                        return false;
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };

            sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FailureKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn set_after(flag: &Arc<AtomicBool>, delay: Duration) {
        let flag = Arc::clone(flag);
        tokio::spawn(async move {
            sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_becomes_true() {
        let cx = TestContext::new("becomes true");
        let flag = Arc::new(AtomicBool::new(false));
        set_after(&flag, Duration::from_millis(200));

        assert!(cx.wait_until(|| flag.load(Ordering::SeqCst)).await);
        assert!(cx.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out_once() {
        let cx = TestContext::new("never true");
        let started = Instant::now();
        let line = line!() + 1;
        let satisfied = cx.wait_until(|| false).await;

        assert!(!satisfied);
        assert!(started.elapsed() >= Duration::from_secs(1));

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Expectation);
        assert_eq!(failures[0].location().line(), line);
        assert!(failures[0].message().contains("still unsatisfied after 1s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_stops_on_error() {
        let cx = TestContext::new("errors");
        let calls = AtomicUsize::new(0);

        let satisfied = cx
            .wait_until(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<bool, _>("socket closed")
            })
            .await;

        assert!(!satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Expectation);
        assert!(failures[0].message().contains("\"socket closed\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_with_custom_timeout() {
        let cx = TestContext::new("custom");
        let started = Instant::now();
        let config = PollConfig::new()
            .timeout(Duration::from_secs(5))
            .interval(Duration::from_millis(100));

        assert!(!cx.wait_until_with(config, || false).await);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(cx.failures()[0].message().contains("after 5s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_final_attempt_at_deadline() {
        let cx = TestContext::new("deadline");
        let started = Instant::now();
        let config = PollConfig::new()
            .timeout(Duration::from_millis(25))
            .interval(Duration::from_millis(10));

        // Attempts at 0, 10, 20 and 25 ms.
        assert!(
            !cx.wait_until_with(config, || started.elapsed() >= Duration::from_secs(1))
                .await
        );
        assert!(cx.failures()[0].message().contains("(4 attempts)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_returns_value() {
        let cx = TestContext::new("present");
        let flag = Arc::new(AtomicBool::new(false));
        set_after(&flag, Duration::from_millis(50));

        let value = cx
            .wait_for(|| flag.load(Ordering::SeqCst).then_some("window"))
            .await;
        assert_eq!(value, Some("window"));
        assert!(cx.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_evaluates_twice() {
        let cx = TestContext::new("non idempotent");
        let mut evaluations = 0;

        let value = cx
            .wait_for(move || {
                evaluations += 1;
                (evaluations >= 3).then_some(evaluations)
            })
            .await;

        // The third evaluation ends the wait; the fourth produces the value.
        assert_eq!(value, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let cx = TestContext::new("absent");
        assert_eq!(cx.wait_for(|| None::<u32>).await, None);

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Expectation);
        assert!(failures[0].message().starts_with("expected value to eventually be present"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_retrieval_error_is_test_failure() {
        let cx = TestContext::new("retrieval");
        let mut evaluations = 0;

        let value = cx
            .wait_for(move || {
                evaluations += 1;
                if evaluations == 1 {
                    Ok(Some(1))
                } else {
                    Err("stale handle")
                }
            })
            .await;

        assert_eq!(value, None);
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Test);
        assert!(failures[0]
            .message()
            .starts_with("error thrown while retrieving value"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_retrieval_absent_is_test_failure() {
        let cx = TestContext::new("vanished");
        let mut evaluations = 0;

        let value = cx
            .wait_for(move || {
                evaluations += 1;
                (evaluations == 1).then_some(())
            })
            .await;

        assert_eq!(value, None);
        assert_eq!(cx.failures()[0].kind(), FailureKind::Test);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_done_signalled() {
        let cx = TestContext::new("done");
        let finished = cx
            .wait_until_done(Duration::from_secs(2), |done| {
                tokio::spawn(async move {
                    sleep(Duration::from_millis(500)).await;
                    done.signal();
                });
            })
            .await;

        assert!(finished);
        assert!(cx.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_done_times_out() {
        let cx = TestContext::new("never done");
        let finished = cx
            .wait_until_done(Duration::from_millis(300), |_done| {})
            .await;

        assert!(!finished);
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0]
            .message()
            .starts_with("expected done to be signalled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_does_not_overflow() {
        let cx = TestContext::new("wait forever");
        let config = PollConfig::new().timeout(Duration::MAX);
        assert!(cx.wait_until_with(config, || true).await);

        let flag = Arc::new(AtomicBool::new(false));
        set_after(&flag, Duration::from_secs(30));
        assert!(cx.wait_until_with(config, || flag.load(Ordering::SeqCst)).await);

        let finished = cx
            .wait_until_done(Duration::MAX, |done| done.signal())
            .await;
        assert!(finished);
        assert!(cx.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_advances() {
        let cx = TestContext::new("zero interval");
        let config = PollConfig::new()
            .timeout(Duration::from_millis(5))
            .interval(Duration::ZERO);

        let flag = Arc::new(AtomicBool::new(false));
        set_after(&flag, Duration::from_millis(1));
        assert!(cx.wait_until_with(config, || flag.load(Ordering::SeqCst)).await);
    }
}
