//! Registering and running async tests.
//!
//! [`run_async_test`] drives a fallible async body from an ordinary `#[test]`
//! function. The `#[testkit_expect::test]` attribute expands to the same
//! call.
//!
//! Each test gets:
//!
//! - a fresh current-thread tokio runtime and `LocalSet`, so the body and
//!   anything it spawns run on the test's own thread
//! - a [`TestContext`] collecting failures, handed to the body
//! - an unhandled-error hook routing [`detach`](crate::rejection::detach)ed
//!   failures into that context for the duration of the test
//! - a deadline: a body that does not settle within
//!   [`AsyncTestConfig::timeout`] fails with an expectation failure
//!
//! # Example
//!
//! ```rust
//! use testkit_expect::{run_async_test, TestError};
//!
//! run_async_test("window opens", |cx| async move {
//!     assert!(cx.wait_until(|| true).await);
//!     Ok::<_, TestError>(())
//! });
//! ```

use std::fmt::Debug;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{JoinHandle, LocalSet};
use tracing::Instrument;

use crate::config::AsyncTestConfig;
use crate::context::{Failure, TestContext};
use crate::error::{Error, Rejection, Result};
use crate::logging::init_test_logging;
use crate::wait::SignalOnDrop;

/// How a registered test's body ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The body yielded `Ok`.
    Completed,
    /// The body did not settle in time.
    TimedOut(Duration),
    /// The body yielded `Err`.
    Rejected(Rejection),
}

impl TestOutcome {
    /// Convert into a result, regardless of `fail_on_error`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] for a timeout, and [`Error::Aborted`] or
    /// [`Error::Rejected`] for a rejection.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Completed => Ok(()),
            Self::TimedOut(timeout) => Err(Error::Timeout(timeout)),
            Self::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

/// Everything observed while running one async test.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Name of the test.
    pub name: String,
    /// How the body ended.
    pub outcome: TestOutcome,
    /// Every failure recorded, in order.
    pub failures: Vec<Failure>,
}

impl TestReport {
    /// Returns `true` if no failure was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Failed`] carrying every failure if there were any.
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Failed {
                name: self.name,
                failures: self.failures,
            })
        }
    }
}

/// A configured async test, ready to run.
///
/// ```rust
/// use std::time::Duration;
/// use testkit_expect::{AsyncTest, TestError, TestOutcome};
///
/// let report = AsyncTest::new("rejects quietly", |_cx| async {
///     Err::<(), _>(TestError::new("expected here"))
/// })
/// .timeout(Duration::from_millis(200))
/// .fail_on_error(false)
/// .run_report()
/// .unwrap();
///
/// assert!(report.is_success());
/// assert!(matches!(report.outcome, TestOutcome::Rejected(_)));
/// ```
pub struct AsyncTest<B> {
    name: String,
    config: AsyncTestConfig,
    location: &'static Location<'static>,
    body: B,
}

impl<B> AsyncTest<B> {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: AsyncTestConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the time the body is given to settle.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Choose whether an `Err` from the body fails the test.
    #[must_use]
    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.config = self.config.fail_on_error(fail_on_error);
        self
    }
}

impl<B, Fut, T, E> AsyncTest<B>
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + 'static,
    T: 'static,
    E: Debug + 'static,
{
    /// Create a test with the default configuration, tagged with the
    /// caller's location.
    #[must_use]
    #[track_caller]
    pub fn new(name: impl Into<String>, body: B) -> Self {
        Self {
            name: name.into(),
            config: AsyncTestConfig::default(),
            location: Location::caller(),
            body,
        }
    }

    /// Run the test and return what happened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Runtime`] if the tokio runtime cannot be built.
    ///
    /// # Panics
    ///
    /// Resumes a panic raised inside the body.
    pub fn run_report(self) -> Result<TestReport> {
        init_test_logging();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let local = LocalSet::new();

        let Self {
            name,
            config,
            location,
            body,
        } = self;
        let context = TestContext::at(name.clone(), location, config.poll);
        let span = tracing::info_span!("async_test", name = %name);

        let outcome = local.block_on(
            &runtime,
            settle(context.clone(), config, location, body).instrument(span),
        );
        tracing::debug!(test = %name, ?outcome, failures = context.failure_count(), "async test finished");

        Ok(TestReport {
            name,
            outcome,
            failures: context.take_failures(),
        })
    }

    /// Run the test, panicking if anything failed.
    ///
    /// # Panics
    ///
    /// Panics listing every recorded failure, or resumes a panic raised
    /// inside the body.
    pub fn run(self) {
        if let Err(error) = self.run_report().and_then(TestReport::into_result) {
            panic!("{error}");
        }
    }
}

async fn settle<B, Fut, T, E>(
    context: TestContext,
    config: AsyncTestConfig,
    location: &'static Location<'static>,
    body: B,
) -> TestOutcome
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + 'static,
    T: 'static,
    E: Debug + 'static,
{
    let _hook = context.install_rejection_hook();
    let settlement: Arc<Mutex<Option<TestOutcome>>> = Arc::default();
    let fail_on_error = config.fail_on_error;
    let mut handle: Option<JoinHandle<()>> = None;

    let settled = context
        .wait_until_done_at(
            location,
            config.settle_poll(),
            "expected test body to settle",
            |done| {
                let future = body(context.clone());
                let reporter = context.clone();
                let slot = Arc::clone(&settlement);
                handle = Some(tokio::task::spawn_local(async move {
                    // Dropped on unwind too, so a panicking body ends the wait.
                    let _signal = SignalOnDrop(done);
                    let outcome = match future.await {
                        Ok(_) => TestOutcome::Completed,
                        Err(error) => {
                            let rejection = Rejection::of(&error);
                            if fail_on_error {
                                reporter.record(Failure::test(
                                    location,
                                    Error::from(rejection.clone()).to_string(),
                                ));
                            } else {
                                tracing::debug!(%rejection, "ignoring error from test body");
                            }
                            TestOutcome::Rejected(rejection)
                        }
                    };
                    *slot.lock() = Some(outcome);
                }));
            },
        )
        .await;

    if !settled {
        return TestOutcome::TimedOut(config.timeout);
    }
    let outcome = settlement.lock().take();
    if let Some(outcome) = outcome {
        return outcome;
    }

    // Signalled without an outcome: the body panicked or was cancelled.
    if let Some(handle) = handle.take() {
        if let Err(error) = handle.await {
            if error.is_panic() {
                std::panic::resume_unwind(error.into_panic());
            }
        }
    }
    let rejection = Rejection::Error("test body was cancelled before settling".to_string());
    context.record(Failure::test(location, rejection.to_string()));
    TestOutcome::Rejected(rejection)
}

/// Run an async test body with the default configuration.
///
/// The body receives the test's [`TestContext`] and must yield a `Result`.
/// An `Err` fails the test, as does any failure recorded on the context or
/// a body that does not settle within one second.
///
/// # Panics
///
/// Panics listing every recorded failure.
#[track_caller]
pub fn run_async_test<B, Fut, T, E>(description: &str, body: B)
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + 'static,
    T: 'static,
    E: Debug + 'static,
{
    AsyncTest::new(description, body).run();
}

/// Run an async test body with an explicit configuration.
///
/// # Panics
///
/// Panics listing every recorded failure.
#[track_caller]
pub fn run_async_test_with<B, Fut, T, E>(description: &str, config: AsyncTestConfig, body: B)
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + 'static,
    T: 'static,
    E: Debug + 'static,
{
    AsyncTest::new(description, body).config(config).run();
}
