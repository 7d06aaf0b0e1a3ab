//! Per-test failure log.
//!
//! A [`TestContext`] is created for every registered async test and handed to
//! its body. Waiters and expectation wrappers record [`Failure`]s into it
//! instead of panicking, so a test can keep going after a failed expectation
//! and report everything at the end.
//!
//! # Example
//!
//! ```rust
//! use testkit_expect::{TestContext, FailureKind};
//!
//! let cx = TestContext::new("manual");
//! cx.fail("window never appeared");
//!
//! let failures = cx.failures();
//! assert_eq!(failures.len(), 1);
//! assert_eq!(failures[0].kind(), FailureKind::Test);
//! ```

mod failure;

use std::fmt::{self, Debug};
use std::panic::Location;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::expect::matcher::Matcher;
use crate::rejection::{self, RejectionHookGuard};

pub use failure::{Failure, FailureKind};

/// Handle to the failure log of one test.
///
/// Clones share the same log, so the context can be moved into spawned
/// futures freely.
#[derive(Clone)]
pub struct TestContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    name: String,
    location: &'static Location<'static>,
    poll: PollConfig,
    failures: Mutex<Vec<Failure>>,
}

impl TestContext {
    /// Create a context tagged with the caller's location.
    #[must_use]
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self::at(name, Location::caller(), PollConfig::default())
    }

    /// Create a context whose waits default to `poll`.
    #[must_use]
    #[track_caller]
    pub fn with_poll_config(name: impl Into<String>, poll: PollConfig) -> Self {
        Self::at(name, Location::caller(), poll)
    }

    pub(crate) fn at(
        name: impl Into<String>,
        location: &'static Location<'static>,
        poll: PollConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                location,
                poll,
                failures: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Name of the test.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Where the test was registered.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.inner.location
    }

    /// Default poll configuration for waits.
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        self.inner.poll
    }

    /// Record a failure.
    pub fn record(&self, failure: Failure) {
        tracing::warn!(
            test = %self.inner.name,
            kind = %failure.kind(),
            file = failure.location().file(),
            line = failure.location().line(),
            "{}",
            failure.message()
        );
        self.inner.failures.lock().push(failure);
    }

    /// Record a test failure at the caller's location.
    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) {
        self.record(Failure::test(Location::caller(), message));
    }

    /// Check `value` against `matcher`, recording an expectation failure on
    /// mismatch.
    ///
    /// Returns whether the value matched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_expect::TestContext;
    /// use testkit_expect::expect::matcher::eq;
    ///
    /// let cx = TestContext::new("matchers");
    /// assert!(cx.expect_that(&3, eq(3)));
    /// assert!(!cx.expect_that(&4, eq(3)));
    /// assert_eq!(cx.failure_count(), 1);
    /// ```
    #[track_caller]
    pub fn expect_that<T, M>(&self, value: &T, matcher: M) -> bool
    where
        T: ?Sized,
        M: Matcher<T>,
    {
        if matcher.matches(value) {
            return true;
        }
        self.record(Failure::expectation(
            Location::caller(),
            format!(
                "{} (expected: {})",
                matcher.describe_mismatch(value),
                matcher.describe()
            ),
        ));
        false
    }

    /// Snapshot of every failure recorded so far.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.inner.failures.lock().clone()
    }

    /// Number of failures recorded so far.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.inner.failures.lock().len()
    }

    /// Returns `true` while nothing has failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.inner.failures.lock().is_empty()
    }

    /// Drain the failure log.
    pub fn take_failures(&self) -> Vec<Failure> {
        std::mem::take(&mut *self.inner.failures.lock())
    }

    /// Turn the failure log into a result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Failed`] if any failure was recorded.
    pub fn report(&self) -> Result<()> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Failed {
                name: self.inner.name.clone(),
                failures,
            })
        }
    }

    /// Panic if any failure was recorded.
    ///
    /// # Panics
    ///
    /// Panics listing every recorded failure.
    #[track_caller]
    pub fn assert_clean(&self) {
        if let Err(error) = self.report() {
            panic!("{error}");
        }
    }

    /// Route unhandled errors on this thread into this context.
    ///
    /// The hook stays installed until the returned guard is dropped. Reports
    /// become test failures tagged with this context's location.
    pub fn install_rejection_hook(&self) -> RejectionHookGuard {
        let context = self.clone();
        rejection::install_rejection_hook(move |unhandled| {
            context.record(Failure::test(
                context.location(),
                format!(
                    "unhandled error returned from future detached at {}:{}: {}",
                    unhandled.location.file(),
                    unhandled.location.line(),
                    unhandled.rejection
                ),
            ));
        })
    }
}

impl Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.inner.name)
            .field("location", &self.inner.location)
            .field("failures", &self.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::matcher::{eq, message_contains};
    use crate::rejection::{report_unhandled, UnhandledRejection};
    use crate::Rejection;

    #[test]
    fn test_new_context_is_clean() {
        let cx = TestContext::new("clean");
        assert!(cx.is_clean());
        assert_eq!(cx.failure_count(), 0);
        assert!(cx.report().is_ok());
        assert_eq!(cx.name(), "clean");
        assert_eq!(cx.location().file(), file!());
    }

    #[test]
    fn test_fail_records_caller_location() {
        let cx = TestContext::new("fail");
        let line = line!() + 1;
        cx.fail("explicit");

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Test);
        assert_eq!(failures[0].location().line(), line);
    }

    #[test]
    fn test_clones_share_the_log() {
        let cx = TestContext::new("shared");
        let other = cx.clone();
        other.fail("from the clone");
        assert_eq!(cx.failure_count(), 1);
    }

    #[test]
    fn test_expect_that_records_mismatch() {
        let cx = TestContext::new("matcher");
        assert!(cx.expect_that(&"needle in haystack", message_contains("needle")));
        assert!(!cx.expect_that(&1, eq(2)));

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Expectation);
        assert!(failures[0].message().contains("does not equal"));
        assert!(failures[0].message().contains("expected: equals 2"));
    }

    #[test]
    fn test_take_failures_drains() {
        let cx = TestContext::new("drain");
        cx.fail("one");
        cx.fail("two");
        assert_eq!(cx.take_failures().len(), 2);
        assert!(cx.is_clean());
    }

    #[test]
    fn test_report_lists_failures() {
        let cx = TestContext::new("reported");
        cx.fail("first problem");
        cx.fail("second problem");

        let message = cx.report().unwrap_err().to_string();
        assert!(message.starts_with("async test `reported` recorded 2 failure(s):"));
        assert!(message.contains("test failed: first problem"));
        assert!(message.contains("test failed: second problem"));
    }

    #[test]
    #[should_panic(expected = "recorded 1 failure(s)")]
    fn test_assert_clean_panics() {
        let cx = TestContext::new("dirty");
        cx.fail("nope");
        cx.assert_clean();
    }

    #[test]
    fn test_rejection_hook_records_into_context() {
        let cx = TestContext::new("hooked");
        {
            let _guard = cx.install_rejection_hook();
            assert!(report_unhandled(UnhandledRejection {
                rejection: Rejection::Error("lost".into()),
                location: Location::caller(),
            }));
        }

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Test);
        assert_eq!(failures[0].location(), cx.location());
        assert!(failures[0].message().ends_with(": lost"));
    }
}
