//! Expectations on how a future settles.
//!
//! The wrappers here turn an unexpected `Ok` or `Err` into a failure recorded
//! on the [`TestContext`], and always complete so the rest of the test keeps
//! running:
//!
//! - [`TestContext::expect_to_succeed`] - the future should yield `Ok`
//! - [`TestContext::expect_to_fail`] - the future should yield any `Err`
//! - [`TestContext::expect_to_fail_with`] - the future should yield a specific `Err`
//! - [`TestContext::expect_to_fail_matching`] - the `Err` should satisfy a [`matcher`]
//!
//! # Example
//!
//! ```rust
//! use testkit_expect::{TestContext, TestError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cx = TestContext::new("settle");
//!
//! let value = cx.expect_to_succeed(async { Ok::<_, TestError>(7) }).await;
//! assert_eq!(value, Some(7));
//!
//! let error = cx
//!     .expect_to_fail_with(async { Err::<(), _>(TestError::new("denied")) }, TestError::new("denied"))
//!     .await;
//! assert_eq!(error, Some(TestError::new("denied")));
//! assert!(cx.is_clean());
//! # }
//! ```

pub mod matcher;
mod settle;

use std::fmt::Debug;
use std::future::Future;
use std::panic::Location;

use crate::context::TestContext;
use matcher::{any_error, eq, AnyError, EqMatcher, Matcher};

pub use settle::{ExpectFailure, ExpectSuccess};

impl TestContext {
    /// Expect `future` to yield `Ok`.
    ///
    /// Resolves to the value, or to `None` after recording a test failure
    /// that names the error.
    #[track_caller]
    pub fn expect_to_succeed<F, T, E>(&self, future: F) -> ExpectSuccess<F>
    where
        F: Future<Output = Result<T, E>>,
        E: Debug + 'static,
    {
        ExpectSuccess::new(future, self.clone(), Location::caller())
    }

    /// Expect `future` to yield any `Err`.
    ///
    /// Resolves to the error, or to `None` after recording a test failure if
    /// the future succeeded.
    #[track_caller]
    pub fn expect_to_fail<F, T, E>(&self, future: F) -> ExpectFailure<F, AnyError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        ExpectFailure::new(future, any_error(), self.clone(), Location::caller())
    }

    /// Expect `future` to yield `Err(expected)`.
    ///
    /// A different error records an expectation failure; the error is still
    /// returned.
    #[track_caller]
    pub fn expect_to_fail_with<F, T, E>(
        &self,
        future: F,
        expected: E,
    ) -> ExpectFailure<F, EqMatcher<E>>
    where
        F: Future<Output = Result<T, E>>,
        E: PartialEq + Debug,
    {
        ExpectFailure::new(future, eq(expected), self.clone(), Location::caller())
    }

    /// Expect `future` to yield an `Err` accepted by `matcher`.
    #[track_caller]
    pub fn expect_to_fail_matching<F, T, E, M>(&self, future: F, matcher: M) -> ExpectFailure<F, M>
    where
        F: Future<Output = Result<T, E>>,
        M: Matcher<E>,
    {
        ExpectFailure::new(future, matcher, self.clone(), Location::caller())
    }
}

#[cfg(test)]
mod tests {
    use super::matcher::{is_aborted, message_contains};
    use crate::context::FailureKind;
    use crate::{Error, TestContext, TestError};
    use futures::future::{pending, ready};
    use futures::FutureExt;

    #[tokio::test]
    async fn test_expect_to_succeed_passes_value_through() {
        let cx = TestContext::new("succeed");
        let value = cx.expect_to_succeed(ready(Ok::<_, TestError>("ok"))).await;
        assert_eq!(value, Some("ok"));
        assert!(cx.is_clean());
    }

    #[tokio::test]
    async fn test_expect_to_succeed_records_rejection_and_completes() {
        let cx = TestContext::new("succeed rejected");
        let rejected = ready(Err::<u8, _>(TestError::new("disk full")));
        let line = line!() + 1;
        let value = cx.expect_to_succeed(rejected).await;

        assert_eq!(value, None);
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Test);
        assert_eq!(failures[0].location().line(), line);
        assert_eq!(
            failures[0].message(),
            "expected future to succeed, but it failed with aborted: disk full"
        );
    }

    #[tokio::test]
    async fn test_expect_to_fail_accepts_any_error() {
        let cx = TestContext::new("fail");
        let error = cx.expect_to_fail(ready(Err::<(), _>(42_u32))).await;
        assert_eq!(error, Some(42));
        assert!(cx.is_clean());
    }

    #[tokio::test]
    async fn test_expect_to_fail_records_success() {
        let cx = TestContext::new("fail succeeded");
        let error = cx.expect_to_fail(ready(Ok::<_, String>(()))).await;

        assert_eq!(error, None);
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Test);
        assert_eq!(
            failures[0].message(),
            "expected future to fail with any error, but it succeeded"
        );
    }

    #[tokio::test]
    async fn test_expect_to_fail_with_equal_error() {
        let cx = TestContext::new("fail with");
        let expected = TestError::new("not found");
        let error = cx
            .expect_to_fail_with(ready(Err::<(), _>(expected.clone())), expected)
            .await;

        assert_eq!(error, Some(TestError::new("not found")));
        assert!(cx.is_clean());
    }

    #[tokio::test]
    async fn test_expect_to_fail_with_different_error() {
        let cx = TestContext::new("fail with other");
        let error = cx
            .expect_to_fail_with(
                ready(Err::<(), _>(TestError::new("timeout"))),
                TestError::new("not found"),
            )
            .await;

        assert_eq!(error, Some(TestError::new("timeout")));
        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), FailureKind::Expectation);
        assert!(failures[0].message().contains("does not equal"));
    }

    #[tokio::test]
    async fn test_expect_to_fail_with_on_success() {
        let cx = TestContext::new("fail with succeeded");
        cx.expect_to_fail_with(ready(Ok::<u8, _>(1)), TestError::new("expected"))
            .await;

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message().starts_with(
            "expected future to fail with equals TestError { description: \"expected\" }"
        ));
    }

    #[tokio::test]
    async fn test_expect_to_fail_matching() {
        let cx = TestContext::new("matching");
        cx.expect_to_fail_matching(
            ready(Err::<(), _>(Error::Aborted(TestError::new("stop")))),
            is_aborted(),
        )
        .await;
        cx.expect_to_fail_matching(
            ready(Err::<(), _>(std::io::Error::other("broken pipe"))),
            message_contains("reset"),
        )
        .await;

        let failures = cx.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message().contains("\"broken pipe\" does not contain"));
    }

    #[tokio::test]
    async fn test_wrappers_wait_for_settlement() {
        let cx = TestContext::new("pending");
        let mut wrapped = Box::pin(cx.expect_to_succeed(pending::<Result<(), TestError>>()));
        assert!((&mut wrapped).now_or_never().is_none());
        assert!(cx.is_clean());
    }
}
