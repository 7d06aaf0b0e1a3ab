use std::fmt::Debug;
use std::future::Future;
use std::panic::Location;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use pin_project_lite::pin_project;

use super::matcher::Matcher;
use crate::context::{Failure, TestContext};
use crate::error::Rejection;

pin_project! {
    /// Future for [`TestContext::expect_to_succeed`].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ExpectSuccess<F> {
        #[pin]
        future: F,
        context: TestContext,
        location: &'static Location<'static>,
    }
}

impl<F> ExpectSuccess<F> {
    pub(crate) fn new(
        future: F,
        context: TestContext,
        location: &'static Location<'static>,
    ) -> Self {
        Self {
            future,
            context,
            location,
        }
    }
}

impl<F, T, E> Future for ExpectSuccess<F>
where
    F: Future<Output = Result<T, E>>,
    E: Debug + 'static,
{
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match ready!(this.future.poll(cx)) {
            Ok(value) => Poll::Ready(Some(value)),
            Err(error) => {
                this.context.record(Failure::test(
                    *this.location,
                    format!(
                        "expected future to succeed, but it failed with {}",
                        Rejection::of(&error)
                    ),
                ));
                Poll::Ready(None)
            }
        }
    }
}

pin_project! {
    /// Future for [`TestContext::expect_to_fail`] and its variants.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ExpectFailure<F, M> {
        #[pin]
        future: F,
        matcher: M,
        context: TestContext,
        location: &'static Location<'static>,
    }
}

impl<F, M> ExpectFailure<F, M> {
    pub(crate) fn new(
        future: F,
        matcher: M,
        context: TestContext,
        location: &'static Location<'static>,
    ) -> Self {
        Self {
            future,
            matcher,
            context,
            location,
        }
    }
}

impl<F, T, E, M> Future for ExpectFailure<F, M>
where
    F: Future<Output = Result<T, E>>,
    M: Matcher<E>,
{
    type Output = Option<E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match ready!(this.future.poll(cx)) {
            Ok(_) => {
                this.context.record(Failure::test(
                    *this.location,
                    format!(
                        "expected future to fail with {}, but it succeeded",
                        this.matcher.describe()
                    ),
                ));
                Poll::Ready(None)
            }
            Err(error) => {
                if !this.matcher.matches(&error) {
                    this.context.record(Failure::expectation(
                        *this.location,
                        format!(
                            "{} (expected: {})",
                            this.matcher.describe_mismatch(&error),
                            this.matcher.describe()
                        ),
                    ));
                }
                Poll::Ready(Some(error))
            }
        }
    }
}
