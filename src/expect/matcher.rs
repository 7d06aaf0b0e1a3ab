// Matcher factories are routinely built and handed straight to an expectation
#![allow(clippy::must_use_candidate)]

//! Matchers for expected errors and other values.
//!
//! This module provides the [`Matcher`] trait used by
//! [`TestContext::expect_that`](crate::TestContext::expect_that) and
//! [`TestContext::expect_to_fail_matching`](crate::TestContext::expect_to_fail_matching):
//!
//! - [`any_error`] - accepts every error
//! - [`eq`] - equality with an expected value
//! - [`message_contains`] - the `Display` output contains a substring
//! - [`is_aborted`] - the error is a [`TestError`](crate::TestError) abort
//! - [`satisfies`] - an arbitrary predicate
//! - combinators [`not`] and [`any_of`]
//!
//! # Example
//!
//! ```rust
//! use testkit_expect::expect::matcher::{eq, message_contains, not, Matcher};
//!
//! assert!(eq("timeout").matches(&"timeout"));
//! assert!(message_contains("refused").matches(&"connection refused"));
//! assert!(not(eq(0)).matches(&1));
//! ```

use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crate::error::Rejection;

/// A matcher for testing values.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use testkit_expect::expect::matcher::Matcher;
///
/// struct IsRetryable;
///
/// impl Matcher<std::io::Error> for IsRetryable {
///     fn matches(&self, error: &std::io::Error) -> bool {
///         error.kind() == std::io::ErrorKind::WouldBlock
///     }
///
///     fn describe(&self) -> String {
///         "a retryable io error".to_string()
///     }
///
///     fn describe_mismatch(&self, error: &std::io::Error) -> String {
///         format!("{:?} is not retryable", error.kind())
///     }
/// }
///
/// let error = std::io::Error::from(std::io::ErrorKind::WouldBlock);
/// assert!(IsRetryable.matches(&error));
/// ```
pub trait Matcher<T: ?Sized> {
    /// Check if the value matches.
    fn matches(&self, value: &T) -> bool;

    /// Describe what this matcher expects.
    fn describe(&self) -> String;

    /// Describe why a value didn't match.
    fn describe_mismatch(&self, value: &T) -> String;
}

/// Create a matcher that accepts any error.
///
/// Every `Err` is an error, so this documents intent more than it checks.
pub fn any_error<E: ?Sized>() -> AnyError<E> {
    AnyError {
        _phantom: PhantomData,
    }
}

/// Matcher that accepts every error.
pub struct AnyError<E: ?Sized> {
    _phantom: PhantomData<fn(&E)>,
}

impl<E: ?Sized> Matcher<E> for AnyError<E> {
    fn matches(&self, _error: &E) -> bool {
        true
    }

    fn describe(&self) -> String {
        "any error".to_string()
    }

    fn describe_mismatch(&self, _error: &E) -> String {
        // Unreachable in practice: every error matches
        "is an error".to_string()
    }
}

/// Create an equality matcher.
///
/// # Example
///
/// ```rust
/// use testkit_expect::expect::matcher::{eq, Matcher};
/// use testkit_expect::TestError;
///
/// let m = eq(TestError::new("gone"));
/// assert!(m.matches(&TestError::new("gone")));
/// assert!(!m.matches(&TestError::new("here")));
/// ```
pub fn eq<T: PartialEq + Debug>(expected: T) -> EqMatcher<T> {
    EqMatcher { expected }
}

/// Matcher for equality.
pub struct EqMatcher<T> {
    expected: T,
}

impl<T: PartialEq + Debug> Matcher<T> for EqMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value == &self.expected
    }

    fn describe(&self) -> String {
        format!("equals {:?}", self.expected)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not equal {:?}", value, self.expected)
    }
}

/// Create a matcher on the `Display` output of a value.
pub fn message_contains(substring: &str) -> MessageContains {
    MessageContains {
        substring: substring.to_string(),
    }
}

/// Matcher for a substring of the rendered message.
pub struct MessageContains {
    substring: String,
}

impl<T: Display + ?Sized> Matcher<T> for MessageContains {
    fn matches(&self, value: &T) -> bool {
        value.to_string().contains(&self.substring)
    }

    fn describe(&self) -> String {
        format!("a message containing {:?}", self.substring)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not contain {:?}", value.to_string(), self.substring)
    }
}

/// Create a matcher for errors that abort a test on purpose.
///
/// Matches a [`TestError`](crate::TestError) or an
/// [`Error::Aborted`](crate::Error::Aborted).
pub fn is_aborted<E>() -> IsAborted<E> {
    IsAborted {
        _phantom: PhantomData,
    }
}

/// Matcher for [`Rejection::Aborted`] errors.
pub struct IsAborted<E> {
    _phantom: PhantomData<fn(&E)>,
}

impl<E: Debug + 'static> Matcher<E> for IsAborted<E> {
    fn matches(&self, error: &E) -> bool {
        Rejection::of(error).is_abort()
    }

    fn describe(&self) -> String {
        "an aborted test computation".to_string()
    }

    fn describe_mismatch(&self, error: &E) -> String {
        format!("{error:?} is not an abort")
    }
}

/// Create a predicate-based matcher.
///
/// # Example
///
/// ```rust
/// use testkit_expect::expect::matcher::{satisfies, Matcher};
///
/// let m = satisfies(|code: &u16| *code >= 500, "a server error");
/// assert!(m.matches(&503));
/// assert!(!m.matches(&404));
/// ```
pub fn satisfies<T, F>(predicate: F, description: &str) -> PredicateMatcher<T, F>
where
    F: Fn(&T) -> bool,
{
    PredicateMatcher {
        predicate,
        description: description.to_string(),
        _phantom: PhantomData,
    }
}

/// Matcher based on a predicate function.
pub struct PredicateMatcher<T, F> {
    predicate: F,
    description: String,
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug, F: Fn(&T) -> bool> Matcher<T> for PredicateMatcher<T, F> {
    fn matches(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not satisfy: {}", value, self.description)
    }
}

/// Create a negating matcher.
pub fn not<T: ?Sized, M: Matcher<T> + 'static>(matcher: M) -> NotMatcher<T> {
    NotMatcher {
        inner: Box::new(matcher),
    }
}

/// Matcher that negates another matcher.
pub struct NotMatcher<T: ?Sized> {
    inner: Box<dyn Matcher<T>>,
}

impl<T: Debug + ?Sized> Matcher<T> for NotMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        !self.inner.matches(value)
    }

    fn describe(&self) -> String {
        format!("not {}", self.inner.describe())
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} unexpectedly matched: {}", value, self.inner.describe())
    }
}

/// Create a matcher that matches when any inner matcher matches.
///
/// Box the matchers first when their types differ.
///
/// # Example
///
/// ```rust
/// use testkit_expect::expect::matcher::{any_of, eq, message_contains, Matcher};
///
/// let matchers: Vec<Box<dyn Matcher<&str>>> =
///     vec![Box::new(eq("reset")), Box::new(message_contains("refused"))];
/// let m = any_of(matchers);
/// assert!(m.matches(&"reset"));
/// assert!(m.matches(&"connection refused"));
/// assert!(!m.matches(&"timeout"));
/// ```
pub fn any_of<T, M>(matchers: Vec<M>) -> AnyOfMatcher<T>
where
    T: ?Sized,
    M: Matcher<T> + 'static,
{
    AnyOfMatcher {
        matchers: matchers
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Matcher<T>>)
            .collect(),
    }
}

/// Matcher that requires at least one inner matcher to match.
pub struct AnyOfMatcher<T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T>>>,
}

impl<T: Debug + ?Sized> Matcher<T> for AnyOfMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.matchers.iter().any(|m| m.matches(value))
    }

    fn describe(&self) -> String {
        let descriptions: Vec<_> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("any of [{}]", descriptions.join(", "))
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} matched none of {}", value, self.describe())
    }
}

impl<T: ?Sized> Matcher<T> for Box<dyn Matcher<T>> {
    fn matches(&self, value: &T) -> bool {
        (**self).matches(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        (**self).describe_mismatch(value)
    }
}
