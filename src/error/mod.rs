//! Error definitions
//!
//! This module provides the crate error type, the [`TestError`] used to abort
//! a test computation on purpose, and [`Rejection`], the classification of an
//! `Err` value produced by a future under test.

use std::any::Any;
use std::fmt::{self, Debug};
use std::time::Duration;

use thiserror::Error;

use crate::context::Failure;

/// Main error type for testkit-expect
#[derive(Error, Debug)]
pub enum Error {
    /// A wait or an async test ran past its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A test computation was aborted with a [`TestError`].
    #[error("Test aborted: {0}")]
    Aborted(#[from] TestError),

    /// A future failed with an error nobody expected.
    #[error("Future failed with error {0}")]
    Rejected(String),

    /// Failures were recorded while a test ran.
    #[error("async test `{name}` recorded {} failure(s):{}", .failures.len(), render_failures(.failures))]
    Failed {
        /// Name of the test.
        name: String,
        /// Every failure, in the order it was recorded.
        failures: Vec<Failure>,
    },

    /// The runtime driving a test could not be built.
    #[error("Failed to build test runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl Error {
    /// Create a rejected error from any debuggable value.
    #[must_use]
    pub fn rejected(reason: impl Debug) -> Self {
        Self::Rejected(format!("{reason:?}"))
    }
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Aborted(error) => Self::Aborted(error),
            Rejection::Error(reason) => Self::Rejected(reason),
        }
    }
}

fn render_failures(failures: &[Failure]) -> String {
    failures.iter().map(|f| format!("\n  {f}")).collect()
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error for aborting a test computation mid-chain.
///
/// Returning `Err(TestError::new(..))` from a step short-circuits the rest of
/// the chain. Runners report it as an abort rather than an ordinary failure.
///
/// # Example
///
/// ```rust
/// use testkit_expect::TestError;
///
/// let error = TestError::new("no window was created");
/// assert_eq!(error.to_string(), "no window was created");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct TestError {
    description: String,
}

impl TestError {
    /// Create a test error with a human-readable description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// The description given at construction.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// How a future under test failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The computation was aborted with a [`TestError`].
    Aborted(TestError),
    /// Any other error, rendered with `Debug`.
    Error(String),
}

impl Rejection {
    /// Classify an error value.
    ///
    /// `TestError`, and an [`Error::Aborted`] wrapping one, become
    /// [`Rejection::Aborted`]. Everything else is rendered with `Debug`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_expect::{Rejection, TestError};
    ///
    /// assert!(Rejection::of(&TestError::new("stop")).is_abort());
    /// assert_eq!(Rejection::of(&"io"), Rejection::Error("\"io\"".to_string()));
    /// ```
    pub fn of<E: Debug + 'static>(error: &E) -> Self {
        let any = error as &dyn Any;
        if let Some(abort) = any.downcast_ref::<TestError>() {
            return Self::Aborted(abort.clone());
        }
        if let Some(Error::Aborted(abort)) = any.downcast_ref::<Error>() {
            return Self::Aborted(abort.clone());
        }
        Self::Error(format!("{error:?}"))
    }

    /// Returns `true` for an explicit abort.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(error) => write!(f, "aborted: {error}"),
            Self::Error(reason) => f.write_str(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_keeps_description() {
        let error = TestError::new("boom");
        assert_eq!(error.description(), "boom");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_rejection_classifies_test_error_as_abort() {
        let rejection = Rejection::of(&TestError::new("stop here"));
        assert_eq!(rejection, Rejection::Aborted(TestError::new("stop here")));
        assert_eq!(rejection.to_string(), "aborted: stop here");
    }

    #[test]
    fn test_rejection_classifies_wrapped_abort() {
        let error: Error = TestError::new("wrapped").into();
        assert!(Rejection::of(&error).is_abort());
    }

    #[test]
    fn test_rejection_renders_other_errors_with_debug() {
        #[derive(Debug)]
        struct Unreachable {
            code: u8,
        }

        let rejection = Rejection::of(&Unreachable { code: 7 });
        assert!(!rejection.is_abort());
        assert_eq!(rejection.to_string(), "Unreachable { code: 7 }");
    }

    #[test]
    fn test_error_from_rejection() {
        let aborted: Error = Rejection::Aborted(TestError::new("x")).into();
        assert!(matches!(aborted, Error::Aborted(_)));

        let rejected: Error = Rejection::Error("E".into()).into();
        assert_eq!(rejected.to_string(), "Future failed with error E");
    }

    #[test]
    fn test_rejected_constructor() {
        assert_eq!(
            Error::rejected("nope").to_string(),
            "Future failed with error \"nope\""
        );
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            Error::Timeout(Duration::from_millis(1500)).to_string(),
            "Operation timed out after 1.5s"
        );
    }
}
