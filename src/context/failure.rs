//! Recorded test failures.

use std::fmt;
use std::panic::Location;

/// Which channel a failure was reported through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// An expectation never held: a wait timed out or a matcher mismatched.
    Expectation,
    /// Test logic failed directly: an unexpected settlement, an explicit
    /// `fail`, or an unhandled error.
    Test,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expectation => f.write_str("expectation failed"),
            Self::Test => f.write_str("test failed"),
        }
    }
}

/// A single failure, tagged with the source location that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    location: &'static Location<'static>,
}

impl Failure {
    /// Create a failure.
    #[must_use]
    pub fn new(
        kind: FailureKind,
        location: &'static Location<'static>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }

    /// Create an expectation failure.
    #[must_use]
    pub fn expectation(location: &'static Location<'static>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Expectation, location, message)
    }

    /// Create a test failure.
    #[must_use]
    pub fn test(location: &'static Location<'static>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Test, location, message)
    }

    /// The channel this failure was reported through.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the failing call was made.
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.location.file(),
            self.location.line(),
            self.kind,
            self.message
        )
    }
}
