//! # testkit-expect
//!
//! > Waiting, settling and failure tracking for async Rust tests
//!
//! **testkit-expect** helps tests that drive asynchronous code: wait for a
//! condition to become true, run a fallible async body with a deadline, and
//! turn an unexpected `Ok` or `Err` into a readable failure instead of a
//! hang or a lost error.
//!
//! ## Quick Start
//!
//! ```rust
//! use testkit_expect::prelude::*;
//!
//! run_async_test("queue drains", |cx| async move {
//!     let queue = std::rc::Rc::new(std::cell::Cell::new(3_u32));
//!     let worker = queue.clone();
//!     tokio::task::spawn_local(async move {
//!         while worker.get() > 0 {
//!             worker.set(worker.get() - 1);
//!             tokio::task::yield_now().await;
//!         }
//!     });
//!
//!     assert!(cx.wait_until(|| queue.get() == 0).await);
//!     Ok::<_, TestError>(())
//! });
//! ```
//!
//! With the `macros` feature (on by default) the same test reads:
//!
//! ```rust,ignore
//! #[testkit_expect::test(timeout = 2.5)]
//! async fn queue_drains(cx: TestContext) {
//!     assert!(cx.wait_until(|| queue.is_empty()).await);
//! }
//! ```
//!
//! ## Features
//!
//! - **Waiters** - poll a condition or a value until it holds, with a timeout
//! - **Async tests** - one runtime, context and deadline per test
//! - **Unhandled errors** - errors from detached futures fail the running test
//! - **Settle expectations** - expect a future to succeed or to fail

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;
pub mod expect;
pub mod logging;
pub mod rejection;
pub mod runner;
pub mod wait;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_expect::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AsyncTestConfig, PollConfig};
    pub use crate::context::TestContext;
    pub use crate::error::{Error, Rejection, Result, TestError};
    pub use crate::expect::matcher::{
        any_error, any_of, eq, is_aborted, message_contains, not, satisfies, Matcher,
    };
    pub use crate::rejection::detach;
    pub use crate::runner::{run_async_test, run_async_test_with, AsyncTest};
    pub use crate::wait::Done;
}

// Re-exports
pub use config::{AsyncTestConfig, PollConfig};
pub use context::{Failure, FailureKind, TestContext};
pub use error::{Error, Rejection, Result, TestError};
pub use expect::{ExpectFailure, ExpectSuccess};
pub use runner::{run_async_test, run_async_test_with, AsyncTest, TestOutcome, TestReport};
pub use wait::{Done, Probe};

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use testkit_expect_macros::test;
