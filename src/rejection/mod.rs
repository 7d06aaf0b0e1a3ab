//! Reporting for errors nobody observed.
//!
//! A future spawned with [`detach`] has no caller waiting for its result. If
//! it fails, the error is routed to the innermost hook installed with
//! [`install_rejection_hook`] on the current thread.
//!
//! Hooks form a stack per thread: installing one pushes it, dropping its
//! [`RejectionHookGuard`] removes it again. libtest runs every test on its own
//! thread, so tests never see each other's hooks.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::panic::Location;
//! use std::rc::Rc;
//! use testkit_expect::rejection::{install_rejection_hook, report_unhandled, UnhandledRejection};
//! use testkit_expect::Rejection;
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! let guard = install_rejection_hook(move |_| counter.set(counter.get() + 1));
//!
//! report_unhandled(UnhandledRejection {
//!     rejection: Rejection::Error("lost".into()),
//!     location: Location::caller(),
//! });
//! drop(guard);
//!
//! assert_eq!(seen.get(), 1);
//! ```

use std::cell::RefCell;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::Location;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;

use crate::error::Rejection;

/// An error returned by a future nobody was waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledRejection {
    /// What went wrong.
    pub rejection: Rejection,
    /// Where the future was detached.
    pub location: &'static Location<'static>,
}

type Hook = Rc<dyn Fn(&UnhandledRejection)>;

thread_local! {
    static HOOKS: RefCell<Vec<(u64, Hook)>> = const { RefCell::new(Vec::new()) };
}

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(0);

/// Removes its hook from the current thread's stack when dropped.
#[must_use = "dropping the guard uninstalls the hook"]
#[derive(Debug)]
pub struct RejectionHookGuard {
    id: u64,
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for RejectionHookGuard {
    fn drop(&mut self) {
        let id = self.id;
        // Guards may be dropped out of order; remove by id, not by position.
        let _ = HOOKS.try_with(|hooks| {
            hooks.borrow_mut().retain(|(hook_id, _)| *hook_id != id);
        });
    }
}

/// Install a hook for unhandled errors on the current thread.
///
/// The newest hook wins until its guard is dropped.
pub fn install_rejection_hook<H>(hook: H) -> RejectionHookGuard
where
    H: Fn(&UnhandledRejection) + 'static,
{
    let id = NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed);
    HOOKS.with(|hooks| hooks.borrow_mut().push((id, Rc::new(hook))));
    tracing::trace!(id, "installed rejection hook");
    RejectionHookGuard {
        id,
        _not_send: PhantomData,
    }
}

/// Number of hooks installed on the current thread.
#[must_use]
pub fn installed_hooks() -> usize {
    HOOKS.with(|hooks| hooks.borrow().len())
}

/// Hand an unhandled error to the innermost hook.
///
/// Returns `false`, after logging the error, when no hook is installed on
/// this thread.
pub fn report_unhandled(unhandled: UnhandledRejection) -> bool {
    // Clone the hook out so it may install or report without a live borrow.
    let hook = HOOKS.with(|hooks| hooks.borrow().last().map(|(_, hook)| Rc::clone(hook)));
    match hook {
        Some(hook) => {
            hook(&unhandled);
            true
        }
        None => {
            tracing::error!(
                file = unhandled.location.file(),
                line = unhandled.location.line(),
                "unhandled error returned from future: {}",
                unhandled.rejection
            );
            false
        }
    }
}

/// Spawn a fallible future nobody will wait on.
///
/// An `Err` is classified and passed to [`report_unhandled`]. The returned
/// handle resolves to the `Ok` value, if any.
///
/// # Panics
///
/// Panics when called outside a [`tokio::task::LocalSet`].
#[track_caller]
pub fn detach<F, T, E>(future: F) -> JoinHandle<Option<T>>
where
    F: Future<Output = Result<T, E>> + 'static,
    T: 'static,
    E: Debug + 'static,
{
    let location = Location::caller();
    tokio::task::spawn_local(async move {
        match future.await {
            Ok(value) => Some(value),
            Err(error) => {
                report_unhandled(UnhandledRejection {
                    rejection: Rejection::of(&error),
                    location,
                });
                None
            }
        }
    })
}
