//! Cooperative cancellation for hosting API calls.
//!
//! A [`Cancellation`] is shared by every evaluator in one evaluation. It fires
//! either when [`Cancellation::cancel`] is called or when its deadline passes.
//! Hosting calls check it before going out and sleeps wake early once it fires.

use crate::error::{Result, TrustError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest uninterrupted nap inside [`Cancellation::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<Cancellation>,
}

/// Cloneable cancellation token with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

impl Cancellation {
    /// A token that only fires when cancelled explicitly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that fires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
                parent: None,
            }),
        }
    }

    /// A token that fires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A token that fires with this one, or on its own after `timeout`.
    ///
    /// Cancelling the child leaves the parent untouched.
    #[must_use]
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: timeout.map(|t| Instant::now() + t),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Fire the token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// The earliest deadline of this token and its ancestors.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        let inherited = self.inner.parent.as_ref().and_then(Self::deadline);
        match (self.inner.deadline, inherited) {
            (Some(own), Some(parent)) => Some(own.min(parent)),
            (own, parent) => own.or(parent),
        }
    }

    /// Whether this token or an ancestor was cancelled or its deadline has
    /// passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
            || self.inner.deadline.is_some_and(|d| Instant::now() >= d)
            || self.inner.parent.as_ref().is_some_and(Self::is_cancelled)
    }

    /// Return a cancelled error if the token has fired.
    pub fn check(&self, context: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(TrustError::cancelled(context))
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking early with an error if the token fires.
    pub fn sleep(&self, duration: Duration, context: &str) -> Result<()> {
        let wake_at = Instant::now() + duration;
        loop {
            self.check(context)?;
            let now = Instant::now();
            if now >= wake_at {
                return Ok(());
            }
            std::thread::sleep((wake_at - now).min(SLEEP_SLICE));
        }
    }
}
