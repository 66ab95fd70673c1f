//! The ambient cancellation signal threaded through every optic operation.
//!
//! A [`Context`] is cheap to clone and is passed explicitly to each call.
//! Operations check it before loop-prone work and merge it into every error
//! they return, so a cancelled action is always distinguishable from a
//! business failure.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::optics::Context;
//!
//! let (context, handle) = Context::cancellable();
//! assert!(context.check().is_ok());
//!
//! handle.cancel("user aborted");
//! let error = context.check().unwrap_err();
//! assert!(error.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::OpticError;

const DEADLINE_REASON: &str = "deadline exceeded";

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

/// The ambient cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    state: Option<Arc<CancelState>>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled.
    #[must_use]
    pub const fn background() -> Self {
        Self {
            state: None,
            deadline: None,
        }
    }

    /// A context that can be cancelled through the returned handle.
    #[must_use]
    pub fn cancellable() -> (Self, CancelHandle) {
        let state = Arc::new(CancelState::default());
        let context = Self {
            state: Some(Arc::clone(&state)),
            deadline: None,
        };
        (context, CancelHandle { state })
    }

    /// Derives a context that is additionally cancelled once `timeout` elapses.
    #[must_use]
    pub fn with_deadline(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            state: self.state.clone(),
            deadline: Some(deadline),
        }
    }

    /// `true` once the context has been cancelled or its deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_reason().is_some()
    }

    fn cancellation_reason(&self) -> Option<String> {
        if let Some(state) = &self.state
            && state.cancelled.load(Ordering::Acquire)
        {
            return Some(
                state
                    .reason
                    .read()
                    .clone()
                    .unwrap_or_else(|| "cancelled".to_string()),
            );
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DEADLINE_REASON.to_string()),
            _ => None,
        }
    }

    /// Returns the cancellation error if the context is cancelled.
    ///
    /// # Errors
    ///
    /// A [`Cancelled`](super::ErrorKind::Cancelled) error when cancelled.
    pub fn check(&self) -> Result<(), OpticError> {
        match self.cancellation_reason() {
            Some(reason) => {
                tracing::trace!(%reason, "optic operation observed cancellation");
                Err(OpticError::cancelled(reason))
            }
            None => Ok(()),
        }
    }

    /// Merges the cancellation state into `error`.
    ///
    /// The error keeps its kind and path; when the context is cancelled it is
    /// additionally marked so that [`OpticError::is_cancelled`] reports `true`.
    #[must_use]
    pub fn join(&self, error: OpticError) -> OpticError {
        match self.cancellation_reason() {
            Some(reason) => error.with_cancellation(reason),
            None => error,
        }
    }
}

/// Cancels the [`Context`] it was created with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Cancels the context. Only the first reason is kept.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.state.reason.write();
        if slot.is_none() {
            *slot = Some(reason.into());
        }
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }
}
