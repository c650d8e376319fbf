//! Per-call operation context
//!
//! Carries the caller's deadline, cancellation signal and correlation id into
//! every store operation. `run` races the operation against both; the losing
//! future is dropped, which abandons the in-flight network call.

use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use super::DomainError;

#[derive(Clone, Debug, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
    request_id: Option<String>,
}

/// Cancels every context derived from the pair it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl OpContext {
    /// No deadline, not cancellable.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Default::default()
        }
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        Self::default().cancellable()
    }

    /// Derive a cancellable copy that keeps this context's deadline and id.
    pub fn cancellable(self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            ..self
        };
        (ctx, CancelHandle { tx: Arc::new(tx) })
    }

    /// Tighten the deadline; an earlier existing deadline is kept.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run `operation` under this context.
    ///
    /// Fails with `Cancelled` or `Timeout` without polling `operation` when the
    /// context is already done.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        if self.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.is_expired() {
            return Err(DomainError::Timeout);
        }

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => sleep_until(d).await,
                None => pending::<()>().await,
            }
        };

        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            match cancel.as_mut() {
                Some(rx) => {
                    // A dropped handle can no longer cancel.
                    let closed = rx.wait_for(|c| *c).await.is_err();
                    if closed {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            result = operation => result,
            _ = expired => Err(DomainError::Timeout),
            _ = cancelled => Err(DomainError::Cancelled),
        }
    }
}
