//! Request-scoped execution context
//!
//! Carries the cancellation signal, an optional deadline, and the identity of
//! the request being served. Cloning is cheap and clones share cancellation.

use crate::ids::OrgId;
use crate::{Error, Result};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Identity of the query being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub organization_id: OrgId,
}

impl Request {
    pub fn new(organization_id: OrgId) -> Self {
        Self { organization_id }
    }
}

/// Execution context passed through every provider and reader call
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    request: Option<Arc<Request>>,
}

impl ExecutionContext {
    /// Create a context with no request, no deadline, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the request identity
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(Arc::new(request));
        self
    }

    /// Set an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context whose cancellation is a child of this one.
    ///
    /// Cancelling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
            request: self.request.clone(),
        }
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Organization of the current request
    pub fn organization_id(&self) -> Result<OrgId> {
        self.request()
            .map(|req| req.organization_id)
            .ok_or_else(|| Error::Invalid("missing request on context".to_string()))
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes,
    /// yielding the corresponding error.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Error::Canceled,
                    _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                Error::Canceled
            }
        }
    }

    /// Drive `fut` to completion unless the context finishes first, in which
    /// case `fut` is dropped.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }
}
