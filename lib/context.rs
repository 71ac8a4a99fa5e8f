//! Cancellation and deadline context for remote validation.

use crate::error::{RegistryError, RegistryResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Caller-supplied context for operations that touch the network.
///
/// Cancelling the token aborts the in-flight operation with [`RegistryError::Cancelled`];
/// an elapsed timeout yields [`RegistryError::Timeout`]. Neither is reported as a fetch failure.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ValidationContext {
    /// Create a context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline applied to each call of [`ValidationContext::run`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Derive a context that is cancelled with this one but can be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            timeout: self.timeout,
        }
    }

    /// Cancel this context and all children.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The configured deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Drive `fut` to completion unless the context is cancelled or the deadline elapses.
    pub async fn run<F, T>(&self, fut: F) -> RegistryResult<T>
    where
        F: Future<Output = RegistryResult<T>>,
    {
        if self.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(RegistryError::Cancelled),
                result = fut => result,
            }
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| RegistryError::Timeout(limit))?,
            None => guarded.await,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = ValidationContext::new();
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let ctx = ValidationContext::new();
        ctx.cancel();
        let err = ctx.run(async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, RegistryError::Cancelled));
    }

    #[tokio::test]
    async fn test_run_cancelled_in_flight() {
        let ctx = ValidationContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Cancelled));
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = ValidationContext::new().with_timeout(Duration::from_millis(10));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_child_follows_parent() {
        let parent = ValidationContext::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
