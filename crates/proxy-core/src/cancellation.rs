//! Cooperative cancellation, attached to every call's context.

use tokio_util::sync::CancellationToken;

/// A cheap, clonable cancellation handle.
///
/// Signaled by a per-hook timeout, the per-call execution cap, or external
/// disposal. Hooks are expected to check it at suspension points; the
/// runner never force-terminates a non-cooperative hook, it only stops
/// awaiting it (see  "Cancellation").
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal(CancellationToken);

impl CancellationSignal {
    /// Create a fresh, unsignaled token.
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    /// Create a child signal: cancelling the parent cancels the child too,
    /// but cancelling the child does not affect the parent. Used to scope a
    /// single hook's timeout without tearing down the whole call.
    pub fn child(&self) -> Self {
        Self(self.0.child_token())
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }
}
