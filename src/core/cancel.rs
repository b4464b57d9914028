//! Cooperative cancellation shared between the sequencer and activity work.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Poll;

/// Cooperative cancellation token.
///
/// Clones share the same flag. The sequencer hands a clone to every
/// activity operation of a transition and cancels it when the next
/// transition begins or the current one is aborted. Observing the token
/// is the activity's job; nothing is interrupted forcibly.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Non-blocking cancellation check.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Resolves once cancellation is requested.
    ///
    /// Phase sequences re-poll their futures on every tick, so this does
    /// not need to register a waker.
    pub fn cancelled(&self) -> impl Future<Output = ()> + 'static {
        let flag = Arc::clone(&self.flag);
        futures::future::poll_fn(move |_| {
            if flag.load(Ordering::Acquire) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancelled_future_resolves_after_cancel() {
        let token = CancellationToken::new();
        let mut waiting = Box::pin(token.cancelled());

        assert!(waiting.as_mut().now_or_never().is_none());
        token.cancel();
        assert!(waiting.as_mut().now_or_never().is_some());
    }
}
