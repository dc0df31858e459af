//! Cooperative, one-shot cancellation for a single transport attempt.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Weak,
};
use std::time::Duration;

use tokio::{sync::Notify, task::AbortHandle};

/// Cancellation signal handed to [`Transport::send`](crate::Transport::send).
///
/// Clones share state: triggering any clone cancels all of them.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
    deadline: Option<Duration>,
    timer: Mutex<Option<AbortHandle>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().ok().and_then(Option::take);
        if let Some(timer) = timer {
            timer.abort();
        }
    }
}

impl CancellationToken {
    /// Creates a token that only cancels when [`trigger`](Self::trigger) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that triggers itself once `deadline` has elapsed.
    ///
    /// Must be called from within a tokio runtime. The timer is aborted when the
    /// last clone of the token is dropped.
    pub fn with_deadline(deadline: Duration) -> Self {
        let inner = Arc::new(Inner {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
            deadline: Some(deadline),
            timer: Mutex::new(None),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if let Some(inner) = weak.upgrade() {
                Inner::trigger(&inner);
            }
        });

        if let Ok(mut timer) = inner.timer.lock() {
            *timer = Some(handle.abort_handle());
        }

        Self { inner }
    }

    /// Cancels the token. Calls after the first are no-ops.
    pub fn trigger(&self) {
        Inner::trigger(&self.inner);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Deadline the token was armed with, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.inner.deadline
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent trigger is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn trigger(inner: &Inner) {
        if !inner.cancelled.swap(true, Ordering::AcqRel) {
            inner.notify.notify_waiters();
        }
    }
}
