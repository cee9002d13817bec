// ── Reactive view streams ──
//
// Subscription type for consuming projected state from the projector.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::projector::ViewState;

/// A subscription to the projected view state.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed`](Self::changed) or by converting to a `Stream`.
pub struct ViewStream {
    current: Arc<ViewState>,
    receiver: watch::Receiver<Arc<ViewState>>,
}

impl ViewStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ViewState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The state captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<ViewState> {
        &self.current
    }

    /// The latest state (may have changed since creation).
    pub fn latest(&self) -> Arc<ViewState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new state.
    /// Returns `None` once the projector has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<ViewState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&state);
        Some(state)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// Yields the current state first, then one item per change.
    pub fn into_stream(self) -> ViewWatchStream {
        ViewWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct ViewWatchStream {
    inner: WatchStream<Arc<ViewState>>,
}

impl Stream for ViewWatchStream {
    type Item = Arc<ViewState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
