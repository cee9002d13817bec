//! Data bridge: connects the [`Feed`] view stream to TUI actions.
//!
//! Runs as a background task: opens the subscription, then forwards every
//! projected state as an [`Action`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use companies_core::Feed;

use crate::action::Action;

/// Spawn the data bridge connecting a [`Feed`] to the TUI.
///
/// Subscribes to the projected state before starting the feed so the
/// first event cannot be missed. Shuts the feed down on cancellation.
pub async fn spawn_data_bridge(
    feed: Feed,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut state = feed.state();
    feed.start().await;

    // Push the current state so the screen starts in the loading layout
    let _ = action_tx.send(Action::StateUpdated(state.latest()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            next = state.changed() => {
                let Some(next) = next else { break };
                debug!(
                    loading = next.loading,
                    records = next.records.len(),
                    error = next.error.as_deref().unwrap_or(""),
                    "dispatching StateUpdated"
                );
                if action_tx.send(Action::StateUpdated(next)).is_err() {
                    break;
                }
            }
        }
    }

    feed.shutdown().await;
    debug!("data bridge shut down");
}
