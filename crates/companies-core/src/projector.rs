// ── ViewModelProjector ──
//
// Folds subscription events into render-ready state and publishes each
// new state through a `watch` channel. Loading -> Ready on the first
// success; any error -> Failed, which only a fresh subscription leaves.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::model::Company;
use crate::stream::ViewStream;
use crate::subscriber::SnapshotEvent;

/// What the rendering surface draws.
///
/// Readers only ever see this behind an `Arc`; a new value is built for
/// every event.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    /// Sorted ascending by id. Records with equal ids keep arrival order.
    pub records: Arc<Vec<Company>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::initial()
    }
}

impl ViewState {
    /// Before any event: loading, no error, no records.
    pub fn initial() -> Self {
        Self {
            loading: true,
            error: None,
            records: Arc::new(Vec::new()),
        }
    }

    /// The state after `event`. Pure: the same event on the same state
    /// always gives the same result.
    pub fn apply(&self, event: &SnapshotEvent) -> Self {
        match event {
            SnapshotEvent::Success(companies) => {
                let mut records = companies.clone();
                records.sort_by_key(|c| c.id);
                Self {
                    loading: false,
                    error: None,
                    records: Arc::new(records),
                }
            }
            SnapshotEvent::Error(err) => Self {
                loading: false,
                error: Some(err.message().to_owned()),
                records: Arc::clone(&self.records),
            },
        }
    }

    /// Exactly one of these is rendered.
    pub fn phase(&self) -> ViewPhase {
        if self.loading {
            ViewPhase::Loading
        } else if self.error.is_some() {
            ViewPhase::Failed
        } else {
            ViewPhase::Ready
        }
    }

    /// The first `count` records, for the "recent" strip.
    pub fn recent(&self, count: usize) -> &[Company] {
        let end = count.min(self.records.len());
        &self.records[..end]
    }
}

/// Which of the three layouts the surface shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Loading,
    Failed,
    Ready,
}

// ── Projector ────────────────────────────────────────────────────────

/// Owns the current [`ViewState`] and publishes every change.
pub struct ViewModelProjector {
    state: watch::Sender<Arc<ViewState>>,
}

impl Default for ViewModelProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModelProjector {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(ViewState::initial()));
        Self { state }
    }

    /// Fold one event into the state and publish the result.
    pub fn apply(&self, event: &SnapshotEvent) -> Arc<ViewState> {
        let next = Arc::new(self.state.borrow().apply(event));
        debug!(
            loading = next.loading,
            error = next.error.as_deref(),
            records = next.records.len(),
            "view state updated"
        );
        // `send_replace` updates unconditionally, even with zero receivers.
        self.state.send_replace(Arc::clone(&next));
        next
    }

    /// Back to the initial loading state, for a fresh subscription.
    pub fn reset(&self) {
        self.state.send_replace(Arc::new(ViewState::initial()));
    }

    /// Current state (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<ViewState> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> ViewStream {
        ViewStream::new(self.state.subscribe())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::subscriber::SubscriptionError;

    fn company(id: i64, title: &str) -> Company {
        Company {
            id,
            title: title.into(),
            ..Company::default()
        }
    }

    fn titles(state: &ViewState) -> Vec<&str> {
        state.records.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn initial_state_is_loading() {
        let state = ViewState::initial();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert!(state.records.is_empty());
        assert_eq!(state.phase(), ViewPhase::Loading);
    }

    #[test]
    fn success_sorts_by_id() {
        let state = ViewState::initial().apply(&SnapshotEvent::Success(vec![
            company(2, "B"),
            company(1, "A"),
        ]));
        assert!(!state.loading);
        assert_eq!(titles(&state), ["A", "B"]);
        assert_eq!(state.phase(), ViewPhase::Ready);
    }

    #[test]
    fn duplicate_ids_keep_arrival_order() {
        let state = ViewState::initial().apply(&SnapshotEvent::Success(vec![
            company(5, "first"),
            company(1, "low"),
            company(5, "second"),
        ]));
        assert_eq!(titles(&state), ["low", "first", "second"]);
    }

    #[test]
    fn replaying_an_event_is_idempotent() {
        let event = SnapshotEvent::Success(vec![company(3, "C"), company(1, "A")]);
        let once = ViewState::initial().apply(&event);
        let twice = once.apply(&event);
        assert_eq!(once, twice);
    }

    #[test]
    fn first_event_error_leaves_records_empty() {
        let state = ViewState::initial().apply(&SnapshotEvent::Error(SubscriptionError::new(
            "PERMISSION_DENIED",
        )));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("PERMISSION_DENIED"));
        assert!(state.records.is_empty());
        assert_eq!(state.phase(), ViewPhase::Failed);
    }

    #[test]
    fn error_after_success_keeps_records() {
        let ready = ViewState::initial().apply(&SnapshotEvent::Success(vec![company(1, "A")]));
        let failed = ready.apply(&SnapshotEvent::Error(SubscriptionError::new("Disconnected")));
        assert_eq!(failed.error.as_deref(), Some("Disconnected"));
        assert!(Arc::ptr_eq(&ready.records, &failed.records));
    }

    #[test]
    fn disjoint_success_fully_replaces_records() {
        let first = ViewState::initial().apply(&SnapshotEvent::Success(vec![
            company(1, "A"),
            company(2, "B"),
        ]));
        let second = first.apply(&SnapshotEvent::Success(vec![company(9, "Z")]));
        assert_eq!(titles(&second), ["Z"]);
    }

    #[test]
    fn recent_is_a_prefix_of_the_sorted_list() {
        let state = ViewState::initial().apply(&SnapshotEvent::Success(
            (1..=8).rev().map(|i| company(i, "x")).collect(),
        ));
        let ids: Vec<i64> = state.recent(5).iter().map(|c| c.id).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        assert_eq!(ViewState::initial().recent(5).len(), 0);
    }

    #[test]
    fn projector_publishes_and_resets() {
        let projector = ViewModelProjector::new();
        let stream = projector.subscribe();
        assert!(stream.current().loading);

        projector.apply(&SnapshotEvent::Success(vec![company(1, "A")]));
        assert_eq!(stream.latest().records.len(), 1);

        projector.reset();
        assert!(projector.snapshot().loading);
        assert!(stream.latest().records.is_empty());
    }
}
