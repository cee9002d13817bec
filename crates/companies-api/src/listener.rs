//! Live collection listener.
//!
//! Opens a streaming read on one database node, mirrors the node locally,
//! and sends a whole-collection [`CollectionSnapshot`] through an `mpsc`
//! channel after every `put` / `patch`. The first snapshot is the initial
//! read. Any failure is sent once as [`ListenerEvent::Failed`] and ends the
//! listener; there is no automatic reconnect.
//!
//! # Example
//!
//! ```rust,ignore
//! use companies_api::{DatabaseClient, ListenerEvent, ListenerHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut handle = ListenerHandle::spawn(client, "companies", CancellationToken::new());
//!
//! while let Some(event) = handle.next().await {
//!     match event {
//!         ListenerEvent::Snapshot(snap) => println!("{} children", snap.children.len()),
//!         ListenerEvent::Failed(err) => eprintln!("listener failed: {err}"),
//!     }
//! }
//! ```

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{DatabaseClient, StreamEvent};
use crate::error::Error;
use crate::tree::CollectionMirror;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 64;

// ── Events ───────────────────────────────────────────────────────────

/// Full contents of the listened collection at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    /// Collection path as passed to the listener.
    pub path: String,
    /// Direct children `(key, value)` in the database's key order.
    pub children: Vec<(String, Value)>,
}

/// What a listener delivers.
#[derive(Debug)]
pub enum ListenerEvent {
    Snapshot(CollectionSnapshot),
    /// Terminal: no further events follow.
    Failed(Error),
}

// ── ListenerHandle ───────────────────────────────────────────────────

/// Handle to a running collection listener.
///
/// Owns the background task. [`shutdown`](Self::shutdown) or dropping the
/// handle cancels the task and closes the HTTP connection.
pub struct ListenerHandle {
    event_rx: mpsc::Receiver<ListenerEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Spawn the listener task for `path`.
    ///
    /// Returns immediately; the connection is opened in the background and
    /// results arrive through [`next`](Self::next).
    pub fn spawn(client: DatabaseClient, path: impl Into<String>, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let path = path.into();

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            listen(client, path, event_tx, task_cancel).await;
        });

        Self {
            event_rx,
            cancel,
            task,
        }
    }

    /// Receive the next event in arrival order.
    ///
    /// Returns `None` once the listener has stopped (after a `Failed`
    /// event or cancellation).
    pub async fn next(&mut self) -> Option<ListenerEvent> {
        self.event_rx.recv().await
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        // A task parked on a slow connect never reaches its cancel check
        self.task.abort();
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn listen(
    client: DatabaseClient,
    path: String,
    event_tx: mpsc::Sender<ListenerEvent>,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(path = %path, "listener cancelled");
        }
        result = read_stream(&client, &path, &event_tx) => {
            if let Err(e) = result {
                tracing::warn!(path = %path, error = %e, "listener failed");
                // Ignore send errors -- the consumer is already gone.
                let _ = event_tx.send(ListenerEvent::Failed(e)).await;
            }
        }
    }
}

/// Read the stream until it fails. `Ok(())` means the consumer went away.
async fn read_stream(
    client: &DatabaseClient,
    path: &str,
    event_tx: &mpsc::Sender<ListenerEvent>,
) -> Result<(), Error> {
    let events = client.events(path);
    futures_util::pin_mut!(events);
    let mut mirror = CollectionMirror::new();

    while let Some(event) = events.next().await {
        let Some(snapshot) = apply_event(&mut mirror, path, event?)? else {
            continue;
        };
        tracing::debug!(path, children = snapshot.children.len(), "collection snapshot");
        if event_tx.send(ListenerEvent::Snapshot(snapshot)).await.is_err() {
            return Ok(());
        }
    }

    Err(Error::Disconnected)
}

/// Apply one stream event to the mirror, producing a snapshot when the
/// collection content changed.
fn apply_event(
    mirror: &mut CollectionMirror,
    path: &str,
    event: StreamEvent,
) -> Result<Option<CollectionSnapshot>, Error> {
    match event {
        StreamEvent::Put { path: at, data } => mirror.put(&at, data),
        StreamEvent::Patch { path: at, data } => mirror.patch(&at, data),
        StreamEvent::KeepAlive => return Ok(None),
        StreamEvent::Cancel { reason } => {
            return Err(Error::PermissionDenied {
                message: reason.unwrap_or_else(|| "Permission denied".into()),
            });
        }
        StreamEvent::AuthRevoked => return Err(Error::AuthRevoked),
    }

    Ok(Some(CollectionSnapshot {
        path: path.to_owned(),
        children: mirror.children(),
    }))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn put(path: &str, data: Value) -> StreamEvent {
        StreamEvent::Put {
            path: path.into(),
            data,
        }
    }

    #[test]
    fn first_put_yields_initial_snapshot() {
        let mut mirror = CollectionMirror::new();
        let snap = apply_event(
            &mut mirror,
            "companies",
            put("/", json!({"b": {"id": 2}, "a": {"id": 1}})),
        )
        .unwrap()
        .unwrap();

        assert_eq!(snap.path, "companies");
        let keys: Vec<_> = snap.children.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn empty_collection_yields_empty_snapshot() {
        let mut mirror = CollectionMirror::new();
        let snap = apply_event(&mut mirror, "companies", put("/", Value::Null))
            .unwrap()
            .unwrap();
        assert!(snap.children.is_empty());
    }

    #[test]
    fn keep_alive_yields_nothing() {
        let mut mirror = CollectionMirror::new();
        assert!(
            apply_event(&mut mirror, "companies", StreamEvent::KeepAlive)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn patch_yields_full_collection_not_delta() {
        let mut mirror = CollectionMirror::new();
        apply_event(&mut mirror, "c", put("/", json!({"a": {"id": 1}}))).unwrap();
        let snap = apply_event(
            &mut mirror,
            "c",
            StreamEvent::Patch {
                path: "/".into(),
                data: json!({"b": {"id": 2}}),
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(snap.children.len(), 2);
    }

    #[test]
    fn cancel_maps_to_permission_denied() {
        let mut mirror = CollectionMirror::new();
        let err = apply_event(&mut mirror, "c", StreamEvent::Cancel { reason: None }).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied");
    }

    #[test]
    fn auth_revoked_is_terminal_error() {
        let mut mirror = CollectionMirror::new();
        let err = apply_event(&mut mirror, "c", StreamEvent::AuthRevoked).unwrap_err();
        assert!(matches!(err, Error::AuthRevoked));
    }
}
