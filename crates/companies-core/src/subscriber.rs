// ── DataSubscriber ──
//
// Live subscription to the company collection. Every change, including
// the first read, becomes one `SnapshotEvent` holding either all decodable
// records or a terminal error. Delivery is serialized through the
// listener's channel; nothing is retried.

use std::sync::Arc;

use companies_api::{CollectionSnapshot, DatabaseClient, ListenerEvent, ListenerHandle};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::decode::{DecodeObserver, LogObserver, decode_children};
use crate::error::CoreError;
use crate::model::Company;

// ── Events ───────────────────────────────────────────────────────────

/// Failure of a subscription. Only its message reaches the view; callers
/// outside the view can still tell a rejected read from everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionError {
    message: String,
    permission_denied: bool,
}

impl SubscriptionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            permission_denied: false,
        }
    }

    /// The server refused the read or revoked the token.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            permission_denied: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_permission_denied(&self) -> bool {
        self.permission_denied
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SubscriptionError {}

impl From<&companies_api::Error> for SubscriptionError {
    fn from(err: &companies_api::Error) -> Self {
        if err.is_permission_denied() {
            Self::permission_denied(err.to_string())
        } else {
            Self::new(err.to_string())
        }
    }
}

/// One delivery from a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// Every child that decoded, in the database's key order.
    Success(Vec<Company>),
    /// Terminal: the subscription delivers nothing after this.
    Error(SubscriptionError),
}

// ── DataSubscriber ───────────────────────────────────────────────────

/// Opens subscriptions on collections of one database.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct DataSubscriber {
    client: DatabaseClient,
    observer: Arc<dyn DecodeObserver>,
}

impl std::fmt::Debug for DataSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSubscriber")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl DataSubscriber {
    /// Subscriber that logs rejected children at `debug`.
    pub fn new(client: DatabaseClient) -> Self {
        Self {
            client,
            observer: Arc::new(LogObserver),
        }
    }

    /// Replace the observer that receives rejected children.
    pub fn with_observer(mut self, observer: Arc<dyn DecodeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn client(&self) -> &DatabaseClient {
        &self.client
    }

    /// Open a live subscription on `path`.
    ///
    /// Returns immediately; the connection is set up in the background.
    /// Must be called inside a Tokio runtime.
    pub fn subscribe(&self, path: &str) -> Subscription {
        let cancel = CancellationToken::new();
        let listener = ListenerHandle::spawn(self.client.clone(), path, cancel.clone());
        debug!(path, "subscription opened");

        Subscription {
            path: path.to_owned(),
            listener,
            cancel,
            observer: Arc::clone(&self.observer),
        }
    }

    /// One-shot read of `path`, decoded with the same rules as a snapshot.
    pub async fn fetch(&self, path: &str) -> Result<Vec<Company>, CoreError> {
        let value = self.client.get(path).await?;
        let children = companies_api::tree::children_of(value);
        Ok(decode_snapshot(path, children, self.observer.as_ref()))
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// Handle to one live subscription.
///
/// Holds the network connection while alive. [`cancel`](Self::cancel) or
/// dropping the handle releases it.
pub struct Subscription {
    path: String,
    listener: ListenerHandle,
    cancel: CancellationToken,
    observer: Arc<dyn DecodeObserver>,
}

impl Subscription {
    /// Collection path this subscription listens on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next event in arrival order.
    ///
    /// Returns `None` after an `Error` event or once cancelled.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let event = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return None,
            event = self.listener.next() => event?,
        };

        Some(match event {
            ListenerEvent::Snapshot(CollectionSnapshot { path, children }) => {
                SnapshotEvent::Success(decode_snapshot(&path, children, self.observer.as_ref()))
            }
            ListenerEvent::Failed(err) => {
                warn!(path = %self.path, error = %err, "subscription failed");
                SnapshotEvent::Error(SubscriptionError::from(&err))
            }
        })
    }

    /// Stop listening and close the connection. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!(path = %self.path, "subscription cancelled");
        }
        self.listener.shutdown();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Convert into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = SnapshotEvent> + Send + 'static {
        futures_util::stream::unfold(self, |mut sub| async move {
            let event = sub.next().await?;
            Some((event, sub))
        })
    }
}

fn decode_snapshot(
    path: &str,
    children: Vec<(String, serde_json::Value)>,
    observer: &dyn DecodeObserver,
) -> Vec<Company> {
    let total = children.len();
    let companies = decode_children(children, observer);
    debug!(
        path,
        children = total,
        rejected = total - companies.len(),
        "decoded snapshot"
    );
    companies
}
