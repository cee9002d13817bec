// ── Feed abstraction ──
//
// Wires one DataSubscriber to one ViewModelProjector. A single pump task
// owns the subscription and folds its events into the projector; readers
// watch the projected state. No reconnect: after a failure the consumer
// calls `resubscribe`.

use std::sync::Arc;

use companies_api::{DatabaseClient, TlsMode, TransportConfig};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{FeedConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::Company;
use crate::projector::{ViewModelProjector, ViewState};
use crate::stream::ViewStream;
use crate::subscriber::{DataSubscriber, SnapshotEvent, Subscription, SubscriptionError};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<FeedInner>`. Call [`start`](Self::start) to
/// open the subscription, then watch [`state`](Self::state).
#[derive(Clone)]
pub struct Feed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    config: FeedConfig,
    subscriber: DataSubscriber,
    projector: Arc<ViewModelProjector>,
    /// Terminal error of the current subscription, if it has failed.
    failure: watch::Sender<Option<SubscriptionError>>,
    cancel: CancellationToken,
    pump: Mutex<Option<Pump>>,
}

struct Pump {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Feed {
    /// Create a feed from configuration. Does NOT connect.
    pub fn new(config: FeedConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = DatabaseClient::new(
            config.database_url.clone(),
            config.auth.clone(),
            &transport,
        )?;
        Ok(Self::with_subscriber(config, DataSubscriber::new(client)))
    }

    /// Create a feed around an existing subscriber.
    pub fn with_subscriber(config: FeedConfig, subscriber: DataSubscriber) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                config,
                subscriber,
                projector: Arc::new(ViewModelProjector::new()),
                failure: watch::Sender::new(None),
                cancel: CancellationToken::new(),
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    // ── Subscription lifecycle ───────────────────────────────────

    /// Open the subscription and start projecting its events.
    ///
    /// Replaces any running subscription, restarting from the loading
    /// state.
    pub async fn start(&self) {
        if self.inner.cancel.is_cancelled() {
            debug!("feed already shut down, not starting");
            return;
        }
        let mut pump = self.inner.pump.lock().await;
        if let Some(old) = pump.take() {
            stop_pump(old).await;
        }
        self.inner.failure.send_replace(None);
        self.inner.projector.reset();

        let collection = &self.inner.config.collection;
        let subscription = self.inner.subscriber.subscribe(collection);
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(pump_task(
            subscription,
            Arc::clone(&self.inner.projector),
            self.inner.failure.clone(),
            cancel.clone(),
        ));
        *pump = Some(Pump { cancel, handle });
        info!(collection = %collection, "feed started");
    }

    /// Drop the current subscription and open a fresh one.
    pub async fn resubscribe(&self) {
        debug!("resubscribing");
        self.start().await;
    }

    /// Cancel the subscription and wait for the pump task to exit.
    ///
    /// The last projected state stays readable. A shut-down feed does not
    /// start again.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(old) = self.inner.pump.lock().await.take() {
            stop_pump(old).await;
        }
        debug!("feed shut down");
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to projected state changes.
    pub fn state(&self) -> ViewStream {
        self.inner.projector.subscribe()
    }

    /// Current projected state.
    pub fn snapshot(&self) -> Arc<ViewState> {
        self.inner.projector.snapshot()
    }

    /// The error that ended the current subscription.
    ///
    /// Set before the error state is published, so a reader that sees
    /// `ViewState::error` also sees this.
    pub fn failure(&self) -> Option<SubscriptionError> {
        self.inner.failure.borrow().clone()
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Read the collection once, sorted the same way the view sorts it.
    pub async fn fetch_once(&self) -> Result<Vec<Company>, CoreError> {
        let mut companies = self
            .inner
            .subscriber
            .fetch(&self.inner.config.collection)
            .await?;
        companies.sort_by_key(|c| c.id);
        Ok(companies)
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn pump_task(
    mut subscription: Subscription,
    projector: Arc<ViewModelProjector>,
    failure: watch::Sender<Option<SubscriptionError>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                subscription.cancel();
                break;
            }
            event = subscription.next() => {
                let Some(event) = event else { break };
                let terminal = match &event {
                    SnapshotEvent::Error(err) => {
                        failure.send_replace(Some(err.clone()));
                        true
                    }
                    SnapshotEvent::Success(_) => false,
                };
                projector.apply(&event);
                if terminal {
                    break;
                }
            }
        }
    }
    debug!(path = subscription.path(), "feed pump exited");
}

async fn stop_pump(pump: Pump) {
    pump.cancel.cancel();
    let _ = pump.handle.await;
}

fn build_transport(config: &FeedConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        connect_timeout: config.connect_timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
