// companies-core: Live company directory between companies-api and consumers (CLI/TUI).

pub mod config;
pub mod decode;
pub mod error;
pub mod feed;
pub mod link;
pub mod model;
pub mod projector;
pub mod stream;
pub mod subscriber;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_COLLECTION, DEFAULT_RECENT_COUNT, FeedConfig, TlsVerification};
pub use decode::{DecodeObserver, DecodeStats, LogObserver};
pub use error::CoreError;
pub use feed::Feed;
pub use link::{LinkOpener, SystemOpener};
pub use model::Company;
pub use projector::{ViewModelProjector, ViewPhase, ViewState};
pub use stream::ViewStream;
pub use subscriber::{DataSubscriber, SnapshotEvent, Subscription, SubscriptionError};
