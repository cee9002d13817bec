// ── Runtime feed configuration ──
//
// These types describe *where* the company collection lives and how to
// reach it. They carry the read credential and connection tuning, but
// never touch disk. The CLI/TUI builds a `FeedConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Number of records shown in the "recent" strip.
pub const DEFAULT_RECENT_COUNT: usize = 5;

/// Collection read when none is configured.
pub const DEFAULT_COLLECTION: &str = "companies";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local emulators behind self-signed proxies).
    DangerAcceptInvalid,
}

/// Configuration for one company feed.
///
/// Built by CLI/TUI, passed to `Feed` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Database root (e.g., `https://my-app-default-rtdb.firebaseio.com`).
    pub database_url: Url,
    /// Collection path below the root.
    pub collection: String,
    /// Static read credential passed through as `?auth=`. No sign-in flow.
    pub auth: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Bound on establishing the connection. The stream itself has none.
    pub connect_timeout: Duration,
    /// How many records the "recent" strip shows.
    pub recent_count: usize,
}

impl FeedConfig {
    /// Config for `database_url` with every other field at its default.
    pub fn new(database_url: Url) -> Self {
        Self {
            database_url,
            collection: DEFAULT_COLLECTION.into(),
            auth: None,
            tls: TlsVerification::default(),
            connect_timeout: Duration::from_secs(30),
            recent_count: DEFAULT_RECENT_COUNT,
        }
    }
}
