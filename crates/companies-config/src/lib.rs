//! Shared configuration for the companies CLI and TUI.
//!
//! TOML profiles, read-token resolution (env + keyring + plaintext), and
//! translation to `companies_core::FeedConfig`. Both binaries depend on
//! this crate; the CLI layers its global flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use companies_core::{DEFAULT_COLLECTION, DEFAULT_RECENT_COUNT, FeedConfig, TlsVerification};

/// Keyring service name for stored read tokens.
pub const KEYRING_SERVICE: &str = "companies";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no database configured (create a profile or pass --url)")]
    NoDatabase,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named database profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick the profile named `requested`, else the default profile.
    pub fn active_profile<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        match self.profiles.get(name) {
            Some(profile) => Ok((name, profile)),
            None if requested.is_none() && self.profiles.is_empty() => Err(ConfigError::NoDatabase),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Records shown in the "recent" strip.
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            recent_count: default_recent_count(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_recent_count() -> usize {
    DEFAULT_RECENT_COUNT
}

/// A named database profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Database root (e.g., "https://my-app-default-rtdb.firebaseio.com").
    pub database_url: String,

    /// Collection path below the root.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Read token (plaintext -- prefer keyring or env var).
    pub auth_token: Option<String>,

    /// Environment variable name containing the read token.
    pub auth_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override connect timeout (seconds).
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            collection: default_collection(),
            auth_token: None,
            auth_token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "mycompanies", "companies").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("companies");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `COMPANIES_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("COMPANIES_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/auth-token"))
}

/// Resolve the read token for a profile (no CLI flag step).
///
/// Order: env var named by `auth_token_env`, system keyring, plaintext.
/// `None` means the database is read without credentials.
pub fn resolve_auth_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_auth_token_with(
        profile,
        |name| std::env::var(name).ok(),
        || keyring_entry(profile_name).and_then(|e| e.get_password()).ok(),
    )
}

fn resolve_auth_token_with(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's auth_token_env -> env var lookup
    if let Some(token) = profile.auth_token_env.as_deref().and_then(env) {
        return Some(SecretString::from(token));
    }

    // 2. System keyring
    if let Some(token) = keyring() {
        return Some(SecretString::from(token));
    }

    // 3. Plaintext in config
    profile.auth_token.clone().map(SecretString::from)
}

/// Store a read token for `profile_name` in the system keyring.
pub fn store_auth_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `FeedConfig` from a profile and an already resolved token.
pub fn feed_config(
    profile: &Profile,
    defaults: &Defaults,
    auth: Option<SecretString>,
) -> Result<FeedConfig, ConfigError> {
    let mut feed = FeedConfig::new(parse_database_url(&profile.database_url)?);
    feed.collection.clone_from(&profile.collection);
    feed.auth = auth;
    feed.tls = tls_for(profile, defaults);
    feed.connect_timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    feed.recent_count = defaults.recent_count;
    Ok(feed)
}

/// Validate a database root URL.
pub fn parse_database_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "database_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "database_url".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}
