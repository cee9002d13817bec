//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use companies_config::ConfigError;
use companies_core::{CoreError, SubscriptionError};

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to database at {url}")]
    #[diagnostic(
        code(companies::connection_failed),
        help(
            "Check the database URL and your network connection.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Subscription failed: {message}")]
    #[diagnostic(
        code(companies::subscription_failed),
        help("The live subscription ended. Run the command again to re-subscribe.")
    )]
    Subscription { message: String },

    // ── Authorization ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(companies::permission_denied),
        help(
            "The database rules refused the read.\n\
             Pass a read token with --token, or store one with: companies config set-token"
        )
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Company '{identifier}' not found")]
    #[diagnostic(
        code(companies::not_found),
        help("Run: companies list to see available companies")
    )]
    NotFound { identifier: String },

    #[error("Could not open {target}")]
    #[diagnostic(
        code(companies::open_failed),
        help("No default browser could be launched: {reason}\nTry: companies open <id> --print")
    )]
    OpenFailed { target: String, reason: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(companies::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(companies::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(companies::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: companies -p {name} config set database_url <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No database configured")]
    #[diagnostic(
        code(companies::no_config),
        help(
            "Pass --url, or create a profile with: companies config set database_url <URL>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(companies::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(companies::keyring),
        help("Store the token in an environment variable and set auth_token_env instead.")
    )]
    Keyring(String),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Connection timed out after {seconds}s")]
    #[diagnostic(
        code(companies::timeout),
        help("Increase the timeout with --timeout or check the database URL.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(companies::render))]
    Render(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::PermissionDenied { .. } | Self::Keyring(_) => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "Database connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::CompanyNotFound { identifier } => CliError::NotFound { identifier },

            CoreError::LinkOpenFailed { target, reason } => CliError::OpenFailed { target, reason },

            CoreError::Api { message, status } => CliError::ApiError {
                message: match status {
                    Some(status) => format!("HTTP {status}: {message}"),
                    None => message,
                },
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError { message },
        }
    }
}

// ── SubscriptionError → CliError mapping ─────────────────────────────

impl From<&SubscriptionError> for CliError {
    fn from(err: &SubscriptionError) -> Self {
        let message = err.message().to_owned();
        if err.is_permission_denied() {
            CliError::PermissionDenied { message }
        } else {
            CliError::Subscription { message }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                available: available_profiles(),
                name,
            },
            ConfigError::NoDatabase => CliError::NoConfig {
                path: companies_config::config_path().display().to_string(),
            },
            ConfigError::Keyring(e) => CliError::Keyring(e.to_string()),
            ConfigError::Serialization(e) => CliError::Render(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

/// Comma-separated profile names from the config file, or `(none)`.
pub fn available_profiles() -> String {
    let cfg = companies_config::load_config_or_default();
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        let denied: CliError = CoreError::PermissionDenied {
            message: "Permission denied".into(),
        }
        .into();
        assert_eq!(denied.exit_code(), exit_code::AUTH);
        assert_eq!(denied.to_string(), "Permission denied");

        let timeout: CliError = CoreError::Timeout { timeout_secs: 3 }.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let missing: CliError = CoreError::CompanyNotFound {
            identifier: "7".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let usage = CliError::Validation {
            field: "timeout".into(),
            reason: "must be a number".into(),
        };
        assert_eq!(usage.exit_code(), exit_code::USAGE);

        let sub = CliError::Subscription {
            message: "Disconnected".into(),
        };
        assert_eq!(sub.exit_code(), exit_code::GENERAL);
        assert_ne!(sub.exit_code(), exit_code::SUCCESS);
    }
}
