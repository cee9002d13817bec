// ── Core error types ──
//
// User-facing errors from companies-core. Consumers never see raw HTTP
// statuses or JSON parse failures. The `From<companies_api::Error>` impl
// translates transport-layer errors into domain variants.
//
// A running subscription does not surface these: its failures reach the
// view as an opaque `SubscriptionError` message instead.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to database at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Database disconnected")]
    Disconnected,

    #[error("Database connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Company not found: {identifier}")]
    CompanyNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Cannot open {target}: {reason}")]
    LinkOpenFailed { target: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if the database refused the read.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<companies_api::Error> for CoreError {
    fn from(err: companies_api::Error) -> Self {
        match err {
            companies_api::Error::Transport(ref e) => {
                // A timeout with a known bound arrives as `Error::Timeout`
                if e.is_timeout() || e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            companies_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            companies_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            companies_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            companies_api::Error::PermissionDenied { message } => {
                CoreError::PermissionDenied { message }
            }
            companies_api::Error::AuthRevoked => CoreError::PermissionDenied {
                message: "Auth token is no longer valid".into(),
            },
            companies_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            companies_api::Error::Disconnected => CoreError::Disconnected,
            companies_api::Error::Protocol(msg) => {
                CoreError::Internal(format!("Stream protocol error: {msg}"))
            }
            companies_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_stay_permission_errors() {
        let core: CoreError = companies_api::Error::PermissionDenied {
            message: "Permission denied".into(),
        }
        .into();
        assert!(core.is_permission_denied());

        let revoked: CoreError = companies_api::Error::AuthRevoked.into();
        assert!(revoked.is_permission_denied());
        assert!(revoked.to_string().contains("no longer valid"));
    }

    #[test]
    fn http_status_is_kept() {
        let core: CoreError = companies_api::Error::Http {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(core, CoreError::Api { status: Some(500), .. }));
    }

    #[test]
    fn timeout_keeps_configured_bound() {
        let core: CoreError = companies_api::Error::Timeout { timeout_secs: 7 }.into();
        assert!(matches!(core, CoreError::Timeout { timeout_secs: 7 }));
        assert!(core.to_string().contains("7s"), "{core}");
    }

    #[test]
    fn stream_end_maps_to_disconnected() {
        let core: CoreError = companies_api::Error::Disconnected.into();
        assert!(matches!(core, CoreError::Disconnected));
    }
}
