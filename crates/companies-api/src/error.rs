use thiserror::Error;

/// Top-level error type for the `companies-api` crate.
///
/// Covers every failure mode of the database surface: transport, HTTP
/// status, the event-stream protocol, and payload decoding.
/// `companies-core` folds these into a single subscription error.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    ///
    /// The wrapped error never carries the request's query string, which
    /// holds the read token.
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connecting took longer than the configured connect timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// Read rejected by the database security rules.
    ///
    /// Raised for HTTP 401/403 and for a `cancel` event on an open stream.
    #[error("{message}")]
    PermissionDenied { message: String },

    /// The credential attached to the stream expired or was revoked.
    #[error("Auth token is no longer valid")]
    AuthRevoked,

    /// Any other non-success HTTP status. `message` carries the server's
    /// `{"error": "..."}` text when present.
    #[error("Database error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Stream ──────────────────────────────────────────────────────
    /// The server closed the event stream.
    #[error("Disconnected")]
    Disconnected,

    /// An event arrived that the stream protocol does not allow.
    #[error("Stream protocol error: {0}")]
    Protocol(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the database refused the read.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::AuthRevoked)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let redacted = err.url().cloned().map(|mut url| {
            url.set_query(None);
            url
        });
        let err = err.without_url();
        Self::Transport(match redacted {
            Some(url) => err.with_url(url),
            None => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_displays_server_message_verbatim() {
        let err = Error::PermissionDenied {
            message: "Permission denied".into(),
        };
        assert_eq!(err.to_string(), "Permission denied");
        assert!(err.is_permission_denied());
        assert!(Error::AuthRevoked.is_permission_denied());
        assert!(!Error::Disconnected.is_permission_denied());
    }

    #[test]
    fn http_error_display() {
        let err = Error::Http {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "Database error (HTTP 404): Not found");
    }
}
