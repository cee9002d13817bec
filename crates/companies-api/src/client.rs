// Realtime database HTTP client
//
// Wraps `reqwest::Client` with node URL construction (`{base}/{path}.json`),
// credential query parameters, error-body decoding, and the streaming read
// protocol (`Accept: text/event-stream`).

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::sse::{SseDecoder, SseFrame};
use crate::transport::TransportConfig;

/// Error body shape: `{"error": "Permission denied"}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `put` / `patch` payload: the node path relative to the listened
/// location and the new data.
#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

/// One decoded event from a streaming read.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the node at `path` with `data`.
    Put { path: String, data: Value },
    /// Replace each child of `path` named in `data`.
    Patch { path: String, data: Value },
    /// Heartbeat, carries nothing.
    KeepAlive,
    /// Security rules no longer allow the read. Ends the stream.
    Cancel { reason: Option<String> },
    /// The credential expired or was revoked. Ends the stream.
    AuthRevoked,
}

/// HTTP client for one realtime database instance.
///
/// Cheaply cloneable: the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct DatabaseClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<SecretString>,
    /// Reported in [`Error::Timeout`] when connecting takes too long.
    connect_timeout: Option<Duration>,
}

impl std::fmt::Debug for DatabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth.as_ref().map(|_| "****"))
            .finish_non_exhaustive()
    }
}

impl DatabaseClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the database root, e.g.
    /// `https://my-app-default-rtdb.firebaseio.com`. Existing query pairs
    /// (such as the emulator's `ns=`) are kept on every request.
    pub fn new(
        base_url: Url,
        auth: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, base_url, auth);
        client.connect_timeout = Some(transport.connect_timeout);
        Ok(client)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, auth: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            auth,
            connect_timeout: None,
        }
    }

    /// The database root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build the REST URL for a node: `{base}/{path}.json[?auth=...]`.
    pub(crate) fn node_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_owned();
        let node = path.trim_matches('/');
        url.set_path(&format!("{base_path}/{node}.json"));
        if let Some(ref auth) = self.auth {
            url.query_pairs_mut()
                .append_pair("auth", auth.expose_secret());
        }
        url
    }

    /// Wrap a send failure. Connect timeouts report the configured bound.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.connect_timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            _ => Error::from(err),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// One-shot read of a node. An absent node reads as `null`.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        debug!(path, "GET node");

        let resp = self
            .http
            .get(self.node_url(path))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = check_status(resp).await?;

        let body = resp.text().await.map_err(Error::from)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    /// Open a streaming read and return the response once headers arrive.
    pub(crate) async fn open_stream(&self, path: &str) -> Result<reqwest::Response, Error> {
        debug!(path, "opening event stream");

        let resp = self
            .http
            .get(self.node_url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        check_status(resp).await
    }

    /// Stream decoded events for a node.
    ///
    /// The stream ends after a `cancel` / `auth_revoked` event, after the
    /// first error, or when the server closes the body. Dropping it closes
    /// the connection.
    pub fn events(
        &self,
        path: &str,
    ) -> impl Stream<Item = Result<StreamEvent, Error>> + Send + 'static {
        let client = self.clone();
        let path = path.to_owned();

        async_stream::try_stream! {
            let resp = client.open_stream(&path).await?;
            let mut body = resp.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(Error::from)?;
                for frame in decoder.feed(&chunk) {
                    let Some(event) = decode_frame(&frame)? else {
                        continue;
                    };
                    let terminal =
                        matches!(event, StreamEvent::Cancel { .. } | StreamEvent::AuthRevoked);
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }
            trace!(path = %path, "event stream body ended");
        }
    }
}

/// Map a frame onto a [`StreamEvent`]. Unknown event names are skipped.
pub(crate) fn decode_frame(frame: &SseFrame) -> Result<Option<StreamEvent>, Error> {
    let payload = || -> Result<StreamPayload, Error> {
        serde_json::from_str(&frame.data).map_err(|e| {
            Error::Protocol(format!("malformed '{}' payload: {e}", frame.event))
        })
    };

    let event = match frame.event.as_str() {
        "put" => {
            let p = payload()?;
            StreamEvent::Put {
                path: p.path,
                data: p.data,
            }
        }
        "patch" => {
            let p = payload()?;
            StreamEvent::Patch {
                path: p.path,
                data: p.data,
            }
        }
        "keep-alive" => StreamEvent::KeepAlive,
        "cancel" => StreamEvent::Cancel {
            reason: serde_json::from_str::<Option<String>>(&frame.data)
                .ok()
                .flatten(),
        },
        "auth_revoked" => StreamEvent::AuthRevoked,
        other => {
            trace!(event = other, "ignoring unknown stream event");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

/// Turn a non-2xx response into an error, decoding `{"error": "..."}`.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::PermissionDenied {
            message: if message.is_empty() {
                "Permission denied".into()
            } else {
                message
            },
        });
    }

    Err(Error::Http {
        status: status.as_u16(),
        message,
    })
}
