// companies-api: Async Rust client for the realtime database REST + streaming API

pub mod client;
pub mod error;
pub mod listener;
pub mod sse;
pub mod transport;
pub mod tree;

pub use client::{DatabaseClient, StreamEvent};
pub use error::Error;
pub use listener::{CollectionSnapshot, ListenerEvent, ListenerHandle};
pub use transport::{TlsMode, TransportConfig};
