// ── Snapshot child decoding ──
//
// Turns the raw `(key, value)` children of one snapshot into companies.
// Each child decodes on its own; a child that fails is dropped and never
// reaches the view state. Rejections are reported to a `DecodeObserver`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::debug;

use crate::model::Company;

/// Receives every child that could not be decoded.
pub trait DecodeObserver: Send + Sync {
    fn rejected(&self, key: &str, reason: &str);
}

/// Default observer: one `debug!` line per rejected child.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DecodeObserver for LogObserver {
    fn rejected(&self, key: &str, reason: &str) {
        debug!(key, reason, "dropping undecodable child");
    }
}

/// Counting observer, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct DecodeStats {
    rejected: AtomicU64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children rejected since creation.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl DecodeObserver for DecodeStats {
    fn rejected(&self, key: &str, reason: &str) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        debug!(key, reason, "dropping undecodable child");
    }
}

/// Decode every child, in the given order, skipping failures.
///
/// The result keeps input order; sorting is the projector's job.
pub fn decode_children(children: Vec<(String, Value)>, observer: &dyn DecodeObserver) -> Vec<Company> {
    children
        .into_iter()
        .filter_map(|(key, value)| match decode_child(value) {
            Ok(company) => Some(company),
            Err(reason) => {
                observer.rejected(&key, &reason);
                None
            }
        })
        .collect()
}

/// Decode one child value.
pub fn decode_child(value: Value) -> Result<Company, String> {
    match value {
        Value::Object(ref map) if looks_like_array(map) => {
            Err("expected an object, found an array".into())
        }
        Value::Object(_) => serde_json::from_value(value).map_err(|e| e.to_string()),
        other => Err(format!("expected an object, found {}", kind(&other))),
    }
}

/// The database stores arrays as objects keyed `"0"`, `"1"`, ... and reads
/// them back as arrays when most index slots are filled.
fn looks_like_array(map: &serde_json::Map<String, Value>) -> bool {
    if map.is_empty() {
        return false;
    }
    let mut max = 0usize;
    for key in map.keys() {
        let Ok(index) = key.parse::<usize>() else {
            return false;
        };
        if index.to_string() != *key {
            return false;
        }
        max = max.max(index);
    }
    max < map.len() * 2
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
