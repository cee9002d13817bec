// ── Local mirror of a streamed collection ──
//
// The event stream sends one full `put` and then incremental `put` /
// `patch` updates at sub-paths. `CollectionMirror` applies them to a JSON
// tree so every update can be re-published as a whole-collection snapshot.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// In-memory copy of the collection node being listened to.
///
/// Arrays are stored as objects keyed by index (the database has no array
/// type of its own) and `null` leaves are never stored: writing `null`
/// deletes the node and prunes parents left empty.
#[derive(Debug, Clone, Default)]
pub struct CollectionMirror {
    root: Value,
}

impl CollectionMirror {
    pub fn new() -> Self {
        Self { root: Value::Null }
    }

    /// Replace the node at `path` with `data`.
    pub fn put(&mut self, path: &str, data: Value) {
        let segments = split_path(path);
        let data = normalize(data);
        set_at(&mut self.root, &segments, data);
    }

    /// Replace each direct child `path/key` with the matching value in `data`.
    ///
    /// A non-object payload is treated as a `put`.
    pub fn patch(&mut self, path: &str, data: Value) {
        let Value::Object(children) = data else {
            self.put(path, data);
            return;
        };
        let base = split_path(path);
        for (key, value) in children {
            let mut segments = base.clone();
            segments.push(key);
            set_at(&mut self.root, &segments, normalize(value));
        }
    }

    /// Current value of the whole collection node.
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Direct children in the database's key order.
    ///
    /// A primitive or absent root has no children.
    pub fn children(&self) -> Vec<(String, Value)> {
        let Value::Object(map) = &self.root else {
            return Vec::new();
        };
        let mut children: Vec<(String, Value)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        children.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        children
    }
}

/// Order child keys the way the database enumerates them: keys that are
/// canonical 32-bit integers first, numerically, then everything else
/// lexicographically.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (int_key(a), int_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Children of an arbitrary node value, normalized and ordered.
pub fn children_of(value: Value) -> Vec<(String, Value)> {
    let mut mirror = CollectionMirror::new();
    mirror.put("/", value);
    mirror.children()
}

fn int_key(key: &str) -> Option<i32> {
    let n: i32 = key.parse().ok()?;
    (n.to_string() == key).then_some(n)
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Convert arrays to index-keyed objects and drop `null` entries, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let map: Map<String, Value> = items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() { Value::Null } else { Value::Object(map) }
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() { Value::Null } else { Value::Object(map) }
        }
        other => other,
    }
}

/// Write `data` at `segments` below `node`, creating or pruning parents.
fn set_at(node: &mut Value, segments: &[String], data: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = data;
        return;
    };

    if data.is_null() && !node.is_object() {
        return;
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.clone()).or_insert(Value::Null);
    set_at(child, rest, data);
    if child.is_null() {
        map.remove(head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}
