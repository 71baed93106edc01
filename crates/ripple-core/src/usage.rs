//! Rate-usage reporter: which quota categories have been dipped into.
//!
//! The retrieval layer exposes quota status as an arbitrarily nested
//! mapping of category name → nested mapping | leaf object. A node is a
//! leaf iff it carries a `limit` key. The reporter flattens the tree and
//! keeps only the categories that are partially consumed
//! (`remaining < limit`) — a fully-available category is noise.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// One partially-consumed quota category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEntry {
    /// Dotted path through the nesting, e.g. `resources.statuses`.
    pub category_path: String,
    pub remaining: i64,
    pub limit: i64,
    /// Epoch seconds when the quota window resets, when the source
    /// provides it.
    pub reset: Option<i64>,
}

/// Flatten a quota-status tree into the partially-consumed categories,
/// sorted lexicographically by path.
///
/// Traversal is an explicit worklist, so depth is bounded only by the
/// input. Leaves missing an integer `remaining` are skipped with a
/// warning; non-object non-leaf values are ignored.
#[must_use]
pub fn consumed_categories(status: &Value) -> Vec<UsageEntry> {
    let mut entries = Vec::new();
    let mut worklist: Vec<(String, &Value)> = vec![(String::new(), status)];

    while let Some((path, node)) = worklist.pop() {
        let Some(map) = node.as_object() else {
            continue;
        };

        if map.contains_key("limit") {
            match leaf_entry(&path, map) {
                Some(entry) => entries.push(entry),
                None => warn!(%path, "quota leaf has non-integer remaining/limit, skipping"),
            }
            continue;
        }

        for (key, child) in map {
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            worklist.push((child_path, child));
        }
    }

    entries.retain(|e| e.remaining < e.limit);
    entries.sort_by(|a, b| a.category_path.cmp(&b.category_path));
    entries
}

fn leaf_entry(path: &str, map: &serde_json::Map<String, Value>) -> Option<UsageEntry> {
    Some(UsageEntry {
        category_path: path.to_string(),
        remaining: map.get("remaining").and_then(Value::as_i64)?,
        limit: map.get("limit").and_then(Value::as_i64)?,
        reset: map.get("reset").and_then(Value::as_i64),
    })
}
