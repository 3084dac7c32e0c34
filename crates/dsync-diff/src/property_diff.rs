//! Property-snapshot diff: compare a local and a remote property map.
//!
//! Snapshots are `serde_json::Map`s. Volatile keys (attachment metadata and
//! the remote-assigned store id) are stripped before comparison.

use serde_json::{Map, Value};
use similar::TextDiff;

use dsync_types::{FILES_KEY, STORE_ID_KEY};

/// Keys ignored when comparing a local snapshot with a remote one.
pub const VOLATILE_KEYS: &[&str] = &[FILES_KEY, STORE_ID_KEY];

/// The result of comparing two property snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyDiff {
    pub changes: Vec<PropertyChange>,
}

impl PropertyDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Keys touched by any change, in change order.
    pub fn keys(&self) -> Vec<&str> {
        self.changes.iter().map(PropertyChange::key).collect()
    }
}

/// A single key-level difference. "Added" means present only remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyChange {
    Added { key: String, value: Value },
    Removed { key: String, value: Value },
    Modified { key: String, local: Value, remote: Value },
}

impl PropertyChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Removed { key, .. } | Self::Modified { key, .. } => key,
        }
    }
}

/// Copy of `map` without `keys`.
pub fn strip_volatile(map: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Diff `local` against `remote`.
pub fn diff_properties(local: &Map<String, Value>, remote: &Map<String, Value>) -> PropertyDiff {
    let mut changes = Vec::new();

    for (key, local_val) in local {
        match remote.get(key) {
            Some(remote_val) if remote_val != local_val => {
                changes.push(PropertyChange::Modified {
                    key: key.clone(),
                    local: local_val.clone(),
                    remote: remote_val.clone(),
                });
            }
            Some(_) => {}
            None => changes.push(PropertyChange::Removed {
                key: key.clone(),
                value: local_val.clone(),
            }),
        }
    }

    for (key, remote_val) in remote {
        if !local.contains_key(key) {
            changes.push(PropertyChange::Added {
                key: key.clone(),
                value: remote_val.clone(),
            });
        }
    }

    PropertyDiff { changes }
}

/// Unified text diff of the two snapshots rendered as pretty JSON.
/// Empty when they are equal.
pub fn render_unified(local: &Map<String, Value>, remote: &Map<String, Value>) -> String {
    let old = pretty(local);
    let new = pretty(remote);
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(&old, &new)
        .unified_diff()
        .context_radius(3)
        .header("local", "remote")
        .to_string()
}

fn pretty(map: &Map<String, Value>) -> String {
    let mut text = serde_json::to_string_pretty(map).unwrap_or_default();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn stripped_snapshots_compare_equal() {
        let local = snapshot(json!({"name": "n", "files": {"a": {"size": 1, "checksum": "x"}}}));
        let remote = snapshot(json!({"name": "n", "id": "s-1"}));
        let diff = diff_properties(
            &strip_volatile(&local, VOLATILE_KEYS),
            &strip_volatile(&remote, VOLATILE_KEYS),
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn every_kind_of_change() {
        let local = snapshot(json!({"keep": 1, "gone": 2, "edit": "a"}));
        let remote = snapshot(json!({"keep": 1, "edit": "b", "new": true}));
        let diff = diff_properties(&local, &remote);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.keys(), vec!["edit", "gone", "new"]);
        assert!(matches!(
            &diff.changes[0],
            PropertyChange::Modified { local, remote, .. } if *local == json!("a") && *remote == json!("b")
        ));
    }

    #[test]
    fn nested_values_compare_structurally() {
        let local = snapshot(json!({"meta": {"a": 1, "b": [1, 2]}}));
        let remote = snapshot(json!({"meta": {"b": [1, 2], "a": 1}}));
        assert!(diff_properties(&local, &remote).is_empty());
    }

    #[test]
    fn unified_render_marks_changed_lines() {
        let local = snapshot(json!({"name": "n", "age": 3}));
        let remote = snapshot(json!({"name": "m", "age": 3}));
        let text = render_unified(&local, &remote);
        assert!(text.contains("--- local"));
        assert!(text.contains("-  \"name\": \"n\""));
        assert!(text.contains("+  \"name\": \"m\""));
        assert!(render_unified(&local, &local).is_empty());
    }
}
