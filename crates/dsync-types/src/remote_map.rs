//! Paired logical/store id listings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{LogicalId, StoreId};

/// The id listing of a remote dataset: two parallel sequences.
///
/// Position `i` in `logical_ids` and position `i` in `store_ids` always
/// describe the same remote document. The fields are private so that every
/// transformation goes through methods that keep the pairing intact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIdMap")]
pub struct RemoteIdMap {
    logical_ids: Vec<LogicalId>,
    store_ids: Vec<StoreId>,
}

#[derive(Deserialize)]
struct RawIdMap {
    logical_ids: Vec<LogicalId>,
    store_ids: Vec<StoreId>,
}

impl TryFrom<RawIdMap> for RemoteIdMap {
    type Error = TypeError;

    fn try_from(raw: RawIdMap) -> Result<Self, Self::Error> {
        Self::from_parallel(raw.logical_ids, raw.store_ids)
    }
}

impl RemoteIdMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from two parallel sequences, which must have equal length.
    pub fn from_parallel(
        logical_ids: Vec<LogicalId>,
        store_ids: Vec<StoreId>,
    ) -> Result<Self, TypeError> {
        if logical_ids.len() != store_ids.len() {
            return Err(TypeError::LengthMismatch {
                logical: logical_ids.len(),
                store: store_ids.len(),
            });
        }
        Ok(Self {
            logical_ids,
            store_ids,
        })
    }

    /// Append one pair.
    pub fn push(&mut self, logical_id: LogicalId, store_id: StoreId) {
        self.logical_ids.push(logical_id);
        self.store_ids.push(store_id);
    }

    pub fn len(&self) -> usize {
        self.logical_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_ids.is_empty()
    }

    pub fn logical_ids(&self) -> &[LogicalId] {
        &self.logical_ids
    }

    pub fn store_ids(&self) -> &[StoreId] {
        &self.store_ids
    }

    /// Iterate over `(logical, store)` pairs in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (&LogicalId, &StoreId)> {
        self.logical_ids.iter().zip(self.store_ids.iter())
    }

    /// The set of logical ids present.
    pub fn logical_set(&self) -> BTreeSet<LogicalId> {
        self.logical_ids.iter().cloned().collect()
    }

    /// Returns `true` if any pair carries `logical_id`.
    pub fn contains(&self, logical_id: &LogicalId) -> bool {
        self.logical_ids.contains(logical_id)
    }

    /// Store id of the first pair carrying `logical_id`.
    pub fn store_id_of(&self, logical_id: &LogicalId) -> Option<&StoreId> {
        self.iter()
            .find(|(l, _)| *l == logical_id)
            .map(|(_, s)| s)
    }

    /// Keep the pairs for which `keep` returns `true`, preserving order and pairing.
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&LogicalId, &StoreId) -> bool,
    {
        let mut out = Self::new();
        for (l, s) in self.iter() {
            if keep(l, s) {
                out.push(l.clone(), s.clone());
            }
        }
        out
    }

    /// Keep only the first pair for each logical id.
    pub fn dedup_logical(&self) -> Self {
        let mut seen = BTreeSet::new();
        self.filter(|l, _| seen.insert(l.clone()))
    }

    /// Split into consecutive maps of at most `size` pairs. `None` (or zero)
    /// yields a single chunk.
    pub fn chunks(&self, size: Option<usize>) -> Vec<Self> {
        let size = match size {
            Some(n) if n > 0 => n,
            _ => self.len().max(1),
        };
        self.logical_ids
            .chunks(size)
            .zip(self.store_ids.chunks(size))
            .map(|(l, s)| Self {
                logical_ids: l.to_vec(),
                store_ids: s.to_vec(),
            })
            .collect()
    }
}

impl FromIterator<(LogicalId, StoreId)> for RemoteIdMap {
    fn from_iter<I: IntoIterator<Item = (LogicalId, StoreId)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (l, s) in iter {
            map.push(l, s);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> RemoteIdMap {
        pairs
            .iter()
            .map(|(l, s)| (LogicalId::from(*l), StoreId::from(*s)))
            .collect()
    }

    #[test]
    fn from_parallel_checks_length() {
        let err = RemoteIdMap::from_parallel(vec!["a".into()], vec![]).unwrap_err();
        assert_eq!(err, TypeError::LengthMismatch { logical: 1, store: 0 });
    }

    #[test]
    fn filter_preserves_pairing() {
        let m = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let kept = m.filter(|l, _| l.as_str() != "b");
        let pairs: Vec<_> = kept.iter().map(|(l, s)| (l.as_str(), s.as_str())).collect();
        assert_eq!(pairs, vec![("a", "1"), ("c", "3")]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let m = map(&[("a", "2"), ("b", "5"), ("a", "1")]);
        let d = m.dedup_logical();
        assert_eq!(d.len(), 2);
        assert_eq!(d.store_id_of(&"a".into()).unwrap().as_str(), "2");
    }

    #[test]
    fn chunks_split_pairs_together() {
        let m = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let chunks = m.chunks(Some(2));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].logical_ids()[0].as_str(), "c");
        assert_eq!(chunks[1].store_ids()[0].as_str(), "3");

        assert_eq!(m.chunks(None).len(), 1);
        assert_eq!(m.chunks(Some(0)).len(), 1);
    }

    #[test]
    fn deserialize_rejects_unpaired() {
        let json = r#"{"logical_ids":["a","b"],"store_ids":["1"]}"#;
        assert!(serde_json::from_str::<RemoteIdMap>(json).is_err());
    }
}
