//! Detection of remote records that share one logical id.

use std::collections::BTreeMap;

use dsync_types::{LogicalId, RemoteIdMap, StoreId};

/// All remote records for one logical id. The smallest store id is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub logical_id: LogicalId,
    pub original: StoreId,
    pub duplicates: Vec<StoreId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateScan {
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateScan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records that would be removed.
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates.len()).sum()
    }

    /// The records to remove, paired with their logical ids.
    pub fn duplicates(&self) -> RemoteIdMap {
        self.groups
            .iter()
            .flat_map(|g| g.duplicates.iter().map(|s| (g.logical_id.clone(), s.clone())))
            .collect()
    }

    /// The retained record of each group.
    pub fn originals(&self) -> RemoteIdMap {
        self.groups
            .iter()
            .map(|g| (g.logical_id.clone(), g.original.clone()))
            .collect()
    }
}

/// Group `listing` by logical id and report every group of two or more.
pub fn find_duplicates(listing: &RemoteIdMap) -> DuplicateScan {
    let mut by_id: BTreeMap<&LogicalId, Vec<&StoreId>> = BTreeMap::new();
    for (logical_id, store_id) in listing.iter() {
        by_id.entry(logical_id).or_default().push(store_id);
    }

    let groups = by_id
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(logical_id, mut ids)| {
            ids.sort();
            let original = ids.remove(0).clone();
            DuplicateGroup {
                logical_id: logical_id.clone(),
                original,
                duplicates: ids.into_iter().cloned().collect(),
            }
        })
        .collect();
    DuplicateScan { groups }
}
