//! Resolving which remote dataset a local dataset syncs with.

use std::collections::BTreeSet;

use tracing::debug;

use dsync_store::LocalStore;
use dsync_types::{Linkage, RemoteDatasetId, RemoteLinkage};

use crate::error::{LinkageError, SyncResult};

/// Look up the remote counterpart of the local dataset.
///
/// Records for other datasets are ignored and repeated records naming the
/// same remote count once. Two or more distinct remotes are an error.
pub fn resolve_linkage(local: &dyn LocalStore) -> SyncResult<Linkage> {
    let dataset = local.dataset_id();
    let remotes: BTreeSet<RemoteDatasetId> = local
        .linkage_records()?
        .into_iter()
        .filter(|r| &r.local == dataset)
        .map(|r| r.remote)
        .collect();

    match remotes.len() {
        0 => {
            debug!(dataset = %dataset, "no linkage record");
            Ok(Linkage::NotFound)
        }
        1 => Ok(remotes.into_iter().next().map_or(Linkage::NotFound, Linkage::Found)),
        count => Err(LinkageError::Ambiguous {
            dataset: dataset.clone(),
            count,
        }
        .into()),
    }
}

/// Record a link from the local dataset to `remote`.
///
/// Linking again to the same remote is a no-op; linking to a different one
/// fails with [`LinkageError::AlreadyLinked`].
pub fn link_dataset(local: &dyn LocalStore, remote: &RemoteDatasetId) -> SyncResult<()> {
    match resolve_linkage(local)? {
        Linkage::Found(existing) if &existing == remote => Ok(()),
        Linkage::Found(existing) => Err(LinkageError::AlreadyLinked {
            dataset: local.dataset_id().clone(),
            remote: existing,
        }
        .into()),
        Linkage::NotFound => {
            local.add_linkage(&RemoteLinkage {
                local: local.dataset_id().clone(),
                remote: remote.clone(),
            })?;
            debug!(dataset = %local.dataset_id(), remote = %remote, "linked");
            Ok(())
        }
    }
}
