//! The [`IndexStore`] trait.

use dsync_types::DatasetPair;

use crate::error::IndexResult;
use crate::index::SyncIndex;

/// Persistence for sync indexes, one per dataset pairing.
///
/// There is no locking: two concurrent writers for the same pairing race
/// and the last write wins.
pub trait IndexStore: Send + Sync {
    /// Read the index for `pair`. `Ok(None)` means no sync has completed yet.
    fn read(&self, pair: &DatasetPair) -> IndexResult<Option<SyncIndex>>;

    /// Replace the index for `pair`. Readers see either the old or the new
    /// index, never a partial one.
    fn write(&self, pair: &DatasetPair, index: &SyncIndex) -> IndexResult<()>;

    /// Read the index, treating absence as the empty baseline.
    fn read_or_default(&self, pair: &DatasetPair) -> IndexResult<SyncIndex> {
        Ok(self.read(pair)?.unwrap_or_default())
    }
}
