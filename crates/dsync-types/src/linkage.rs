use serde::{Deserialize, Serialize};

use crate::id::{DatasetId, RemoteDatasetId};

/// A record, held by the local store, naming the remote counterpart of a
/// local dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLinkage {
    pub local: DatasetId,
    pub remote: RemoteDatasetId,
}

/// Outcome of looking up a dataset's remote counterpart.
///
/// "Not linked yet" is an ordinary state, distinct from both an error and
/// any valid remote id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Linkage {
    Found(RemoteDatasetId),
    NotFound,
}

impl Linkage {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The remote id, if found.
    pub fn remote(&self) -> Option<&RemoteDatasetId> {
        match self {
            Self::Found(id) => Some(id),
            Self::NotFound => None,
        }
    }
}
