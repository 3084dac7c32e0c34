//! Identifier newtypes.
//!
//! Logical ids are shared by both sides of a sync. Store ids are assigned by
//! the remote collaborator and are never compared across stores.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id, rejecting empty or whitespace-only strings.
            pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
                let s = s.into();
                if s.trim().is_empty() {
                    return Err(TypeError::InvalidId(format!(
                        "{} must not be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self(s))
            }

            /// The id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Stable, store-independent document identifier.
    ///
    /// Recognized by both the local and the remote store; every reconciliation
    /// decision is made on sets of logical ids.
    LogicalId
);

string_id!(
    /// Remote-assigned document identifier.
    ///
    /// Needed only for remote-specific operations (fetch-by-id, delete). Not
    /// stable across re-upload, so it is never used to decide what to sync.
    StoreId
);

string_id!(
    /// Identifier of a local dataset.
    DatasetId
);

string_id!(
    /// Identifier of a remote (cloud-hosted) dataset.
    RemoteDatasetId
);

/// A (local dataset, remote dataset) pairing. Sync state is scoped to one pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetPair {
    pub local: DatasetId,
    pub remote: RemoteDatasetId,
}

impl DatasetPair {
    pub fn new(local: DatasetId, remote: RemoteDatasetId) -> Self {
        Self { local, remote }
    }
}

impl fmt::Display for DatasetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.local, self.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank() {
        assert!(LogicalId::parse("").is_err());
        assert!(StoreId::parse("   ").is_err());
        assert_eq!(LogicalId::parse("doc-1").unwrap().as_str(), "doc-1");
    }

    #[test]
    fn display_is_raw_string() {
        let id = LogicalId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(format!("{id:?}"), "LogicalId(abc)");
    }

    #[test]
    fn serde_is_transparent() {
        let id = StoreId::from("65f0c1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65f0c1\"");
        let back: StoreId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = StoreId::from("a10");
        let b = StoreId::from("a9");
        assert!(a < b);
    }

    #[test]
    fn pair_display() {
        let pair = DatasetPair::new("local".into(), "remote".into());
        assert_eq!(pair.to_string(), "local <-> remote");
    }
}
