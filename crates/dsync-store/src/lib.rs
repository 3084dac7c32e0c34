//! Document store collaborators for dsync.
//!
//! The sync engine never owns document content. It talks to two stores
//! through the traits in this crate:
//!
//! - [`LocalStore`]: the local dataset: list, add, and remove documents,
//!   read/write attachment bytes, and hold remote linkage records
//! - [`RemoteStore`]: the remote (cloud-hosted) dataset: list id pairs,
//!   fetch, delete, and accept single documents or chunk archives
//!
//! # Backends
//!
//! - [`InMemoryLocalStore`] / [`InMemoryRemoteStore`]: `RwLock`-guarded
//!   maps for tests and embedding; the remote supports failure injection and
//!   call accounting
//! - [`DirLocalStore`] / [`DirRemoteStore`]: one JSON file per document on
//!   disk; the remote side simulates a hosted service in a directory tree
//!
//! Remote listings can be memoized with an explicit [`RemoteListingCache`]
//! owned by the caller. There is no process-wide cache.

pub mod cache;
pub mod dir;
pub mod error;
pub mod memory;
pub mod traits;

pub use cache::RemoteListingCache;
pub use dir::{DirLocalStore, DirRemoteStore};
pub use error::{StoreError, StoreResult};
pub use memory::{CallStats, InMemoryLocalStore, InMemoryRemoteStore};
pub use traits::{LocalStore, RemoteStore};
