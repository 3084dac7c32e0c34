//! Sync index for dsync.
//!
//! A [`SyncIndex`] records the local and remote logical-id sets observed at
//! the end of the last successful sync of one dataset pairing. Incremental
//! policies compute their deltas against it.
//!
//! # Modules
//!
//! - [`index`]: The [`SyncIndex`] model
//! - [`traits`]: The [`IndexStore`] persistence interface
//! - [`file`]: [`FileIndexStore`], a JSON file under the local dataset root,
//!   replaced atomically on every write
//! - [`memory`]: [`InMemoryIndexStore`] for tests and embedding
//! - [`error`]: [`IndexError`] and the [`IndexResult`] alias

pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod traits;

pub use error::{IndexError, IndexResult};
pub use file::FileIndexStore;
pub use index::SyncIndex;
pub use memory::InMemoryIndexStore;
pub use traits::IndexStore;
