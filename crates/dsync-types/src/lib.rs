//! Foundation types for dsync.
//!
//! This crate provides the identity and structural types shared by every
//! other dsync crate: the ids that documents are reconciled by, the document
//! model itself, and the reports produced by transfers.
//!
//! # Key Types
//!
//! - [`LogicalId`]: Stable, store-independent document identifier (the unit of reconciliation)
//! - [`StoreId`]: Remote-assigned identifier used for remote-specific operations
//! - [`DatasetId`] / [`RemoteDatasetId`] / [`DatasetPair`]: Dataset identities
//! - [`Document`]: Tagged document structure with an open property map
//! - [`RemoteIdMap`]: Paired logical/store id sequences listed from a remote dataset
//! - [`RemoteRecord`]: Raw record as returned by a remote store
//! - [`Linkage`]: Whether a local dataset has a remote counterpart
//! - [`TransferReport`]: Per-chunk outcome of a batched transfer

pub mod document;
pub mod error;
pub mod id;
pub mod linkage;
pub mod record;
pub mod remote_map;
pub mod report;

pub use document::{Document, FileAttachment, CLASS_KEY, FILES_KEY, LOGICAL_ID_KEY};
pub use error::TypeError;
pub use id::{DatasetId, DatasetPair, LogicalId, RemoteDatasetId, StoreId};
pub use linkage::{Linkage, RemoteLinkage};
pub use record::{RemoteRecord, STORE_ID_KEY};
pub use remote_map::RemoteIdMap;
pub use report::{ChunkStatus, TransferReport, UploadType};
