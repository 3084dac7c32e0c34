//! Dataset synchronization engine for dsync.
//!
//! Reconciles a local document collection with a remote one under one of
//! five [`SyncPolicy`] values. Each policy is a [`SyncPipeline`] of stages
//! run strictly in order: list both sides, diff, transfer, re-list where a
//! later diff depends on an earlier mutation, and finally persist the sync
//! index. A failed run never writes the index; a dry run performs every read
//! and diff but replaces each mutation with a `"would ..."` trace line.
//!
//! # Quick Start
//!
//! ```rust
//! use dsync_engine::{SyncEngine, SyncOptions, SyncPolicy};
//! use dsync_index::InMemoryIndexStore;
//! use dsync_store::{InMemoryLocalStore, InMemoryRemoteStore};
//! use dsync_types::{Document, RemoteDatasetId};
//!
//! let remote_ds = RemoteDatasetId::from("cloud");
//! let local = InMemoryLocalStore::with_documents("lab", vec![Document::new("sample-1")]);
//! let remote = InMemoryRemoteStore::new();
//! remote.create_dataset(&remote_ds);
//! let index = InMemoryIndexStore::new();
//!
//! let engine = SyncEngine::new(&local, &remote, &index, SyncOptions::default())
//!     .with_remote_dataset(remote_ds.clone());
//! let outcome = engine.run(SyncPolicy::MirrorToRemote).unwrap();
//! assert_eq!(outcome.uploaded.len(), 1);
//! assert_eq!(remote.ids(&remote_ds).len(), 1);
//! ```
//!
//! # Modules
//!
//! - [`config`]: [`SyncOptions`], built with builders or from a key/value map
//! - [`transfer`]: [`BatchTransfer`], chunked upload/download/delete with
//!   per-chunk reporting
//! - [`stage`] / [`stages`] / [`pipeline`]: the staged run model
//! - [`policy`]: the five policies as pipelines
//! - [`validator`]: read-only content comparison
//! - [`duplicates`]: remote duplicate detection
//! - [`engine`]: [`SyncEngine`], the entry point tying it all together

pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod linkage;
pub mod outcome;
pub mod pipeline;
pub mod policy;
pub mod stage;
pub mod stages;
pub mod state;
pub mod status;
pub mod trace;
pub mod transfer;
pub mod validator;

// Re-exports for convenience.
pub use config::{FileUploadStrategy, SyncOptions, ValidationMode};
pub use duplicates::{find_duplicates, DuplicateGroup, DuplicateScan};
pub use engine::{DedupeOutcome, SyncEngine};
pub use error::{LinkageError, SyncError, SyncResult, TransferPhase};
pub use linkage::{link_dataset, resolve_linkage};
pub use outcome::SyncOutcome;
pub use pipeline::SyncPipeline;
pub use policy::SyncPolicy;
pub use stage::{Side, Snapshot, StageContext, StageRecord, SyncStage};
pub use stages::{
    DeleteStage, DeltaSource, DownloadStage, IndexUpdate, ListStage, ReListStage, UploadStage,
    WriteIndexStage,
};
pub use state::RunState;
pub use status::SyncStatus;
pub use trace::{SyncTrace, TraceKind, TraceLine};
pub use transfer::{BatchTransfer, DownloadedDocument};
pub use validator::{Mismatch, MismatchReason, SnapshotPair, ValidationReport, Validator};
