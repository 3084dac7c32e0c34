//! Batch transfer orchestrator.
//!
//! Turns id and document lists into chunked store calls. Chunks within a
//! phase are sent one after another; the first failing chunk stops the
//! phase, is reported as `failure`, and every later chunk is reported as
//! `not_attempted`. Chunks that succeeded before the failure stay applied.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use dsync_pack::ArchiveWriter;
use dsync_store::{LocalStore, RemoteListingCache, RemoteStore, StoreError};
use dsync_types::{
    ChunkStatus, Document, FileAttachment, LogicalId, RemoteDatasetId, RemoteIdMap,
    TransferReport, UploadType,
};

use crate::config::{FileUploadStrategy, SyncOptions};
use crate::error::{SyncError, SyncResult, TransferPhase};
use crate::trace::SyncTrace;

/// A document fetched from the remote, with its attachment bytes when
/// files are being synced.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadedDocument {
    pub document: Document,
    pub files: Vec<(String, Vec<u8>)>,
}

pub struct BatchTransfer<'a> {
    local: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    dataset: &'a RemoteDatasetId,
    cache: &'a RemoteListingCache,
    options: &'a SyncOptions,
    archive_dir: Option<PathBuf>,
}

impl<'a> BatchTransfer<'a> {
    pub fn new(
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        dataset: &'a RemoteDatasetId,
        cache: &'a RemoteListingCache,
        options: &'a SyncOptions,
    ) -> Self {
        Self {
            local,
            remote,
            dataset,
            cache,
            options,
            archive_dir: None,
        }
    }

    /// Build chunk archives in `dir` instead of the system temp directory.
    pub fn with_archive_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.archive_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn dataset(&self) -> &RemoteDatasetId {
        self.dataset
    }

    /// Upload `documents` in order, batched or one at a time according to
    /// the upload strategy.
    pub fn upload(
        &self,
        documents: &[Document],
        trace: &mut SyncTrace,
    ) -> SyncResult<TransferReport> {
        if documents.is_empty() {
            return Ok(TransferReport::new(UploadType::None));
        }
        let strategy = self.options.file_upload_strategy;
        let size = match strategy {
            FileUploadStrategy::Serial => 1,
            FileUploadStrategy::Batch => chunk_len(self.options.max_chunk_size, documents.len()),
        };
        let chunks: Vec<&[Document]> = documents.chunks(size).collect();

        let result = self.drive(
            TransferPhase::Upload,
            strategy.upload_type(),
            &chunks,
            |chunk| chunk.iter().map(|d| d.logical_id.clone()).collect(),
            |chunk| {
                let ids: Vec<LogicalId> = chunk.iter().map(|d| d.logical_id.clone()).collect();
                let files: usize = chunk.iter().map(|d| d.files.len()).sum();
                let mut line = format!("upload {} to {}", label(&ids), self.dataset);
                if self.options.sync_files && files > 0 {
                    line.push_str(&format!(" with {files} attachment(s)"));
                }
                line
            },
            |chunk| self.send_upload(strategy, chunk),
            trace,
        );
        self.after_remote_mutation();
        result
    }

    /// Fetch the documents named by `pairs`, handing each chunk's documents
    /// to `apply` before the next chunk is fetched. A chunk counts as
    /// transferred only once `apply` has accepted all of its documents.
    pub fn download(
        &self,
        pairs: &RemoteIdMap,
        trace: &mut SyncTrace,
        mut apply: impl FnMut(DownloadedDocument) -> SyncResult<()>,
    ) -> SyncResult<TransferReport> {
        if pairs.is_empty() {
            return Ok(TransferReport::new(UploadType::None));
        }
        let strategy = self.options.file_upload_strategy;
        let chunks = match strategy {
            FileUploadStrategy::Serial => pairs.chunks(Some(1)),
            FileUploadStrategy::Batch => pairs.chunks(self.options.max_chunk_size),
        };

        self.drive(
            TransferPhase::Download,
            strategy.upload_type(),
            &chunks,
            |chunk| chunk.logical_ids().to_vec(),
            |chunk| format!("download {} from {}", label(chunk.logical_ids()), self.dataset),
            |chunk| {
                for item in self.fetch(strategy, chunk)? {
                    apply(item)?;
                }
                Ok(())
            },
            trace,
        )
    }

    /// Delete remote records, `max_delete_batch` store ids per call.
    pub fn delete_remote(
        &self,
        pairs: &RemoteIdMap,
        trace: &mut SyncTrace,
    ) -> SyncResult<TransferReport> {
        if pairs.is_empty() {
            return Ok(TransferReport::new(UploadType::None));
        }
        let chunks = pairs.chunks(self.options.max_delete_batch);
        let result = self.drive(
            TransferPhase::DeleteRemote,
            UploadType::None,
            &chunks,
            |chunk| chunk.logical_ids().to_vec(),
            |chunk| {
                format!(
                    "delete remote {} from {}",
                    label(chunk.logical_ids()),
                    self.dataset
                )
            },
            |chunk| {
                self.remote.delete_documents(self.dataset, chunk.store_ids())?;
                Ok(())
            },
            trace,
        );
        self.after_remote_mutation();
        result
    }

    /// Remove local documents, `max_delete_batch` ids per chunk.
    pub fn delete_local(
        &self,
        ids: &[LogicalId],
        trace: &mut SyncTrace,
    ) -> SyncResult<TransferReport> {
        if ids.is_empty() {
            return Ok(TransferReport::new(UploadType::None));
        }
        let chunks: Vec<&[LogicalId]> = ids
            .chunks(chunk_len(self.options.max_delete_batch, ids.len()))
            .collect();
        self.drive(
            TransferPhase::DeleteLocal,
            UploadType::None,
            &chunks,
            |chunk| chunk.to_vec(),
            |chunk| format!("delete local {}", label(chunk)),
            |chunk| {
                for id in chunk.iter() {
                    self.local.remove(id)?;
                }
                Ok(())
            },
            trace,
        )
    }

    /// Run `send` over `chunks` in order, recording each outcome.
    fn drive<C>(
        &self,
        phase: TransferPhase,
        upload_type: UploadType,
        chunks: &[C],
        ids_of: impl Fn(&C) -> Vec<LogicalId>,
        describe: impl Fn(&C) -> String,
        mut send: impl FnMut(&C) -> SyncResult<()>,
        trace: &mut SyncTrace,
    ) -> SyncResult<TransferReport> {
        let mut report = TransferReport::new(upload_type);
        for (i, chunk) in chunks.iter().enumerate() {
            let ids = ids_of(chunk);
            if self.options.dry_run {
                trace.would(describe(chunk));
                report.record(ids, ChunkStatus::DryRun);
                continue;
            }

            match send(chunk) {
                Ok(()) => {
                    debug!(phase = %phase, chunk = i, count = ids.len(), "chunk transferred");
                    trace.progress(format!(
                        "{phase}: chunk {}/{} done ({})",
                        i + 1,
                        chunks.len(),
                        label(&ids)
                    ));
                    report.record(ids, ChunkStatus::Success);
                }
                Err(err) => {
                    let reason = err.to_string();
                    warn!(phase = %phase, chunk = i, count = ids.len(), error = %reason, "chunk failed");
                    report.record(ids.clone(), ChunkStatus::Failure);
                    for rest in &chunks[i + 1..] {
                        report.record(ids_of(rest), ChunkStatus::NotAttempted);
                    }
                    return Err(SyncError::Transfer {
                        phase,
                        chunk: i,
                        ids,
                        reason,
                        report,
                    });
                }
            }
        }
        Ok(report)
    }

    fn send_upload(&self, strategy: FileUploadStrategy, chunk: &[Document]) -> SyncResult<()> {
        match strategy {
            FileUploadStrategy::Serial => {
                for doc in chunk {
                    self.remote.upload_document(self.dataset, doc)?;
                }
            }
            FileUploadStrategy::Batch => {
                let mut writer = match &self.archive_dir {
                    Some(dir) => ArchiveWriter::in_dir(dir),
                    None => ArchiveWriter::new(),
                };
                writer.extend(chunk);
                // The archive file is removed when `archive` drops, including
                // when the upload below returns early.
                let archive = writer.finish()?;
                let stored = self.remote.upload_archive(self.dataset, archive.path())?;
                if stored.len() != chunk.len() {
                    return Err(StoreError::Rejected(format!(
                        "remote stored {} of {} documents",
                        stored.len(),
                        chunk.len()
                    ))
                    .into());
                }
                // The remote already holds the chunk at this point.
                if let Err(err) = archive.close() {
                    warn!(error = %err, "failed to remove chunk archive");
                }
            }
        }
        if self.options.sync_files {
            for doc in chunk {
                self.push_files(doc)?;
            }
        }
        Ok(())
    }

    fn push_files(&self, doc: &Document) -> SyncResult<()> {
        for (name, meta) in &doc.files {
            let bytes = self.local.read_file(&doc.logical_id, name)?;
            if FileAttachment::describe(&bytes) != *meta {
                warn!(document = %doc.logical_id, file = %name, "attachment does not match its metadata");
            }
            self.remote
                .put_file(self.dataset, &doc.logical_id, name, &bytes)?;
        }
        Ok(())
    }

    fn fetch(
        &self,
        strategy: FileUploadStrategy,
        chunk: &RemoteIdMap,
    ) -> SyncResult<Vec<DownloadedDocument>> {
        let records = match strategy {
            FileUploadStrategy::Batch => {
                let records = self
                    .remote
                    .download_document_collection(self.dataset, chunk.store_ids())?;
                if records.len() != chunk.len() {
                    return Err(StoreError::Rejected(format!(
                        "remote returned {} of {} requested documents",
                        records.len(),
                        chunk.len()
                    ))
                    .into());
                }
                records
            }
            FileUploadStrategy::Serial => {
                let mut records = Vec::with_capacity(chunk.len());
                for store_id in chunk.store_ids() {
                    let record = self
                        .remote
                        .get_document(self.dataset, store_id)?
                        .ok_or_else(|| StoreError::RecordNotFound(store_id.clone()))?;
                    records.push(record);
                }
                records
            }
        };

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let document = record.into_document()?;
            let files = if self.options.sync_files {
                self.pull_files(&document)?
            } else {
                Vec::new()
            };
            out.push(DownloadedDocument { document, files });
        }
        Ok(out)
    }

    fn pull_files(&self, doc: &Document) -> SyncResult<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::with_capacity(doc.files.len());
        for name in doc.files.keys() {
            let bytes = self.remote.get_file(self.dataset, &doc.logical_id, name)?;
            files.push((name.clone(), bytes));
        }
        Ok(files)
    }

    fn after_remote_mutation(&self) {
        if !self.options.dry_run {
            self.cache.invalidate(self.dataset);
        }
    }
}

fn chunk_len(max: Option<usize>, len: usize) -> usize {
    match max {
        Some(n) if n > 0 => n,
        _ => len.max(1),
    }
}

/// "document a" or "3 documents (a, b, c)".
fn label(ids: &[LogicalId]) -> String {
    match ids {
        [one] => format!("document {one}"),
        many => {
            let names: Vec<&str> = many.iter().map(LogicalId::as_str).collect();
            format!("{} documents ({})", many.len(), names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsync_store::{InMemoryLocalStore, InMemoryRemoteStore};
    use serde_json::json;

    struct Fixture {
        local: InMemoryLocalStore,
        remote: InMemoryRemoteStore,
        dataset: RemoteDatasetId,
        cache: RemoteListingCache,
    }

    impl Fixture {
        fn new(local_ids: &[&str]) -> Self {
            let docs = local_ids
                .iter()
                .map(|id| Document::new(*id).with_property("n", json!(id)))
                .collect();
            let remote = InMemoryRemoteStore::new();
            let dataset = RemoteDatasetId::from("cloud");
            remote.create_dataset(&dataset);
            Self {
                local: InMemoryLocalStore::with_documents("lab", docs),
                remote,
                dataset,
                cache: RemoteListingCache::new(),
            }
        }

        fn transfer<'a>(&'a self, options: &'a SyncOptions) -> BatchTransfer<'a> {
            BatchTransfer::new(&self.local, &self.remote, &self.dataset, &self.cache, options)
        }

        fn docs(&self) -> Vec<Document> {
            self.local.list_documents().unwrap().0
        }
    }

    #[test]
    fn batch_upload_is_chunked() {
        let fx = Fixture::new(&["a", "b", "c", "d", "e"]);
        let options = SyncOptions::default().with_max_chunk_size(Some(2));
        let mut trace = SyncTrace::new(true);
        let report = fx.transfer(&options).upload(&fx.docs(), &mut trace).unwrap();

        assert_eq!(report.upload_type, UploadType::Batch);
        assert_eq!(report.chunk_count(), 3);
        assert!(report.is_success());
        assert_eq!(report.manifest()[2], vec![LogicalId::from("e")]);
        assert_eq!(fx.remote.stats().uploads, 3);
        assert_eq!(fx.remote.ids(&fx.dataset).len(), 5);
        assert_eq!(trace.progress_lines().len(), 3);
    }

    #[test]
    fn failed_chunk_stops_the_phase() {
        let fx = Fixture::new(&["a", "b", "c", "d", "e"]);
        fx.remote.fail_upload_after(1);
        let options = SyncOptions::default().with_max_chunk_size(Some(2));
        let err = fx
            .transfer(&options)
            .upload(&fx.docs(), &mut SyncTrace::default())
            .unwrap_err();

        match err {
            SyncError::Transfer {
                phase,
                chunk,
                ids,
                report,
                ..
            } => {
                assert_eq!(phase, TransferPhase::Upload);
                assert_eq!(chunk, 1);
                assert_eq!(ids, vec![LogicalId::from("c"), LogicalId::from("d")]);
                assert_eq!(
                    report.status(),
                    &[
                        ChunkStatus::Success,
                        ChunkStatus::Failure,
                        ChunkStatus::NotAttempted
                    ]
                );
            }
            other => panic!("expected transfer error, got {other:?}"),
        }
        // Chunk 0 stays applied; chunk 2 was never sent.
        assert_eq!(
            fx.remote.ids(&fx.dataset),
            vec![LogicalId::from("a"), LogicalId::from("b")]
        );
        assert_eq!(fx.remote.stats().uploads, 2);
    }

    #[test]
    fn serial_upload_aborts_on_first_failed_document() {
        let fx = Fixture::new(&["a", "b", "c", "d"]);
        fx.remote.fail_upload_after(2);
        let options = SyncOptions::default().with_upload_strategy(FileUploadStrategy::Serial);
        let err = fx
            .transfer(&options)
            .upload(&fx.docs(), &mut SyncTrace::default())
            .unwrap_err();

        let report = err.report().unwrap();
        assert_eq!(report.upload_type, UploadType::Serial);
        assert_eq!(report.chunk_count(), 4);
        assert_eq!(report.succeeded(), vec![LogicalId::from("a"), LogicalId::from("b")]);
        assert_eq!(report.failed(), vec![LogicalId::from("c")]);
        assert_eq!(
            report.ids_with(ChunkStatus::NotAttempted),
            vec![LogicalId::from("d")]
        );
        assert_eq!(fx.remote.ids(&fx.dataset).len(), 2);
    }

    #[test]
    fn archives_are_removed_on_both_paths() {
        let scratch = tempfile::tempdir().unwrap();
        let fx = Fixture::new(&["a", "b", "c"]);
        let options = SyncOptions::default().with_max_chunk_size(Some(1));

        fx.remote.fail_upload_after(1);
        let transfer = fx.transfer(&options).with_archive_dir(scratch.path());
        assert!(transfer.upload(&fx.docs(), &mut SyncTrace::default()).is_err());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);

        fx.remote.clear_faults();
        assert!(transfer.upload(&fx.docs(), &mut SyncTrace::default()).is_ok());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn dry_run_upload_only_traces() {
        let fx = Fixture::new(&["a", "b"]);
        let options = SyncOptions::default().with_dry_run(true);
        let mut trace = SyncTrace::default();
        let report = fx.transfer(&options).upload(&fx.docs(), &mut trace).unwrap();

        assert_eq!(report.status(), &[ChunkStatus::DryRun]);
        assert_eq!(fx.remote.stats().mutations(), 0);
        assert_eq!(
            trace.would_lines(),
            vec!["would upload 2 documents (a, b) to cloud"]
        );
    }

    #[test]
    fn empty_upload_reports_none() {
        let fx = Fixture::new(&[]);
        let report = fx
            .transfer(&SyncOptions::default())
            .upload(&[], &mut SyncTrace::default())
            .unwrap();
        assert_eq!(report.upload_type, UploadType::None);
        assert_eq!(report.chunk_count(), 0);
        assert_eq!(fx.remote.stats().uploads, 0);
    }

    #[test]
    fn download_hands_documents_to_the_caller() {
        let fx = Fixture::new(&[]);
        let doc = Document::new("x").with_property("k", json!(1));
        fx.remote.upload_document(&fx.dataset, &doc).unwrap();
        let pairs = fx.remote.list_document_ids(&fx.dataset).unwrap();

        for strategy in [FileUploadStrategy::Batch, FileUploadStrategy::Serial] {
            let options = SyncOptions::default().with_upload_strategy(strategy);
            let mut docs = Vec::new();
            let report = fx
                .transfer(&options)
                .download(&pairs, &mut SyncTrace::default(), |item| {
                    docs.push(item);
                    Ok(())
                })
                .unwrap();
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].document, doc);
            assert!(report.is_success());
        }
        assert!(fx.local.is_empty());
    }

    #[test]
    fn download_applies_chunks_before_a_later_failure() {
        let fx = Fixture::new(&[]);
        for id in ["a", "b", "c"] {
            fx.remote
                .upload_document(&fx.dataset, &Document::new(id))
                .unwrap();
        }
        let pairs = fx.remote.list_document_ids(&fx.dataset).unwrap();
        fx.remote.fail_get(pairs.store_ids()[1].clone());
        let options = SyncOptions::default().with_upload_strategy(FileUploadStrategy::Serial);

        let mut applied = Vec::new();
        let err = fx
            .transfer(&options)
            .download(&pairs, &mut SyncTrace::default(), |item| {
                applied.push(item.document.logical_id);
                Ok(())
            })
            .unwrap_err();

        assert_eq!(applied, vec![LogicalId::from("a")]);
        assert_eq!(
            err.report().unwrap().status(),
            &[
                ChunkStatus::Success,
                ChunkStatus::Failure,
                ChunkStatus::NotAttempted
            ]
        );
    }

    #[test]
    fn rejected_document_fails_its_chunk() {
        let fx = Fixture::new(&[]);
        for id in ["a", "b", "c", "d"] {
            fx.remote
                .upload_document(&fx.dataset, &Document::new(id))
                .unwrap();
        }
        let pairs = fx.remote.list_document_ids(&fx.dataset).unwrap();
        let options = SyncOptions::default().with_max_chunk_size(Some(2));

        let mut applied = Vec::new();
        let err = fx
            .transfer(&options)
            .download(&pairs, &mut SyncTrace::default(), |item| {
                if item.document.logical_id.as_str() == "d" {
                    return Err(StoreError::Rejected("disk full".into()).into());
                }
                applied.push(item.document.logical_id);
                Ok(())
            })
            .unwrap_err();

        assert!(err.is_transfer());
        let report = err.report().unwrap();
        assert_eq!(report.status(), &[ChunkStatus::Success, ChunkStatus::Failure]);
        assert_eq!(report.succeeded(), vec![LogicalId::from("a"), LogicalId::from("b")]);
        assert_eq!(
            applied,
            vec![LogicalId::from("a"), LogicalId::from("b"), LogicalId::from("c")]
        );
    }

    #[test]
    fn download_of_missing_record_fails() {
        let fx = Fixture::new(&[]);
        let pairs: RemoteIdMap = vec![(LogicalId::from("ghost"), dsync_types::StoreId::from("nope"))]
            .into_iter()
            .collect();
        let options = SyncOptions::default().with_upload_strategy(FileUploadStrategy::Serial);
        let err = fx
            .transfer(&options)
            .download(&pairs, &mut SyncTrace::default(), |_| Ok(()))
            .unwrap_err();
        assert!(err.is_transfer());
        assert_eq!(err.report().unwrap().failed(), vec![LogicalId::from("ghost")]);
    }

    #[test]
    fn delete_remote_is_batched_and_aborts() {
        let fx = Fixture::new(&[]);
        for id in ["a", "b", "c"] {
            fx.remote
                .upload_document(&fx.dataset, &Document::new(id))
                .unwrap();
        }
        let pairs = fx.remote.list_document_ids(&fx.dataset).unwrap();
        let options = SyncOptions::default().with_max_delete_batch(Some(2));

        fx.remote.fail_deletes(true);
        let err = fx
            .transfer(&options)
            .delete_remote(&pairs, &mut SyncTrace::default())
            .unwrap_err();
        assert_eq!(
            err.report().unwrap().status(),
            &[ChunkStatus::Failure, ChunkStatus::NotAttempted]
        );
        assert_eq!(fx.remote.stats().delete_calls, 1);

        fx.remote.fail_deletes(false);
        let report = fx
            .transfer(&options)
            .delete_remote(&pairs, &mut SyncTrace::default())
            .unwrap();
        assert_eq!(report.chunk_count(), 2);
        assert!(fx.remote.ids(&fx.dataset).is_empty());
    }

    #[test]
    fn delete_local_removes_documents() {
        let fx = Fixture::new(&["a", "b", "c"]);
        let report = fx
            .transfer(&SyncOptions::default())
            .delete_local(&[LogicalId::from("a"), LogicalId::from("c")], &mut SyncTrace::default())
            .unwrap();
        assert!(report.is_success());
        assert_eq!(fx.local.ids(), vec![LogicalId::from("b")]);
    }

    #[test]
    fn attachments_travel_when_enabled() {
        let fx = Fixture::new(&[]);
        let doc = Document::new("scan").with_file("raw.bin", b"bytes");
        fx.local.add(&doc).unwrap();
        fx.local
            .write_file(&doc.logical_id, "raw.bin", b"bytes")
            .unwrap();
        let options = SyncOptions::default().with_sync_files(true);

        fx.transfer(&options)
            .upload(&[doc.clone()], &mut SyncTrace::default())
            .unwrap();
        assert_eq!(
            fx.remote.file(&fx.dataset, &doc.logical_id, "raw.bin"),
            Some(b"bytes".to_vec())
        );

        let pairs = fx.remote.list_document_ids(&fx.dataset).unwrap();
        let mut docs = Vec::new();
        fx.transfer(&options)
            .download(&pairs, &mut SyncTrace::default(), |item| {
                docs.push(item);
                Ok(())
            })
            .unwrap();
        assert_eq!(docs[0].files, vec![("raw.bin".to_string(), b"bytes".to_vec())]);
    }

    #[test]
    fn remote_mutation_invalidates_listing_cache() {
        let fx = Fixture::new(&["a"]);
        fx.cache.list(&fx.remote, &fx.dataset).unwrap();
        assert!(fx.cache.contains(&fx.dataset));

        fx.transfer(&SyncOptions::default())
            .upload(&fx.docs(), &mut SyncTrace::default())
            .unwrap();
        assert!(!fx.cache.contains(&fx.dataset));
    }
}
