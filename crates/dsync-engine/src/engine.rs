//! The sync engine facade: resolves the dataset pairing and runs policies,
//! validation, duplicate resolution and status queries against it.

use tracing::{info, warn};

use dsync_index::IndexStore;
use dsync_store::{LocalStore, RemoteListingCache, RemoteStore};
use dsync_types::{DatasetPair, Linkage, RemoteDatasetId, TransferReport};

use crate::config::SyncOptions;
use crate::duplicates::{find_duplicates, DuplicateScan};
use crate::error::{LinkageError, SyncResult};
use crate::linkage::{link_dataset, resolve_linkage};
use crate::outcome::SyncOutcome;
use crate::policy::SyncPolicy;
use crate::stage::StageContext;
use crate::status::SyncStatus;
use crate::trace::SyncTrace;
use crate::transfer::BatchTransfer;
use crate::validator::{ValidationReport, Validator};

/// Result of a duplicate-removal run.
#[derive(Debug)]
pub struct DedupeOutcome {
    pub scan: DuplicateScan,
    pub report: TransferReport,
    pub trace: SyncTrace,
}

/// Drives one local dataset against its remote counterpart.
///
/// The engine owns the remote listing cache for its lifetime. Runs against
/// the same dataset pairing must not overlap; the sync index is not locked.
pub struct SyncEngine<'a> {
    local: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    index: &'a dyn IndexStore,
    options: SyncOptions,
    cache: RemoteListingCache,
    remote_dataset: Option<RemoteDatasetId>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        index: &'a dyn IndexStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            local,
            remote,
            index,
            options,
            cache: RemoteListingCache::new(),
            remote_dataset: None,
        }
    }

    /// Use `remote` instead of resolving the linkage records.
    pub fn with_remote_dataset(mut self, remote: impl Into<RemoteDatasetId>) -> Self {
        self.remote_dataset = Some(remote.into());
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn cache(&self) -> &RemoteListingCache {
        &self.cache
    }

    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    /// The remote dataset this engine syncs with.
    pub fn remote_dataset(&self) -> SyncResult<RemoteDatasetId> {
        if let Some(remote) = &self.remote_dataset {
            return Ok(remote.clone());
        }
        match resolve_linkage(self.local)? {
            Linkage::Found(remote) => Ok(remote),
            Linkage::NotFound => {
                Err(LinkageError::NotLinked(self.local.dataset_id().clone()).into())
            }
        }
    }

    pub fn pair(&self) -> SyncResult<DatasetPair> {
        Ok(DatasetPair::new(
            self.local.dataset_id().clone(),
            self.remote_dataset()?,
        ))
    }

    /// Link the local dataset to `remote`.
    pub fn link(&self, remote: &RemoteDatasetId) -> SyncResult<()> {
        link_dataset(self.local, remote)
    }

    /// Run `policy` to completion. On error the sync index is left as it was.
    pub fn run(&self, policy: SyncPolicy) -> SyncResult<SyncOutcome> {
        let pair = self.pair()?;
        info!(
            policy = %policy,
            pair = %pair,
            dry_run = self.options.dry_run,
            "sync starting"
        );

        let pipeline = policy.pipeline();
        let mut ctx = StageContext::new(
            self.local,
            self.remote,
            self.index,
            &self.cache,
            &self.options,
            pair,
        );
        match pipeline.run(&mut ctx) {
            Ok(stages) => {
                let outcome = SyncOutcome::from_context(policy, ctx, stages);
                info!(
                    policy = %policy,
                    uploaded = outcome.uploaded.len(),
                    downloaded = outcome.downloaded.len(),
                    deleted_remote = outcome.deleted_remote.len(),
                    deleted_local = outcome.deleted_local.len(),
                    "sync complete"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(policy = %policy, pair = %ctx.pair(), error = %err, "sync failed");
                Err(err)
            }
        }
    }

    /// Compare local documents with their remote copies.
    pub fn validate(&self) -> SyncResult<ValidationReport> {
        let remote = self.remote_dataset()?;
        self.cache.invalidate(&remote);
        Validator::new(self.local, self.remote, &self.cache, &remote)
            .with_mode(self.options.validation_mode)
            .run()
    }

    /// List the remote dataset and group records sharing a logical id.
    pub fn find_duplicates(&self) -> SyncResult<DuplicateScan> {
        let remote = self.remote_dataset()?;
        self.cache.invalidate(&remote);
        let listing = self.cache.list(self.remote, &remote)?;
        Ok(find_duplicates(&listing))
    }

    /// Delete every duplicate record, keeping the smallest store id of
    /// each group. Honors `dry_run` and `max_delete_batch`.
    pub fn remove_duplicates(&self) -> SyncResult<DedupeOutcome> {
        let remote = self.remote_dataset()?;
        let scan = self.find_duplicates()?;
        let mut trace = SyncTrace::new(self.options.verbose);
        let transfer = BatchTransfer::new(
            self.local,
            self.remote,
            &remote,
            &self.cache,
            &self.options,
        );
        let report = transfer.delete_remote(&scan.duplicates(), &mut trace)?;
        info!(
            dataset = %remote,
            groups = scan.groups.len(),
            removed = scan.duplicate_count(),
            dry_run = self.options.dry_run,
            "duplicates resolved"
        );
        Ok(DedupeOutcome {
            scan,
            report,
            trace,
        })
    }

    /// Where the pairing stands, without changing anything.
    pub fn status(&self) -> SyncResult<SyncStatus> {
        let pair = self.pair()?;
        self.cache.invalidate(&pair.remote);
        let local = self.local.logical_ids()?;
        let remote = self.cache.list(self.remote, &pair.remote)?;
        let baseline = self.index.read(&pair)?;
        Ok(SyncStatus::compute(pair, &local, &remote, baseline))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::config::FileUploadStrategy;
    use crate::error::{SyncError, TransferPhase};
    use crate::state::RunState;
    use dsync_index::{FileIndexStore, InMemoryIndexStore};
    use dsync_store::{
        DirLocalStore, DirRemoteStore, InMemoryLocalStore, InMemoryRemoteStore, StoreResult,
    };
    use dsync_types::{
        ChunkStatus, DatasetId, Document, LogicalId, RemoteIdMap, RemoteLinkage, RemoteRecord,
        StoreId,
    };

    fn doc(id: &str) -> Document {
        Document::new(id).with_property("title", json!(format!("document {id}")))
    }

    fn ids(list: &[&str]) -> BTreeSet<LogicalId> {
        list.iter().map(|s| LogicalId::from(*s)).collect()
    }

    struct Fixture {
        local: InMemoryLocalStore,
        remote: InMemoryRemoteStore,
        index: InMemoryIndexStore,
        ds: RemoteDatasetId,
    }

    impl Fixture {
        fn new(local: &[&str], remote: &[&str]) -> Self {
            let ds = RemoteDatasetId::from("remote");
            let local_store =
                InMemoryLocalStore::with_documents("local", local.iter().map(|id| doc(id)).collect());
            local_store
                .add_linkage(&RemoteLinkage {
                    local: "local".into(),
                    remote: ds.clone(),
                })
                .unwrap();
            let remote_store = InMemoryRemoteStore::new();
            remote_store.create_dataset(&ds);
            for (n, id) in remote.iter().enumerate() {
                remote_store.insert_record(&ds, StoreId::from(format!("seed-{n:03}")), &doc(id));
            }
            Self {
                local: local_store,
                remote: remote_store,
                index: InMemoryIndexStore::new(),
                ds,
            }
        }

        fn engine(&self, options: SyncOptions) -> SyncEngine<'_> {
            SyncEngine::new(&self.local, &self.remote, &self.index, options)
        }

        fn run(&self, policy: SyncPolicy) -> SyncOutcome {
            self.engine(SyncOptions::default()).run(policy).unwrap()
        }

        fn local_ids(&self) -> BTreeSet<LogicalId> {
            self.local.ids().into_iter().collect()
        }

        fn remote_ids(&self) -> BTreeSet<LogicalId> {
            self.remote.ids(&self.ds).into_iter().collect()
        }
    }

    #[test]
    fn mirror_to_remote_converges() {
        let fx = Fixture::new(&["A", "B", "C"], &["B", "Z", "Z"]);
        let outcome = fx.run(SyncPolicy::MirrorToRemote);

        assert_eq!(fx.remote_ids(), ids(&["A", "B", "C"]));
        assert_eq!(fx.remote.records(&fx.ds).len(), 3);
        assert_eq!(outcome.uploaded, vec![LogicalId::from("A"), LogicalId::from("C")]);
        assert_eq!(outcome.deleted_remote.len(), 2);
        assert!(outcome.index_written);
        assert_eq!(outcome.final_state, RunState::Done);
    }

    #[test]
    fn mirror_to_remote_is_idempotent() {
        let fx = Fixture::new(&["A", "B"], &["C"]);
        fx.run(SyncPolicy::MirrorToRemote);
        fx.remote.reset_stats();

        let second = fx.run(SyncPolicy::MirrorToRemote);
        assert!(second.is_noop());
        assert_eq!(fx.remote.stats().mutations(), 0);
    }

    #[test]
    fn mirror_deletes_from_post_upload_listing() {
        let fx = Fixture::new(&["A"], &["A", "Z"]);
        let outcome = fx.run(SyncPolicy::MirrorToRemote);

        assert!(outcome.uploaded.is_empty());
        assert_eq!(outcome.deleted_remote, vec![LogicalId::from("Z")]);
        assert_eq!(fx.remote_ids(), ids(&["A"]));
    }

    #[test]
    fn mirror_from_remote_converges() {
        let fx = Fixture::new(&["A", "L"], &["A", "R"]);
        let outcome = fx.run(SyncPolicy::MirrorFromRemote);

        assert_eq!(fx.local_ids(), ids(&["A", "R"]));
        assert_eq!(outcome.downloaded, vec![LogicalId::from("R")]);
        assert_eq!(outcome.deleted_local, vec![LogicalId::from("L")]);
        assert_eq!(fx.remote.stats().mutations(), 0);
    }

    #[test]
    fn two_way_is_additive() {
        let fx = Fixture::new(&["A", "B"], &["B", "C"]);
        let outcome = fx.run(SyncPolicy::TwoWay);

        let union = ids(&["A", "B", "C"]);
        assert_eq!(fx.local_ids(), union);
        assert_eq!(fx.remote_ids(), union);
        assert_eq!(outcome.uploaded, vec![LogicalId::from("A")]);
        assert_eq!(outcome.downloaded, vec![LogicalId::from("C")]);
        assert!(outcome.deleted_local.is_empty() && outcome.deleted_remote.is_empty());

        let index = fx.index.read(&fx.engine(SyncOptions::default()).pair().unwrap()).unwrap().unwrap();
        assert_eq!(index.local_document_ids_last_sync, union);
        assert_eq!(index.remote_document_ids_last_sync, union);
    }

    #[test]
    fn download_new_uses_index_baseline() {
        let fx = Fixture::new(&["A", "B"], &["B", "C"]);

        let first = fx.run(SyncPolicy::DownloadNew);
        assert_eq!(first.downloaded, vec![LogicalId::from("B"), LogicalId::from("C")]);
        assert_eq!(fx.local_ids(), ids(&["A", "B", "C"]));

        let second = fx.run(SyncPolicy::DownloadNew);
        assert!(second.downloaded.is_empty());

        let pair = fx.engine(SyncOptions::default()).pair().unwrap();
        let index = fx.index.read(&pair).unwrap().unwrap();
        assert_eq!(index.remote_document_ids_last_sync, ids(&["B", "C"]));
        assert!(index.local_document_ids_last_sync.is_empty());
    }

    #[test]
    fn upload_new_is_incremental() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let first = fx.run(SyncPolicy::UploadNew);
        assert_eq!(first.uploaded.len(), 2);

        let second = fx.run(SyncPolicy::UploadNew);
        assert!(second.uploaded.is_empty());

        fx.local.add(&doc("C")).unwrap();
        let third = fx.run(SyncPolicy::UploadNew);
        assert_eq!(third.uploaded, vec![LogicalId::from("C")]);
        assert_eq!(fx.remote.records(&fx.ds).len(), 3);
    }

    #[test]
    fn dry_run_never_mutates() {
        for policy in SyncPolicy::ALL {
            let fx = Fixture::new(&["A", "B"], &["B", "C"]);
            let engine = fx.engine(SyncOptions::default().with_dry_run(true));
            let outcome = engine.run(policy).unwrap();

            assert_eq!(fx.local_ids(), ids(&["A", "B"]), "{policy}");
            assert_eq!(fx.remote_ids(), ids(&["B", "C"]), "{policy}");
            assert_eq!(fx.remote.stats().mutations(), 0, "{policy}");
            assert_eq!(fx.index.writes(), 0, "{policy}");
            assert!(!outcome.index_written);
            assert!(!outcome.is_noop(), "{policy}");
            assert!(outcome
                .would_lines()
                .iter()
                .all(|line| line.starts_with("would ")));
            assert!(outcome
                .would_lines()
                .iter()
                .any(|line| line.starts_with("would write sync index")));
        }
    }

    #[test]
    fn dry_run_previews_the_live_run() {
        let fx = Fixture::new(&["A", "B"], &["B", "C"]);
        let preview = fx
            .engine(SyncOptions::default().with_dry_run(true))
            .run(SyncPolicy::MirrorToRemote)
            .unwrap();
        let live = fx.run(SyncPolicy::MirrorToRemote);

        assert_eq!(preview.uploaded, live.uploaded);
        assert_eq!(preview.deleted_remote, live.deleted_remote);
    }

    #[test]
    fn dry_run_leaves_files_on_disk_untouched() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = DirLocalStore::init(local_dir.path(), DatasetId::from("lab")).unwrap();
        let remote = DirRemoteStore::open(remote_dir.path()).unwrap();
        let ds = RemoteDatasetId::from("cloud");
        remote.create_dataset(&ds).unwrap();
        let index = FileIndexStore::new(local_dir.path());

        local.add(&doc("A")).unwrap();
        let engine = SyncEngine::new(&local, &remote, &index, SyncOptions::default())
            .with_remote_dataset(ds.clone());
        engine.run(SyncPolicy::MirrorToRemote).unwrap();

        local.add(&doc("B")).unwrap();
        let path = index.path_for(&engine.pair().unwrap()).unwrap();
        let before = std::fs::read(&path).unwrap();
        let remote_before = remote.list_document_ids(&ds).unwrap();

        let dry = SyncEngine::new(&local, &remote, &index, SyncOptions::default().with_dry_run(true))
            .with_remote_dataset(ds.clone());
        for policy in SyncPolicy::ALL {
            dry.run(policy).unwrap();
        }

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(remote.list_document_ids(&ds).unwrap(), remote_before);
        assert_eq!(local.logical_ids().unwrap(), vec![LogicalId::from("A"), LogicalId::from("B")]);
    }

    #[test]
    fn failed_run_keeps_baseline_and_retry_recovers() {
        let fx = Fixture::new(&["A", "B", "C"], &[]);
        fx.remote.fail_upload_after(1);
        let engine = fx.engine(SyncOptions::default().with_max_chunk_size(Some(1)));

        let err = engine.run(SyncPolicy::MirrorToRemote).unwrap_err();
        match &err {
            SyncError::Transfer { phase, chunk, ids, .. } => {
                assert_eq!(*phase, TransferPhase::Upload);
                assert_eq!(*chunk, 1);
                assert_eq!(ids, &vec![LogicalId::from("B")]);
            }
            other => panic!("expected transfer error, got {other}"),
        }
        let report = err.report().unwrap();
        assert_eq!(
            report.status(),
            &[ChunkStatus::Success, ChunkStatus::Failure, ChunkStatus::NotAttempted]
        );
        assert_eq!(fx.index.writes(), 0);
        assert_eq!(fx.remote_ids(), ids(&["A"]));

        fx.remote.clear_faults();
        let retry = engine.run(SyncPolicy::MirrorToRemote).unwrap();
        assert_eq!(retry.uploaded, vec![LogicalId::from("B"), LogicalId::from("C")]);
        assert_eq!(fx.remote_ids(), ids(&["A", "B", "C"]));
        assert_eq!(fx.index.writes(), 1);
    }

    #[test]
    fn failed_delete_skips_index() {
        let fx = Fixture::new(&["A"], &["A", "Z"]);
        fx.remote.fail_deletes(true);
        let err = fx
            .engine(SyncOptions::default())
            .run(SyncPolicy::MirrorToRemote)
            .unwrap_err();
        assert!(err.is_transfer());
        assert_eq!(fx.index.writes(), 0);
    }

    #[test]
    fn failed_download_keeps_earlier_documents() {
        let fx = Fixture::new(&[], &["A", "B"]);
        fx.remote.fail_get(StoreId::from("seed-001"));
        let options = SyncOptions::default().with_upload_strategy(FileUploadStrategy::Serial);

        let err = fx
            .engine(options.clone())
            .run(SyncPolicy::DownloadNew)
            .unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.status(), &[ChunkStatus::Success, ChunkStatus::Failure]);
        assert_eq!(report.succeeded(), vec![LogicalId::from("A")]);
        assert_eq!(fx.local_ids(), ids(&["A"]));
        assert_eq!(fx.index.writes(), 0);

        fx.remote.clear_faults();
        fx.engine(options).run(SyncPolicy::DownloadNew).unwrap();
        assert_eq!(fx.local_ids(), ids(&["A", "B"]));
        assert_eq!(fx.index.writes(), 1);
    }

    /// Remote that silently drops the last document of every archive.
    struct ShortStoringRemote<'a>(&'a InMemoryRemoteStore);

    impl RemoteStore for ShortStoringRemote<'_> {
        fn list_document_ids(&self, dataset: &RemoteDatasetId) -> StoreResult<RemoteIdMap> {
            self.0.list_document_ids(dataset)
        }

        fn get_document(
            &self,
            dataset: &RemoteDatasetId,
            store_id: &StoreId,
        ) -> StoreResult<Option<RemoteRecord>> {
            self.0.get_document(dataset, store_id)
        }

        fn delete_documents(
            &self,
            dataset: &RemoteDatasetId,
            store_ids: &[StoreId],
        ) -> StoreResult<()> {
            self.0.delete_documents(dataset, store_ids)
        }

        fn upload_document(
            &self,
            dataset: &RemoteDatasetId,
            document: &Document,
        ) -> StoreResult<StoreId> {
            self.0.upload_document(dataset, document)
        }

        fn upload_archive(
            &self,
            dataset: &RemoteDatasetId,
            archive: &Path,
        ) -> StoreResult<Vec<StoreId>> {
            let mut stored = self.0.upload_archive(dataset, archive)?;
            if let Some(dropped) = stored.pop() {
                self.0.delete_documents(dataset, &[dropped])?;
            }
            Ok(stored)
        }

        fn put_file(
            &self,
            dataset: &RemoteDatasetId,
            logical_id: &LogicalId,
            name: &str,
            content: &[u8],
        ) -> StoreResult<()> {
            self.0.put_file(dataset, logical_id, name, content)
        }

        fn get_file(
            &self,
            dataset: &RemoteDatasetId,
            logical_id: &LogicalId,
            name: &str,
        ) -> StoreResult<Vec<u8>> {
            self.0.get_file(dataset, logical_id, name)
        }
    }

    #[test]
    fn short_archive_store_fails_the_chunk() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let short = ShortStoringRemote(&fx.remote);

        let err = SyncEngine::new(&fx.local, &short, &fx.index, SyncOptions::default())
            .run(SyncPolicy::UploadNew)
            .unwrap_err();
        assert!(err.is_transfer());
        assert!(err.to_string().contains("remote stored 1 of 2 documents"));
        assert_eq!(err.report().unwrap().status(), &[ChunkStatus::Failure]);
        assert_eq!(fx.index.writes(), 0);
        assert_eq!(fx.remote_ids(), ids(&["A"]));

        let retry = fx.run(SyncPolicy::UploadNew);
        assert_eq!(retry.uploaded, vec![LogicalId::from("A"), LogicalId::from("B")]);
        assert_eq!(fx.remote_ids(), ids(&["A", "B"]));
    }

    #[test]
    fn unlinked_dataset_fails_before_io() {
        let local = InMemoryLocalStore::with_documents("solo", vec![doc("A")]);
        let remote = InMemoryRemoteStore::new();
        let index = InMemoryIndexStore::new();
        let engine = SyncEngine::new(&local, &remote, &index, SyncOptions::default());

        let err = engine.run(SyncPolicy::UploadNew).unwrap_err();
        assert!(matches!(err, SyncError::Linkage(LinkageError::NotLinked(_))));
        assert_eq!(remote.stats().lists, 0);

        engine.link(&RemoteDatasetId::from("cloud")).unwrap();
        assert_eq!(engine.remote_dataset().unwrap(), RemoteDatasetId::from("cloud"));
    }

    #[test]
    fn explicit_remote_overrides_linkage() {
        let fx = Fixture::new(&["A"], &[]);
        fx.remote.create_dataset(&RemoteDatasetId::from("other"));
        let engine = fx.engine(SyncOptions::default()).with_remote_dataset("other");
        engine.run(SyncPolicy::UploadNew).unwrap();
        assert_eq!(fx.remote.ids(&RemoteDatasetId::from("other")), vec![LogicalId::from("A")]);
        assert!(fx.remote_ids().is_empty());
    }

    #[test]
    fn duplicates_are_found_and_removed() {
        let fx = Fixture::new(&["X"], &["X", "X", "Y", "X"]);
        let engine = fx.engine(SyncOptions::default().with_max_delete_batch(Some(1)));

        let scan = engine.find_duplicates().unwrap();
        assert_eq!(scan.groups.len(), 1);
        assert_eq!(scan.groups[0].original, StoreId::from("seed-000"));

        let outcome = engine.remove_duplicates().unwrap();
        assert_eq!(outcome.report.chunk_count(), 2);
        assert_eq!(fx.remote.records(&fx.ds).len(), 2);
        assert!(engine.find_duplicates().unwrap().is_empty());
    }

    #[test]
    fn duplicate_removal_dry_run() {
        let fx = Fixture::new(&[], &["X", "X"]);
        let outcome = fx
            .engine(SyncOptions::default().with_dry_run(true))
            .remove_duplicates()
            .unwrap();
        assert_eq!(outcome.scan.duplicate_count(), 1);
        assert_eq!(outcome.trace.would_lines().len(), 1);
        assert_eq!(fx.remote.records(&fx.ds).len(), 2);
    }

    #[test]
    fn validate_strips_attachment_metadata() {
        let fx = Fixture::new(&[], &["X"]);
        fx.local
            .add(&doc("X").with_file("trace.csv", b"1,2,3"))
            .unwrap();
        let report = fx.engine(SyncOptions::default()).validate().unwrap();
        assert_eq!(report.common, vec![LogicalId::from("X")]);
        assert!(report.mismatched.is_empty());
    }

    #[test]
    fn files_travel_with_documents() {
        let fx = Fixture::new(&[], &[]);
        let source = doc("X").with_file("raw.bin", b"payload");
        fx.local.add(&source).unwrap();
        fx.local
            .write_file(&LogicalId::from("X"), "raw.bin", b"payload")
            .unwrap();
        let options = SyncOptions::default().with_sync_files(true);
        fx.engine(options.clone()).run(SyncPolicy::UploadNew).unwrap();

        let other = InMemoryLocalStore::new("other");
        let index = InMemoryIndexStore::new();
        SyncEngine::new(&other, &fx.remote, &index, options)
            .with_remote_dataset(fx.ds.clone())
            .run(SyncPolicy::DownloadNew)
            .unwrap();

        assert_eq!(
            other.read_file(&LogicalId::from("X"), "raw.bin").unwrap(),
            b"payload".to_vec()
        );
        assert_eq!(other.get(&LogicalId::from("X")).unwrap().files, source.files);
    }

    #[test]
    fn status_reports_partitions_and_baseline() {
        let fx = Fixture::new(&["A", "B"], &["B", "C", "C"]);
        let engine = fx.engine(SyncOptions::default());

        let before = engine.status().unwrap();
        assert_eq!(before.local_only, vec![LogicalId::from("A")]);
        assert_eq!(before.remote_only, vec![LogicalId::from("C")]);
        assert_eq!(before.common, vec![LogicalId::from("B")]);
        assert_eq!(before.remote_duplicates, 1);
        assert!(before.baseline.is_none());
        assert_eq!(before.new_local_since_sync.len(), 2);

        engine.run(SyncPolicy::TwoWay).unwrap();
        fx.local.add(&doc("D")).unwrap();
        let after = engine.status().unwrap();
        assert!(after.baseline.is_some());
        assert_eq!(after.new_local_since_sync, vec![LogicalId::from("D")]);
        assert!(after.new_remote_since_sync.is_empty());
    }
}
