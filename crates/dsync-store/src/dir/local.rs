use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use dsync_types::{DatasetId, Document, LogicalId, RemoteLinkage};

use super::{
    check_name, id_component, json_files_sorted, read_json, read_json_opt, write_atomic,
    write_json,
};
use crate::error::{StoreError, StoreResult};
use crate::traits::LocalStore;

const META_DIR: &str = ".dsync";
const DATASET_FILE: &str = "dataset.json";
const LINKAGE_FILE: &str = "linkage.json";
const DOCUMENTS_DIR: &str = "documents";
const FILES_DIR: &str = "files";

#[derive(Serialize, Deserialize)]
struct DatasetMeta {
    dataset_id: DatasetId,
}

/// A local dataset kept in a directory tree.
///
/// ```text
/// <root>/.dsync/dataset.json     dataset identity
/// <root>/.dsync/linkage.json     remote linkage records
/// <root>/documents/<hex>.json    one file per document
/// <root>/files/<hex>/<name>      attachment bytes
/// ```
#[derive(Debug)]
pub struct DirLocalStore {
    root: PathBuf,
    dataset: DatasetId,
}

impl DirLocalStore {
    /// Initialize a dataset at `root`, or open it if it already carries the
    /// same identity.
    pub fn init(root: impl AsRef<Path>, dataset: DatasetId) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let meta_path = root.join(META_DIR).join(DATASET_FILE);
        if let Some(meta) = read_json_opt::<DatasetMeta>(&meta_path)? {
            if meta.dataset_id != dataset {
                return Err(StoreError::Rejected(format!(
                    "{} already holds dataset {}",
                    root.display(),
                    meta.dataset_id
                )));
            }
            return Ok(Self { root, dataset });
        }

        fs::create_dir_all(root.join(DOCUMENTS_DIR))?;
        fs::create_dir_all(root.join(FILES_DIR))?;
        write_json(
            &meta_path,
            &DatasetMeta {
                dataset_id: dataset.clone(),
            },
        )?;
        debug!(root = %root.display(), dataset = %dataset, "initialized local dataset");
        Ok(Self { root, dataset })
    }

    /// Open an initialized dataset.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = read_json_opt::<DatasetMeta>(&root.join(META_DIR).join(DATASET_FILE))?
            .ok_or_else(|| {
                StoreError::Rejected(format!("{} is not a dsync dataset", root.display()))
            })?;
        Ok(Self {
            root,
            dataset: meta.dataset_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &LogicalId) -> PathBuf {
        self.root
            .join(DOCUMENTS_DIR)
            .join(format!("{}.json", id_component(id)))
    }

    fn file_path(&self, id: &LogicalId, name: &str) -> StoreResult<PathBuf> {
        Ok(self
            .root
            .join(FILES_DIR)
            .join(id_component(id))
            .join(check_name(name)?))
    }

    fn linkage_path(&self) -> PathBuf {
        self.root.join(META_DIR).join(LINKAGE_FILE)
    }
}

impl LocalStore for DirLocalStore {
    fn dataset_id(&self) -> &DatasetId {
        &self.dataset
    }

    fn list_documents(&self) -> StoreResult<(Vec<Document>, Vec<LogicalId>)> {
        let mut docs = Vec::new();
        for path in json_files_sorted(&self.root.join(DOCUMENTS_DIR)) {
            docs.push(read_json::<Document>(&path)?);
        }
        let ids = docs.iter().map(|d| d.logical_id.clone()).collect();
        Ok((docs, ids))
    }

    fn add(&self, document: &Document) -> StoreResult<()> {
        write_json(&self.document_path(&document.logical_id), document)
    }

    fn remove(&self, logical_id: &LogicalId) -> StoreResult<bool> {
        let path = self.document_path(logical_id);
        let existed = path.exists();
        if existed {
            fs::remove_file(&path)?;
        }
        let files = self.root.join(FILES_DIR).join(id_component(logical_id));
        if files.exists() {
            fs::remove_dir_all(files)?;
        }
        Ok(existed)
    }

    fn read_file(&self, logical_id: &LogicalId, name: &str) -> StoreResult<Vec<u8>> {
        let path = self.file_path(logical_id, name)?;
        if !path.exists() {
            return Err(StoreError::FileNotFound {
                logical_id: logical_id.clone(),
                name: name.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }

    fn write_file(&self, logical_id: &LogicalId, name: &str, content: &[u8]) -> StoreResult<()> {
        write_atomic(&self.file_path(logical_id, name)?, content)
    }

    fn linkage_records(&self) -> StoreResult<Vec<RemoteLinkage>> {
        Ok(read_json_opt(&self.linkage_path())?.unwrap_or_default())
    }

    fn add_linkage(&self, record: &RemoteLinkage) -> StoreResult<()> {
        let mut records = self.linkage_records()?;
        if !records.contains(record) {
            records.push(record.clone());
        }
        write_json(&self.linkage_path(), &records)
    }
}
