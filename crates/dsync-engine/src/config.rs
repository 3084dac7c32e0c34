use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use dsync_types::UploadType;

use crate::error::{SyncError, SyncResult};

/// How uploads are sent to the remote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileUploadStrategy {
    /// One document per call. Slower, but failures are attributed to a
    /// single document.
    Serial,
    /// Compressed chunk archives.
    #[default]
    Batch,
}

impl FileUploadStrategy {
    pub fn upload_type(self) -> UploadType {
        match self {
            Self::Serial => UploadType::Serial,
            Self::Batch => UploadType::Batch,
        }
    }
}

impl FromStr for FileUploadStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Self::Serial),
            "batch" => Ok(Self::Batch),
            other => Err(SyncError::config(
                "file_upload_strategy",
                format!("expected \"serial\" or \"batch\", got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for FileUploadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Serial => "serial",
            Self::Batch => "batch",
        })
    }
}

/// How the validator fetches remote snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// One request for every common id.
    #[default]
    Bulk,
    /// One request per id.
    Serial,
}

impl FromStr for ValidationMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bulk" => Ok(Self::Bulk),
            "serial" => Ok(Self::Serial),
            other => Err(SyncError::config(
                "validation_mode",
                format!("expected \"bulk\" or \"serial\", got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bulk => "bulk",
            Self::Serial => "serial",
        })
    }
}

/// Options controlling a sync run. Immutable once the run starts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Move attachment bytes along with documents.
    pub sync_files: bool,
    /// Record per-phase progress in the run trace.
    pub verbose: bool,
    /// Compute everything, mutate nothing.
    pub dry_run: bool,
    pub file_upload_strategy: FileUploadStrategy,
    /// Documents per upload chunk. `None` sends one chunk.
    pub max_chunk_size: Option<usize>,
    /// Ids per delete call. `None` deletes in one call.
    pub max_delete_batch: Option<usize>,
    pub validation_mode: ValidationMode,
}

impl SyncOptions {
    pub fn with_sync_files(mut self, on: bool) -> Self {
        self.sync_files = on;
        self
    }

    pub fn with_verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    pub fn with_upload_strategy(mut self, strategy: FileUploadStrategy) -> Self {
        self.file_upload_strategy = strategy;
        self
    }

    pub fn with_max_chunk_size(mut self, size: Option<usize>) -> Self {
        self.max_chunk_size = size;
        self
    }

    pub fn with_max_delete_batch(mut self, size: Option<usize>) -> Self {
        self.max_delete_batch = size;
        self
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Build options from a name -> value mapping.
    ///
    /// Recognized keys are type- and value-checked; unknown keys are ignored.
    pub fn from_map(map: &BTreeMap<String, Value>) -> SyncResult<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "sync_files" => options.sync_files = expect_bool(key, value)?,
                "verbose" => options.verbose = expect_bool(key, value)?,
                "dry_run" => options.dry_run = expect_bool(key, value)?,
                "file_upload_strategy" => {
                    options.file_upload_strategy = expect_str(key, value)?.parse()?
                }
                "validation_mode" => options.validation_mode = expect_str(key, value)?.parse()?,
                "max_chunk_size" => options.max_chunk_size = expect_size(key, value)?,
                "max_delete_batch" => options.max_delete_batch = expect_size(key, value)?,
                _ => debug!(key = %key, "ignoring unrecognized sync option"),
            }
        }
        Ok(options)
    }
}

fn expect_bool(key: &str, value: &Value) -> SyncResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| SyncError::config(key, format!("expected a boolean, got {value}")))
}

fn expect_str<'v>(key: &str, value: &'v Value) -> SyncResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| SyncError::config(key, format!("expected a string, got {value}")))
}

fn expect_size(key: &str, value: &Value) -> SyncResult<Option<usize>> {
    if value.is_null() {
        return Ok(None);
    }
    match value.as_u64() {
        Some(n) if n > 0 => Ok(Some(n as usize)),
        _ => Err(SyncError::config(
            key,
            format!("expected a positive integer or null, got {value}"),
        )),
    }
}
