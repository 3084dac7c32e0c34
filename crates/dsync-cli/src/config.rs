//! `dsync.toml` loading.
//!
//! ```toml
//! remote_root = "/srv/cloud"
//!
//! [options]
//! sync_files = true
//! file_upload_strategy = "serial"
//! max_chunk_size = 100
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use dsync_engine::SyncOptions;

pub const CONFIG_FILE: &str = "dsync.toml";

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub remote_root: Option<PathBuf>,
    #[serde(default)]
    pub options: toml::Table,
}

impl FileConfig {
    /// Load `explicit`, or `<dataset>/dsync.toml` if it exists. A missing
    /// explicit file is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>, dataset: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = dataset.join(CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: FileConfig =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Validate the `[options]` table into sync options.
    pub fn sync_options(&self) -> anyhow::Result<SyncOptions> {
        let map: BTreeMap<String, serde_json::Value> = self
            .options
            .iter()
            .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        Ok(SyncOptions::from_map(&map)?)
    }
}
