//! The document model.
//!
//! Documents travel between stores as JSON property maps. [`Document`] gives
//! the handful of fields the engine relies on a typed home and keeps every
//! other property in an open extension map, so a document read from one
//! store and written to another comes back out unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::id::LogicalId;

/// Property key holding the logical id.
pub const LOGICAL_ID_KEY: &str = "logical_id";
/// Property key holding binary-attachment metadata.
pub const FILES_KEY: &str = "files";
/// Property key holding the document class name.
pub const CLASS_KEY: &str = "document_class";

/// Metadata for one binary attachment. The bytes themselves live in the
/// store's file area and are moved separately from the document payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Size in bytes.
    pub size: u64,
    /// BLAKE3 hex digest of the content.
    pub checksum: String,
}

impl FileAttachment {
    /// Describe `content`.
    pub fn describe(content: &[u8]) -> Self {
        Self {
            size: content.len() as u64,
            checksum: hex::encode(blake3::hash(content).as_bytes()),
        }
    }
}

/// A document as seen by the sync engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document {
    /// Stable identity shared by both stores.
    pub logical_id: LogicalId,
    /// Document class (schema name), if any.
    pub document_class: Option<String>,
    /// Attachment metadata keyed by file name.
    pub files: BTreeMap<String, FileAttachment>,
    /// Every other property, preserved verbatim.
    pub properties: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document with the given logical id.
    pub fn new(logical_id: impl Into<LogicalId>) -> Self {
        Self {
            logical_id: logical_id.into(),
            document_class: None,
            files: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the document class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.document_class = Some(class.into());
        self
    }

    /// Set an extension property.
    ///
    /// Reserved keys ([`LOGICAL_ID_KEY`], [`FILES_KEY`], [`CLASS_KEY`]) are
    /// shadowed by the typed fields when the document is serialized.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Attach a file, recording its size and checksum.
    pub fn with_file(mut self, name: impl Into<String>, content: &[u8]) -> Self {
        self.files
            .insert(name.into(), FileAttachment::describe(content));
        self
    }

    /// Look up an extension property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns `true` if the document carries binary attachments.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Flatten into a JSON property map.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert(
            LOGICAL_ID_KEY.into(),
            Value::String(self.logical_id.to_string()),
        );
        match &self.document_class {
            Some(class) => {
                map.insert(CLASS_KEY.into(), Value::String(class.clone()));
            }
            None => {
                map.remove(CLASS_KEY);
            }
        }
        if self.files.is_empty() {
            map.remove(FILES_KEY);
        } else {
            let files = self
                .files
                .iter()
                .map(|(name, meta)| {
                    let meta = serde_json::to_value(meta).unwrap_or(Value::Null);
                    (name.clone(), meta)
                })
                .collect();
            map.insert(FILES_KEY.into(), Value::Object(files));
        }
        map
    }

    /// Rebuild a document from a JSON property map.
    pub fn from_properties(mut map: Map<String, Value>) -> Result<Self, TypeError> {
        let logical_id = match map.remove(LOGICAL_ID_KEY) {
            Some(Value::String(s)) => LogicalId::parse(s)?,
            Some(other) => {
                return Err(TypeError::InvalidProperty {
                    key: LOGICAL_ID_KEY.into(),
                    reason: format!("expected string, got {other}"),
                })
            }
            None => return Err(TypeError::MissingProperty(LOGICAL_ID_KEY)),
        };

        let document_class = match map.remove(CLASS_KEY) {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(TypeError::InvalidProperty {
                    key: CLASS_KEY.into(),
                    reason: format!("expected string, got {other}"),
                })
            }
        };

        let files = match map.remove(FILES_KEY) {
            Some(Value::Null) | None => BTreeMap::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                TypeError::InvalidProperty {
                    key: FILES_KEY.into(),
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            logical_id,
            document_class,
            files,
            properties: map.into_iter().collect(),
        })
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = TypeError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_properties(map)
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        doc.to_properties()
    }
}
