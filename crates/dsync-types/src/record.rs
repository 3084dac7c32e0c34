use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::TypeError;
use crate::id::StoreId;

/// Property key under which remote stores report the store id.
pub const STORE_ID_KEY: &str = "id";

/// A raw record returned by a remote store: the remote-assigned id plus the
/// property map exactly as the remote holds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub store_id: StoreId,
    pub properties: Map<String, Value>,
}

impl RemoteRecord {
    /// Wrap a document as the remote would store it, stamping the store id
    /// into the property map.
    pub fn from_document(store_id: StoreId, document: &Document) -> Self {
        let mut properties = document.to_properties();
        properties.insert(STORE_ID_KEY.into(), Value::String(store_id.to_string()));
        Self {
            store_id,
            properties,
        }
    }

    /// Convert into a local document, dropping remote-only fields.
    pub fn into_document(self) -> Result<Document, TypeError> {
        let mut properties = self.properties;
        properties.remove(STORE_ID_KEY);
        Document::from_properties(properties)
    }
}
