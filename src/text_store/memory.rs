//! In-memory text store for development and tests.

use crate::text_store::types::{TextRecord, TextStore, TextStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local text store; contents vanish when the process exits.
#[derive(Default)]
pub struct MemoryTextStore {
    records: RwLock<HashMap<String, TextRecord>>,
}

impl MemoryTextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TextStore for MemoryTextStore {
    async fn upsert(&self, document_id: &str, record: &TextRecord) -> Result<(), TextStoreError> {
        self.records
            .write()
            .await
            .insert(document_id.to_string(), record.clone());
        Ok(())
    }

    async fn fetch(&self, document_id: &str) -> Result<Option<TextRecord>, TextStoreError> {
        Ok(self.records.read().await.get(document_id).cloned())
    }
}
