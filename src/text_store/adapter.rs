//! Stage adapter between the pipeline and a text store backend.

use crate::text_store::types::{PersistenceError, TextRecord, TextStore, TextStoreError};
use std::sync::Arc;

/// Stage adapter persisting extracted text through a [`TextStore`].
#[derive(Clone)]
pub struct TextStoreAdapter {
    store: Arc<dyn TextStore>,
}

impl TextStoreAdapter {
    /// Wrap a text store backend.
    pub fn new(store: Arc<dyn TextStore>) -> Self {
        Self { store }
    }

    /// Upsert `text` under `document_id`, replacing any prior value.
    pub async fn persist(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<TextRecord, PersistenceError> {
        let record = TextRecord::new(text.to_string());
        self.store
            .upsert(document_id, &record)
            .await
            .map_err(|error| PersistenceError {
                document_id: document_id.to_string(),
                reason: error.to_string(),
            })?;
        tracing::info!(
            document_id,
            content_hash = %record.content_hash,
            chars = record.text.chars().count(),
            "Extracted text persisted"
        );
        Ok(record)
    }

    /// Read previously persisted text for `document_id`.
    pub async fn lookup(&self, document_id: &str) -> Result<Option<String>, TextStoreError> {
        let record = self.store.fetch(document_id).await?;
        Ok(record.map(|record| record.text))
    }
}
