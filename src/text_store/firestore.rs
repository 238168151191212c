//! Firestore REST client persisting extracted text as documents.

use crate::config::Config;
use crate::text_store::types::{TextRecord, TextStore, TextStoreError};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Writes each record to `projects/{project}/databases/(default)/documents/{collection}/{id}`.
pub struct FirestoreTextStore {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) project_id: String,
    pub(crate) collection: String,
    pub(crate) access_token: Option<String>,
}

impl FirestoreTextStore {
    /// Construct a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, TextStoreError> {
        let project_id = config.firestore_project_id.clone().ok_or_else(|| {
            TextStoreError::Config("FIRESTORE_PROJECT_ID is required".into())
        })?;
        let base_url = Url::parse(&config.firestore_base_url).map_err(|error| {
            TextStoreError::Config(format!("invalid FIRESTORE_BASE_URL: {error}"))
        })?;
        let client = Client::builder().user_agent("pdfqa/0.1").build()?;
        tracing::debug!(
            url = %base_url,
            project = %project_id,
            collection = %config.firestore_collection,
            has_token = config.firestore_access_token.is_some(),
            "Initialized Firestore client"
        );
        Ok(Self {
            client,
            base_url,
            project_id,
            collection: config.firestore_collection.clone(),
            access_token: config.firestore_access_token.clone(),
        })
    }

    fn document_url(&self, document_id: &str) -> Result<Url, TextStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TextStoreError::Config("base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                self.collection.as_str(),
                document_id,
            ]);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.access_token
            && !token.is_empty()
        {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

fn string_field(fields: &HashMap<String, Value>, name: &str) -> Option<String> {
    let value = fields.get(name)?;
    value
        .get("stringValue")
        .or_else(|| value.get("timestampValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl TextStore for FirestoreTextStore {
    async fn upsert(&self, document_id: &str, record: &TextRecord) -> Result<(), TextStoreError> {
        // PATCH without an update mask replaces the whole document.
        let body = json!({
            "fields": {
                "text": { "stringValue": record.text },
                "content_hash": { "stringValue": record.content_hash },
                "extracted_at": { "timestampValue": record.extracted_at },
            }
        });
        let response = self
            .request(Method::PATCH, self.document_url(document_id)?)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(document_id, collection = %self.collection, "Firestore document written");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = TextStoreError::UnexpectedStatus { status, body };
            tracing::error!(document_id, error = %error, "Firestore write failed");
            Err(error)
        }
    }

    async fn fetch(&self, document_id: &str) -> Result<Option<TextRecord>, TextStoreError> {
        let response = self
            .request(Method::GET, self.document_url(document_id)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TextStoreError::UnexpectedStatus { status, body });
        }

        let document: FirestoreDocument = response.json().await?;
        let text = string_field(&document.fields, "text").ok_or_else(|| {
            TextStoreError::InvalidRecord(format!("document '{document_id}' has no text field"))
        })?;
        let content_hash = string_field(&document.fields, "content_hash")
            .unwrap_or_else(|| crate::text_store::types::content_hash(&text));
        Ok(Some(TextRecord {
            content_hash,
            extracted_at: string_field(&document.fields, "extracted_at").unwrap_or_default(),
            text,
        }))
    }
}
