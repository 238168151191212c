//! Amazon S3 (or S3-compatible) blob store.

use crate::config::Config;
use crate::storage::types::{BlobError, BlobStore};
use async_trait::async_trait;
use aws_sdk_s3::{Client, config::Region, primitives::ByteStream};

/// Blob store backed by a single S3 bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Wrap an already configured SDK client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the ambient AWS credential chain plus configuration overrides.
    pub async fn from_config(config: &Config) -> Result<Self, BlobError> {
        let bucket = config
            .s3_bucket
            .clone()
            .ok_or_else(|| BlobError::Backend("S3_BUCKET is required for the S3 store".into()))?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.s3_endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::debug!(
            bucket = %bucket,
            region = ?config.aws_region,
            endpoint = ?config.s3_endpoint_url,
            "Initialized S3 client"
        );

        Ok(Self::new(Client::from_conf(builder.build()), bucket))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type_for(name))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|error| {
                tracing::error!(bucket = %self.bucket, key = name, error = ?error, "S3 put failed");
                BlobError::Backend(format!("put_object failed: {error}"))
            })?;
        Ok(name.to_string())
    }

    async fn list(&self) -> Result<Vec<String>, BlobError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|error| {
                    tracing::error!(bucket = %self.bucket, error = ?error, "S3 list failed");
                    BlobError::Backend(format!("list_objects_v2 failed: {error}"))
                })?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                let service_error = error.into_service_error();
                if service_error.is_no_such_key() {
                    BlobError::NotFound(key.to_string())
                } else {
                    BlobError::Backend(format!("get_object failed: {service_error}"))
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|error| BlobError::Backend(format!("failed to read object body: {error}")))?;
        Ok(bytes.into_bytes().to_vec())
    }
}

/// MIME type recorded on upload, derived from the key's extension.
fn content_type_for(key: &str) -> &'static str {
    let extension = std::path::Path::new(key)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
