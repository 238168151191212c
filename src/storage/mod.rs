//! Blob storage for uploaded documents: collaborator backends plus the stage adapter.

mod adapter;
pub mod local;
pub mod s3;
mod scratch;
pub mod types;

pub use adapter::BlobStoreAdapter;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;
pub use scratch::ScratchFile;
pub use types::{BlobError, BlobStore, StorageError};
