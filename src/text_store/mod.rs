//! Persistence of extracted text keyed by document identifier.

mod adapter;
pub mod file;
pub mod firestore;
pub mod memory;
pub mod types;

pub use adapter::TextStoreAdapter;
pub use file::FileTextStore;
pub use firestore::FirestoreTextStore;
pub use memory::MemoryTextStore;
pub use types::{PersistenceError, TextRecord, TextStore, TextStoreError};
