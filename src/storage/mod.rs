//! Key-Value Store Collaborator
//!
//! The reply core persists consent state and reads the credential through a
//! small key-value interface. Writes are awaited; once `set` or `remove`
//! returns `Ok`, the change is durable.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, used by tests and embedders that persist elsewhere
//! - [`FileStore`]: a single JSON object on disk, used by the CLI

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;

/// Values read from or written to a store, keyed by name
pub type Values = HashMap<String, serde_json::Value>;

/// Well-known store keys
pub mod keys {
    /// Whether consent is currently granted (bool)
    pub const CONSENT_GRANTED: &str = "consent_granted";
    /// When consent was granted (RFC 3339 timestamp)
    pub const CONSENT_GRANTED_AT: &str = "consent_granted_at";
    /// Policy version the user consented to (string)
    pub const CONSENT_VERSION: &str = "consent_version";
    /// Completion API credential (string)
    pub const API_KEY: &str = "api_key";
    /// Rate limiter ledger snapshot (array of RFC 3339 timestamps)
    pub const REQUEST_LEDGER: &str = "request_ledger";
}

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store content is not a JSON object
    #[error("Store is corrupt: {0}")]
    Corrupt(String),
}

impl From<StoreError> for crate::error::ReplyError {
    fn from(err: StoreError) -> Self {
        crate::error::ReplyError::Storage(err.to_string())
    }
}

/// Asynchronous key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Values, StoreError>;

    /// Write all values; durable once this returns.
    async fn set(&self, values: Values) -> Result<(), StoreError>;

    /// Delete the given keys. Deleting a missing key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Read a single string value
pub async fn get_string(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<String>, StoreError> {
    let mut values = store.get(&[key]).await?;
    Ok(values
        .remove(key)
        .and_then(|v| v.as_str().map(str::to_string)))
}
