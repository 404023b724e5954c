//! State store trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Persistent key/value collaborator used to save final orchestration results.
///
/// One JSON value per key; for pipeline runs the key is the orchestration
/// instance id and the value is the serialized processing result.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Save a value under a key, replacing any previous value.
    async fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Get the value stored under a key.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Delete the value stored under a key.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
