//! In-memory key-value store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{KeyValueStore, StoreError, Values};

/// In-memory store shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a key is present
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Values, StoreError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: Values) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.extend(values);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        store
            .set(Values::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!("two")),
            ]))
            .await
            .unwrap();

        let values = store.get(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["b"], json!("two"));

        store.remove(&["a", "missing"]).await.unwrap();
        assert!(!store.contains("a").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .set(Values::from([("k".to_string(), json!(true))]))
            .await
            .unwrap();
        assert!(other.contains("k").await);
    }

    #[tokio::test]
    async fn test_get_string_helper() {
        let store = MemoryStore::new();
        store
            .set(Values::from([
                ("s".to_string(), json!("value")),
                ("n".to_string(), json!(5)),
            ]))
            .await
            .unwrap();
        assert_eq!(
            super::super::get_string(&store, "s").await.unwrap(),
            Some("value".to_string())
        );
        assert_eq!(super::super::get_string(&store, "n").await.unwrap(), None);
    }
}
