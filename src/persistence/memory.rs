//! In-memory document store.

use dashmap::DashMap;
use serde_json::Value;

use crate::error::PersistenceError;

use super::PersistenceGateway;

/// Document store that keeps everything in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, Value>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a raw document under `key`.
    pub fn insert(&self, key: impl Into<String>, document: Value) {
        self.documents.insert(key.into(), document);
    }

    /// Returns a copy of the raw document under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.documents.get(key).map(|doc| doc.value().clone())
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PersistenceGateway for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, document: &Value) -> Result<(), PersistenceError> {
        self.insert(key, document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_overwrites() {
        let store = MemoryStore::new();
        store.save("teams", &json!({"a": 1})).unwrap();
        store.save("teams", &json!({"a": 2})).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.load("teams").unwrap(), Some(json!({"a": 2})));
    }
}
