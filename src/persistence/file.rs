//! JSON file document store.
//!
//! Each document lives in `<dir>/<key>.json`. Writes go to a sibling
//! temporary file first and are renamed into place, so a crash mid-write
//! leaves the previous document intact. Saves of the same key are
//! serialized, and every save stages into its own temporary file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::PersistenceError;

use super::PersistenceGateway;

/// Document store backed by one JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_locks: Arc::new(DashMap::new()),
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_lock(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.write_locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

fn io_error(key: &str, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        key: key.to_string(),
        source,
    }
}

fn persist(staging: NamedTempFile, target: &Path) -> std::io::Result<()> {
    staging.as_file().sync_all()?;
    staging.persist(target).map(drop).map_err(|e| e.error)
}

impl PersistenceGateway for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let content = match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key, e)),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    fn save(&self, key: &str, document: &Value) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;

        let rendered =
            serde_json::to_string_pretty(document).map_err(|source| PersistenceError::Malformed {
                key: key.to_string(),
                source,
            })?;

        let lock = self.write_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut staging = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| io_error(key, e))?;
        staging
            .write_all(rendered.as_bytes())
            .map_err(|e| io_error(key, e))?;
        persist(staging, &self.path_for(key)).map_err(|e| io_error(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("teams").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let doc = json!({"phase": "BUILD", "elapsedTicks": 40});

        store.save("phase-state", &doc).unwrap();

        assert!(store.path_for("phase-state").exists());
        assert_eq!(store.load("phase-state").unwrap(), Some(doc));
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("teams", &json!({})).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["teams.json".to_string()]);
    }

    #[test]
    fn test_concurrent_saves_of_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        for round in 0..50 {
            let handles: Vec<_> = (0..4)
                .map(|writer| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store.save("teams", &json!({"round": round, "writer": writer}))
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
            let doc = store.load("teams").unwrap().unwrap();
            assert_eq!(doc["round"], round);
        }

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["teams.json".to_string()]);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("teams.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        let err = store.load("teams").unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { .. }));
    }

    #[test]
    fn test_empty_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("teams.json"), "  \n").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("teams").unwrap().is_none());
    }
}
