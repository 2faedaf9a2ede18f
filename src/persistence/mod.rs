//! Document persistence
//!
//! The engine stores three opaque JSON documents through a
//! [`PersistenceGateway`]: `territories`, `teams`, and `phase-state`.
//! Loads never fail the caller: a missing document is empty, and an
//! unreadable or malformed one is logged and treated as empty.

pub mod documents;
pub mod file;
pub mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::PersistenceError;
use crate::observability::metrics;

pub use documents::{IslandRecord, PhaseRecord, TeamRecord, TeamsDocument, TerritoriesDocument};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Key of the island/territory document.
pub const TERRITORIES_KEY: &str = "territories";

/// Key of the team roster document.
pub const TEAMS_KEY: &str = "teams";

/// Key of the match phase document.
pub const PHASE_STATE_KEY: &str = "phase-state";

/// Opaque key/value document store.
pub trait PersistenceGateway: Send + Sync {
    /// Loads the document stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the document exists but cannot be read.
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError>;

    /// Replaces the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the document cannot be written.
    fn save(&self, key: &str, document: &Value) -> Result<(), PersistenceError>;
}

/// Loads and decodes a typed document, degrading to `None` on any failure.
///
/// `Ok(None)` from the store is silent. Read and decode failures are logged
/// as warnings and counted.
pub fn load_document<T: DeserializeOwned>(store: &dyn PersistenceGateway, key: &str) -> Option<T> {
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read document, starting empty");
            metrics::record_persistence_error(key);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(doc) => Some(doc),
        Err(source) => {
            let e = PersistenceError::Malformed {
                key: key.to_string(),
                source,
            };
            warn!(key, error = %e, "malformed document, starting empty");
            metrics::record_persistence_error(key);
            None
        }
    }
}

/// Encodes and writes a typed document.
///
/// Failures are logged and counted; returns whether the write succeeded.
pub fn save_document<T: Serialize>(store: &dyn PersistenceGateway, key: &str, doc: &T) -> bool {
    let value = match serde_json::to_value(doc) {
        Ok(value) => value,
        Err(e) => {
            error!(key, error = %e, "failed to encode document");
            metrics::record_persistence_error(key);
            return false;
        }
    };

    match store.save(key, &value) {
        Ok(()) => true,
        Err(e) => {
            error!(key, error = %e, "failed to write document");
            metrics::record_persistence_error(key);
            false
        }
    }
}
