//! Active hazard registry.
//!
//! One map from `(island, kind)` to expiration. A hazard is active exactly
//! while its key is present.

use std::collections::HashMap;

use serde::Serialize;
use tokio::time::Instant;

use super::kind::HazardKind;

/// Snapshot of one active hazard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveHazard {
    /// Island id
    pub island: String,
    /// Hazard kind
    pub kind: HazardKind,
    /// Time left before the sweep removes it
    #[serde(with = "humantime_string")]
    pub remaining: std::time::Duration,
}

mod humantime_string {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &std::time::Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }
}

/// Registry of active hazards keyed by `(island, kind)`.
#[derive(Debug, Default)]
pub struct ActiveHazards {
    expirations: HashMap<(String, HazardKind), Instant>,
}

impl ActiveHazards {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `kind` is active on `island`.
    #[must_use]
    pub fn is_active(&self, island: &str, kind: HazardKind) -> bool {
        self.expirations.contains_key(&(island.to_string(), kind))
    }

    /// Records a hazard unless the key is already present.
    ///
    /// Returns `false` and leaves the existing expiration untouched when
    /// the key is already active.
    pub fn insert(&mut self, island: &str, kind: HazardKind, expires_at: Instant) -> bool {
        let key = (island.to_string(), kind);
        if self.expirations.contains_key(&key) {
            return false;
        }
        self.expirations.insert(key, expires_at);
        true
    }

    /// Removes and returns every hazard whose expiration is at or before `now`.
    ///
    /// Results are sorted by island, then kind.
    pub fn sweep(&mut self, now: Instant) -> Vec<(String, HazardKind)> {
        let mut expired: Vec<_> = self
            .expirations
            .iter()
            .filter(|(_, expires_at)| **expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.expirations.remove(key);
        }
        expired.sort();
        expired
    }

    /// Removes every hazard on `island` and returns the removed kinds, sorted.
    pub fn remove_island(&mut self, island: &str) -> Vec<HazardKind> {
        let mut removed = Vec::new();
        self.expirations.retain(|(id, kind), _| {
            if id == island {
                removed.push(*kind);
                false
            } else {
                true
            }
        });
        removed.sort();
        removed
    }

    /// Returns every active hazard with its remaining time at `now`.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> Vec<ActiveHazard> {
        let mut active: Vec<_> = self
            .expirations
            .iter()
            .map(|((island, kind), expires_at)| ActiveHazard {
                island: island.clone(),
                kind: *kind,
                remaining: expires_at.saturating_duration_since(now),
            })
            .collect();
        active.sort_by(|a, b| a.island.cmp(&b.island).then(a.kind.cmp(&b.kind)));
        active
    }

    /// Returns the number of active hazards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expirations.len()
    }

    /// Returns `true` if nothing is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expirations.is_empty()
    }
}
