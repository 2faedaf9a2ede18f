//! Persisted document layouts.
//!
//! Field names are camelCase. Unknown fields are ignored and missing
//! optional fields take their defaults, so older documents keep loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::MemberId;
use crate::phase::MatchPhase;
use crate::territory::{ElementKind, Island, Team};
use crate::zone::{BlockPos, Vertex, Zone};

/// `territories` document: island id to island record.
pub type TerritoriesDocument = BTreeMap<String, IslandRecord>;

/// `teams` document: team name to team record.
pub type TeamsDocument = BTreeMap<String, TeamRecord>;

/// Stored form of an [`Island`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandRecord {
    /// Elemental kind
    pub kind: ElementKind,
    /// Territory vertices, empty when the island has no territory
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    /// Lower vertical bound
    #[serde(default)]
    pub min_y: i32,
    /// Upper vertical bound
    #[serde(default)]
    pub max_y: i32,
    /// Linked team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    /// Spawn x
    #[serde(default)]
    pub spawn_x: i32,
    /// Spawn y, negative when no spawn is set
    #[serde(default = "undefined_spawn_y")]
    pub spawn_y: i32,
    /// Spawn z
    #[serde(default)]
    pub spawn_z: i32,
}

const fn undefined_spawn_y() -> i32 {
    -1
}

impl IslandRecord {
    /// Captures an island for storage.
    #[must_use]
    pub fn from_island(island: &Island) -> Self {
        let (vertices, min_y, max_y) = island.territory.as_ref().map_or_else(
            || (Vec::new(), 0, 0),
            |zone| (zone.vertices().to_vec(), zone.min_y(), zone.max_y()),
        );
        let spawn = island.spawn.unwrap_or(BlockPos::new(0, undefined_spawn_y(), 0));
        Self {
            kind: island.kind,
            vertices,
            min_y,
            max_y,
            team_name: island.team.clone(),
            spawn_x: spawn.x,
            spawn_y: spawn.y,
            spawn_z: spawn.z,
        }
    }

    /// Rebuilds the island stored under `id`.
    ///
    /// A stored territory that no longer validates is dropped with a warning.
    #[must_use]
    pub fn into_island(self, id: String) -> Island {
        let territory = if self.vertices.is_empty() {
            None
        } else {
            match Zone::new(self.vertices, self.min_y, self.max_y) {
                Ok(zone) => Some(zone),
                Err(e) => {
                    warn!(island = %id, error = %e, "discarding invalid stored territory");
                    None
                }
            }
        };
        let spawn =
            (self.spawn_y >= 0).then(|| BlockPos::new(self.spawn_x, self.spawn_y, self.spawn_z));
        Island {
            id,
            kind: self.kind,
            territory,
            team: self.team_name,
            spawn,
        }
    }
}

/// Stored form of a [`Team`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    /// Member identities
    #[serde(default)]
    pub members: Vec<MemberId>,
    /// Linked island
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub island_id: Option<String>,
    /// Point total
    #[serde(default)]
    pub points: u64,
}

impl TeamRecord {
    /// Captures a team for storage.
    #[must_use]
    pub fn from_team(team: &Team) -> Self {
        Self {
            members: team.members.iter().copied().collect(),
            island_id: team.island.clone(),
            points: team.points,
        }
    }

    /// Rebuilds the team stored under `name`.
    #[must_use]
    pub fn into_team(self, name: String) -> Team {
        Team {
            name,
            members: self.members.into_iter().collect(),
            points: self.points,
            island: self.island_id,
        }
    }
}

/// `phase-state` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    /// Current phase
    pub phase: MatchPhase,
    /// Ticks spent in the current phase
    #[serde(default)]
    pub elapsed_ticks: u64,
}
