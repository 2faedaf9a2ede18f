//! Concurrent island and team registry.
//!
//! Islands are keyed by id and teams by name, each in its own `DashMap`.
//! Lookups return cloned snapshots so no map guard ever escapes this
//! module, and enumeration is sorted by key so callers see a stable order.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::error::DirectoryError;
use crate::host::{MemberId, TeamScore};
use crate::persistence::{
    self, IslandRecord, PersistenceGateway, TEAMS_KEY, TERRITORIES_KEY, TeamRecord, TeamsDocument,
    TerritoriesDocument,
};
use crate::zone::{BlockPos, Zone};

use super::model::{ElementKind, Island, IslandSeed, Team};

/// Registry of islands and teams backed by a document store.
pub struct TerritoryDirectory {
    islands: DashMap<String, Island>,
    teams: DashMap<String, Team>,
    store: Arc<dyn PersistenceGateway>,
}

impl std::fmt::Debug for TerritoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerritoryDirectory")
            .field("islands", &self.islands.len())
            .field("teams", &self.teams.len())
            .finish_non_exhaustive()
    }
}

impl TerritoryDirectory {
    /// Creates an empty directory persisting through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            islands: DashMap::new(),
            teams: DashMap::new(),
            store,
        }
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Ensures exactly one linked island and team per elemental kind.
    ///
    /// Missing islands and teams are created and missing links filled in.
    /// Existing records and links are never replaced. Seeds apply a
    /// territory or spawn only where the island has none yet.
    pub fn bootstrap(&self, seeds: &[IslandSeed]) {
        for kind in ElementKind::ALL {
            let island_id = kind.island_id();
            let team_name = kind.as_str().to_string();

            {
                let mut island = self
                    .islands
                    .entry(island_id.clone())
                    .or_insert_with(|| Island::new(kind));
                match &island.team {
                    None => island.team = Some(team_name.clone()),
                    Some(existing) if *existing != team_name => {
                        warn!(island = %island_id, team = %existing, "island linked to foreign team");
                    }
                    Some(_) => {}
                }
                for seed in seeds.iter().filter(|s| s.kind == kind) {
                    if island.territory.is_none() {
                        island.territory.clone_from(&seed.territory);
                    }
                    if island.spawn.is_none() {
                        island.spawn = seed.spawn;
                    }
                }
            }

            let mut team = self
                .teams
                .entry(team_name.clone())
                .or_insert_with(|| Team::new(kind));
            match &team.island {
                None => team.island = Some(island_id.clone()),
                Some(existing) if *existing != island_id => {
                    warn!(team = %team_name, island = %existing, "team linked to foreign island");
                }
                Some(_) => {}
            }
        }
        debug!(
            islands = self.islands.len(),
            teams = self.teams.len(),
            "directory bootstrapped"
        );
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Returns a snapshot of the island with this id.
    #[must_use]
    pub fn island(&self, id: &str) -> Option<Island> {
        self.islands.get(id).map(|entry| entry.value().clone())
    }

    /// Returns a snapshot of the team with this name.
    #[must_use]
    pub fn team(&self, name: &str) -> Option<Team> {
        self.teams.get(name).map(|entry| entry.value().clone())
    }

    /// Returns every island, sorted by id.
    #[must_use]
    pub fn islands(&self) -> Vec<Island> {
        let mut islands: Vec<_> = self.islands.iter().map(|e| e.value().clone()).collect();
        islands.sort_by(|a, b| a.id.cmp(&b.id));
        islands
    }

    /// Returns every island id, sorted.
    #[must_use]
    pub fn island_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.islands.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns every team, sorted by name.
    #[must_use]
    pub fn teams(&self) -> Vec<Team> {
        let mut teams: Vec<_> = self.teams.iter().map(|e| e.value().clone()).collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    /// Returns the name of the team that has `member`, if any.
    #[must_use]
    pub fn team_of_member(&self, member: MemberId) -> Option<String> {
        self.teams
            .iter()
            .find(|entry| entry.members.contains(&member))
            .map(|entry| entry.key().clone())
    }

    /// Returns the island linked to `team`.
    #[must_use]
    pub fn island_of_team(&self, team: &str) -> Option<Island> {
        let island_id = self.teams.get(team)?.island.clone()?;
        self.island(&island_id)
    }

    /// Returns teams ordered by points, highest first, ties by name.
    #[must_use]
    pub fn standings(&self) -> Vec<TeamScore> {
        let mut scores: Vec<_> = self
            .teams
            .iter()
            .map(|entry| TeamScore {
                team: entry.name.clone(),
                points: entry.points,
            })
            .collect();
        scores.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.team.cmp(&b.team)));
        scores
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Puts `member` on `team`, removing it from any other team.
    ///
    /// Returns the team the member left, if it moved.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::TeamNotFound`] if no such team exists.
    pub fn assign_member(
        &self,
        team: &str,
        member: MemberId,
    ) -> Result<Option<String>, DirectoryError> {
        if !self.teams.contains_key(team) {
            return Err(DirectoryError::TeamNotFound(team.to_string()));
        }

        let mut previous = None;
        for mut entry in self.teams.iter_mut() {
            if entry.name != team && entry.members.remove(&member) {
                previous = Some(entry.name.clone());
            }
        }

        let mut target = self
            .teams
            .get_mut(team)
            .ok_or_else(|| DirectoryError::TeamNotFound(team.to_string()))?;
        target.members.insert(member);
        drop(target);

        info!(%member, team, from = ?previous, "member assigned");
        Ok(previous)
    }

    /// Removes `member` from whichever team has it.
    ///
    /// Returns the team it was removed from.
    pub fn remove_member(&self, member: MemberId) -> Option<String> {
        let mut removed = None;
        for mut entry in self.teams.iter_mut() {
            if entry.members.remove(&member) {
                removed = Some(entry.name.clone());
            }
        }
        removed
    }

    /// Adds a signed delta to a team's points, flooring at zero.
    ///
    /// Returns the new total.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::TeamNotFound`] if no such team exists.
    pub fn add_points(&self, team: &str, delta: i64) -> Result<u64, DirectoryError> {
        let mut entry = self
            .teams
            .get_mut(team)
            .ok_or_else(|| DirectoryError::TeamNotFound(team.to_string()))?;
        entry.points = if delta.is_negative() {
            entry.points.saturating_sub(delta.unsigned_abs())
        } else {
            entry.points.saturating_add(delta.unsigned_abs())
        };
        Ok(entry.points)
    }

    /// Replaces an island's territory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IslandNotFound`] if no such island exists.
    pub fn set_territory(&self, island: &str, zone: Zone) -> Result<(), DirectoryError> {
        let mut entry = self
            .islands
            .get_mut(island)
            .ok_or_else(|| DirectoryError::IslandNotFound(island.to_string()))?;
        entry.territory = Some(zone);
        Ok(())
    }

    /// Sets an island's spawn point.
    ///
    /// A spawn below elevation zero is the stored marker for "no spawn", so
    /// it clears the spawn instead.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IslandNotFound`] if no such island exists.
    pub fn set_spawn(&self, island: &str, spawn: BlockPos) -> Result<(), DirectoryError> {
        let mut entry = self
            .islands
            .get_mut(island)
            .ok_or_else(|| DirectoryError::IslandNotFound(island.to_string()))?;
        entry.spawn = (spawn.y >= 0).then_some(spawn);
        Ok(())
    }

    /// Clears an island's spawn point.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IslandNotFound`] if no such island exists.
    pub fn clear_spawn(&self, island: &str) -> Result<(), DirectoryError> {
        let mut entry = self
            .islands
            .get_mut(island)
            .ok_or_else(|| DirectoryError::IslandNotFound(island.to_string()))?;
        entry.spawn = None;
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Loads both documents, replacing records with the same key.
    ///
    /// Missing or unreadable documents leave the directory unchanged.
    pub fn load(&self) {
        let store = self.store.as_ref();

        if let Some(doc) = persistence::load_document::<TerritoriesDocument>(store, TERRITORIES_KEY)
        {
            for (id, record) in doc {
                self.islands.insert(id.clone(), record.into_island(id));
            }
        }

        if let Some(doc) = persistence::load_document::<TeamsDocument>(store, TEAMS_KEY) {
            for (name, record) in doc {
                self.teams.insert(name.clone(), record.into_team(name));
            }
        }

        info!(
            islands = self.islands.len(),
            teams = self.teams.len(),
            "directory loaded"
        );
    }

    /// Writes both documents. Returns whether both writes succeeded.
    pub fn save(&self) -> bool {
        let territories = self.save_territories();
        let teams = self.save_teams();
        territories && teams
    }

    /// Writes the `territories` document.
    pub fn save_territories(&self) -> bool {
        let doc: TerritoriesDocument = self
            .islands
            .iter()
            .map(|e| (e.key().clone(), IslandRecord::from_island(e.value())))
            .collect();
        persistence::save_document(self.store.as_ref(), TERRITORIES_KEY, &doc)
    }

    /// Writes the `teams` document.
    pub fn save_teams(&self) -> bool {
        let doc: TeamsDocument = self
            .teams
            .iter()
            .map(|e| (e.key().clone(), TeamRecord::from_team(e.value())))
            .collect();
        persistence::save_document(self.store.as_ref(), TEAMS_KEY, &doc)
    }
}
