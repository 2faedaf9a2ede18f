//! Cloneable admin surface for a running match.
//!
//! Phase and hazard commands are forwarded to the dispatch task so they
//! never race a tick. Team and territory edits go straight to the shared
//! [`TerritoryDirectory`] and are persisted immediately.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::error::{DirectoryError, HazardError, PhaseError};
use crate::hazard::{HazardActivation, HazardKind};
use crate::host::MemberId;
use crate::phase::PhaseTransition;
use crate::territory::TerritoryDirectory;
use crate::zone::{BlockPos, Zone};

use super::engine::GameSnapshot;
use super::runner::Command;

/// Admin handle for a [`GameRunner`](super::GameRunner).
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Command>,
    directory: Arc<TerritoryDirectory>,
}

impl GameHandle {
    pub(super) const fn new(tx: mpsc::Sender<Command>, directory: Arc<TerritoryDirectory>) -> Self {
        Self { tx, directory }
    }

    /// Returns the shared island and team registry.
    #[must_use]
    pub const fn directory(&self) -> &Arc<TerritoryDirectory> {
        &self.directory
    }

    /// Whether the dispatch task has stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(build(reply)).await.ok()?;
        rx.await.ok()
    }

    // ========================================================================
    // Hazards
    // ========================================================================

    /// Starts a hazard by name. Returns whether it started.
    pub async fn trigger_disaster(&self, island: &str, kind: &str) -> bool {
        match self.try_trigger_disaster(island, kind).await {
            Ok(_) => true,
            Err(e) => {
                warn!(island, kind, error = %e, "disaster trigger refused");
                false
            }
        }
    }

    /// Starts a hazard by name.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::UnknownKind`] for an unparseable name,
    /// [`HazardError::EngineStopped`] if the dispatch task is gone, or the
    /// orchestrator's rejection.
    pub async fn try_trigger_disaster(
        &self,
        island: &str,
        kind: &str,
    ) -> Result<HazardActivation, HazardError> {
        let kind = HazardKind::from_name(kind)?;
        let island = island.to_string();
        self.request(|reply| Command::TriggerDisaster {
            island,
            kind,
            reply,
        })
        .await
        .ok_or(HazardError::EngineStopped)?
    }

    /// Cancels every hazard on an island. Returns whether any was active.
    pub async fn cancel_disaster(&self, island: &str) -> bool {
        match self.try_cancel_disaster(island).await {
            Ok(_) => true,
            Err(e) => {
                warn!(island, error = %e, "disaster cancel refused");
                false
            }
        }
    }

    /// Cancels every hazard on an island, returning the cancelled kinds.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::IslandNotFound`], [`HazardError::NotActive`] or
    /// [`HazardError::EngineStopped`].
    pub async fn try_cancel_disaster(&self, island: &str) -> Result<Vec<HazardKind>, HazardError> {
        let island = island.to_string();
        self.request(|reply| Command::CancelDisaster { island, reply })
            .await
            .ok_or(HazardError::EngineStopped)?
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Forces a phase by name.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::UnknownPhase`] or [`PhaseError::EngineStopped`].
    pub async fn set_phase(&self, name: &str) -> Result<PhaseTransition, PhaseError> {
        let name = name.to_string();
        self.request(|reply| Command::SetPhase { name, reply })
            .await
            .ok_or(PhaseError::EngineStopped)?
    }

    /// Starts the countdown. Returns `false` if one is running, the match
    /// has left LOBBY, or the engine stopped.
    pub async fn start_countdown(&self) -> bool {
        self.request(|reply| Command::StartCountdown { reply })
            .await
            .unwrap_or(false)
    }

    /// Cancels the countdown. Returns `false` if none was running.
    pub async fn cancel_countdown(&self) -> bool {
        self.request(|reply| Command::CancelCountdown { reply })
            .await
            .unwrap_or(false)
    }

    /// Captures a snapshot, or `None` once the engine has stopped.
    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    // ========================================================================
    // Teams and territories
    // ========================================================================

    /// Puts a member on a team and saves the teams document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::TeamNotFound`] for an unknown team.
    pub fn assign_member(&self, team: &str, member: MemberId) -> Result<Option<String>, DirectoryError> {
        let previous = self.directory.assign_member(team, member)?;
        self.directory.save_teams();
        Ok(previous)
    }

    /// Removes a member from its team and saves the teams document.
    pub fn remove_member(&self, member: MemberId) -> Option<String> {
        let removed = self.directory.remove_member(member);
        if removed.is_some() {
            self.directory.save_teams();
        }
        removed
    }

    /// Adjusts a team's points and saves the teams document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::TeamNotFound`] for an unknown team.
    pub fn add_points(&self, team: &str, delta: i64) -> Result<u64, DirectoryError> {
        let total = self.directory.add_points(team, delta)?;
        self.directory.save_teams();
        Ok(total)
    }

    /// Replaces an island's territory and saves the territories document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IslandNotFound`] for an unknown island.
    pub fn set_territory(&self, island: &str, zone: Zone) -> Result<(), DirectoryError> {
        self.directory.set_territory(island, zone)?;
        self.directory.save_territories();
        Ok(())
    }

    /// Sets an island's spawn and saves the territories document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IslandNotFound`] for an unknown island.
    pub fn set_spawn(&self, island: &str, spawn: BlockPos) -> Result<(), DirectoryError> {
        self.directory.set_spawn(island, spawn)?;
        self.directory.save_territories();
        Ok(())
    }
}
