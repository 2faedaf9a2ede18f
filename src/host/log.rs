//! Log-only host.
//!
//! Used when the engine runs standalone from the CLI: no players are
//! connected, and every announcement becomes a `tracing` event.

use tracing::{debug, info};

use crate::error::HostError;
use crate::zone::BlockPos;

use super::{GameHost, GameMode, MemberId, Participant, StatusCondition, TeamScore};

/// Host that logs every call and reports no participants.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHost;

impl LogHost {
    /// Creates a log host.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl GameHost for LogHost {
    fn participants(&self) -> Vec<Participant> {
        Vec::new()
    }

    fn broadcast(&self, message: &str) {
        info!(target: "islandclash::chat", "{message}");
    }

    fn notify(&self, member: MemberId, message: &str) {
        info!(target: "islandclash::chat", %member, "{message}");
    }

    fn update_progress(&self, fraction: f32, label: &str) {
        debug!(fraction, label, "progress");
    }

    fn show_scores(&self, scores: &[TeamScore]) {
        for score in scores {
            info!(team = %score.team, points = score.points, "score");
        }
    }

    fn set_combat_enabled(&self, enabled: bool) {
        info!(enabled, "combat rule changed");
    }

    fn teleport(&self, member: MemberId, destination: BlockPos) -> Result<(), HostError> {
        debug!(%member, %destination, "teleport");
        Ok(())
    }

    fn set_game_mode(&self, member: MemberId, mode: GameMode) -> Result<(), HostError> {
        debug!(%member, ?mode, "game mode");
        Ok(())
    }

    fn damage(&self, member: MemberId, amount: f64) -> Result<(), HostError> {
        debug!(%member, amount, "damage");
        Ok(())
    }

    fn add_freeze_ticks(&self, member: MemberId, ticks: u32) -> Result<(), HostError> {
        debug!(%member, ticks, "freeze");
        Ok(())
    }

    fn apply_condition(
        &self,
        member: MemberId,
        condition: StatusCondition,
        duration_ticks: u32,
        amplifier: u8,
    ) -> Result<(), HostError> {
        debug!(%member, %condition, duration_ticks, amplifier, "status condition");
        Ok(())
    }
}
