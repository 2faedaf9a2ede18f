//! Host game server boundary
//!
//! The engine never talks to players, worlds, or chat directly. Everything
//! it needs from the running game server goes through [`GameHost`], which
//! the embedding server implements.
//!
//! - [`LogHost`]: standalone host that renders every call as a log line
//! - [`RecordingHost`]: in-memory host that records calls for assertions

pub mod log;
pub mod recording;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HostError;
use crate::zone::{BlockPos, Position};

pub use log::LogHost;
pub use recording::{HostCall, RecordingHost};

/// Stable identity of a player.
pub type MemberId = Uuid;

/// A connected entity and where it currently stands.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Player identity
    pub id: MemberId,
    /// Display name, used only for logging
    pub name: String,
    /// Current position
    pub position: Position,
}

/// Gameplay mode the host applies to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Normal play with damage and resources
    Survival,
    /// No block breaking
    Adventure,
    /// Observer only
    Spectator,
}

/// Timed status condition applied by hazard effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCondition {
    /// Set on fire
    Burning,
    /// Movement slowed
    Slowness,
    /// Screen wobble
    Nausea,
    /// Floats upward
    Levitation,
}

impl StatusCondition {
    /// Returns the snake-case name used in logs and notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Burning => "burning",
            Self::Slowness => "slowness",
            Self::Nausea => "nausea",
            Self::Levitation => "levitation",
        }
    }
}

impl std::fmt::Display for StatusCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the score display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    /// Team name
    pub team: String,
    /// Current point total
    pub points: u64,
}

/// Operations the engine needs from the hosting game server.
///
/// Announcements and display updates are fire-and-forget. Per-player
/// mutations return a [`HostError`] so callers can log and carry on.
pub trait GameHost: Send + Sync {
    /// Returns every connected participant with its current position.
    fn participants(&self) -> Vec<Participant>;

    /// Sends a message to everyone on the server.
    fn broadcast(&self, message: &str);

    /// Sends a short message to one player.
    fn notify(&self, member: MemberId, message: &str);

    /// Updates the long-running progress display.
    ///
    /// `fraction` is the remaining share of the current timer, in `0.0..=1.0`.
    fn update_progress(&self, fraction: f32, label: &str);

    /// Initializes or refreshes the score display.
    fn show_scores(&self, scores: &[TeamScore]);

    /// Toggles player-versus-player combat server-wide.
    fn set_combat_enabled(&self, enabled: bool);

    /// Moves a player to a block.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the player cannot be moved.
    fn teleport(&self, member: MemberId, destination: BlockPos) -> Result<(), HostError>;

    /// Changes a player's game mode.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the mode cannot be applied.
    fn set_game_mode(&self, member: MemberId, mode: GameMode) -> Result<(), HostError>;

    /// Deals instantaneous damage.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the damage cannot be applied.
    fn damage(&self, member: MemberId, amount: f64) -> Result<(), HostError>;

    /// Adds to a player's freeze timer.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the timer cannot be changed.
    fn add_freeze_ticks(&self, member: MemberId, ticks: u32) -> Result<(), HostError>;

    /// Applies a timed status condition.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the condition cannot be applied.
    fn apply_condition(
        &self,
        member: MemberId,
        condition: StatusCondition,
        duration_ticks: u32,
        amplifier: u8,
    ) -> Result<(), HostError>;
}
