//! Match phase representation.

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;

/// One stage of the match timeline.
///
/// The countdown is a sub-state tracked by the machine, not a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchPhase {
    /// Waiting for the match to start
    #[default]
    Lobby,
    /// Teams build on their islands; combat is off
    Build,
    /// Teams fight; combat is on
    Pvp,
    /// Match over; soft-terminal
    Ended,
}

impl MatchPhase {
    /// Every phase, in timeline order.
    pub const ALL: [Self; 4] = [Self::Lobby, Self::Build, Self::Pvp, Self::Ended];

    /// Returns the lowercase phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Build => "build",
            Self::Pvp => "pvp",
            Self::Ended => "ended",
        }
    }

    /// Parses a phase name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::UnknownPhase`] for any other name.
    pub fn from_name(name: &str) -> Result<Self, PhaseError> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| PhaseError::UnknownPhase(name.to_string()))
    }

    /// Returns the phase that follows when this one's timer runs out.
    #[must_use]
    pub const fn next_timed(self) -> Option<Self> {
        match self {
            Self::Build => Some(Self::Pvp),
            Self::Pvp => Some(Self::Ended),
            Self::Lobby | Self::Ended => None,
        }
    }

    /// Returns `true` for phases driven by a duration timer.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        matches!(self, Self::Build | Self::Pvp)
    }

    /// Returns the value used for the current-phase gauge and ordering.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Lobby => 0,
            Self::Build => 1,
            Self::Pvp => 2,
            Self::Ended => 3,
        }
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::Build => "BUILD",
            Self::Pvp => "PVP",
            Self::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for MatchPhase {
    type Err = PhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// What caused a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// The pre-build countdown ran out
    Countdown,
    /// The phase duration elapsed
    Timer,
    /// An admin forced the phase
    Manual,
}

/// Record of one applied phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase that was left
    pub from: MatchPhase,
    /// Phase that was entered
    pub to: MatchPhase,
    /// Why it happened
    pub cause: TransitionCause,
}

/// Point-in-time view of the machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSnapshot {
    /// Current phase
    pub phase: MatchPhase,
    /// Ticks spent in the current phase
    pub elapsed_ticks: u64,
    /// Ticks left on the countdown, if one is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_remaining_ticks: Option<u64>,
    /// Remaining share of the current timer
    pub progress: f32,
    /// Current progress label
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(MatchPhase::from_name("pvp"), Ok(MatchPhase::Pvp));
        assert_eq!(MatchPhase::from_name(" BUILD "), Ok(MatchPhase::Build));
        assert_eq!(
            MatchPhase::from_name("overtime"),
            Err(PhaseError::UnknownPhase("overtime".to_string()))
        );
    }

    #[test]
    fn test_timed_successors() {
        assert_eq!(MatchPhase::Build.next_timed(), Some(MatchPhase::Pvp));
        assert_eq!(MatchPhase::Pvp.next_timed(), Some(MatchPhase::Ended));
        assert_eq!(MatchPhase::Lobby.next_timed(), None);
        assert_eq!(MatchPhase::Ended.next_timed(), None);
    }

    #[test]
    fn test_serde_uses_uppercase() {
        assert_eq!(serde_json::to_value(MatchPhase::Pvp).unwrap(), "PVP");
        let phase: MatchPhase = serde_json::from_value("ENDED".into()).unwrap();
        assert_eq!(phase, MatchPhase::Ended);
        assert_eq!(MatchPhase::Lobby.to_string(), "LOBBY");
    }
}
