//! In-memory recording host.
//!
//! Records every call in order so tests (and embedders running dry runs)
//! can assert on exactly what the engine asked the server to do.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::HostError;
use crate::zone::BlockPos;

use super::{GameHost, GameMode, MemberId, Participant, StatusCondition, TeamScore};

/// A single recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// Server-wide message
    Broadcast(String),
    /// Message to one player
    Notify(MemberId, String),
    /// Progress display update
    Progress {
        /// Remaining fraction
        fraction: f32,
        /// Display label
        label: String,
    },
    /// Score display refresh
    Scores(Vec<TeamScore>),
    /// Combat rule toggle
    Combat(bool),
    /// Player moved
    Teleport(MemberId, BlockPos),
    /// Game mode change
    GameMode(MemberId, GameMode),
    /// Instant damage
    Damage(MemberId, f64),
    /// Freeze timer increment
    Freeze(MemberId, u32),
    /// Status condition
    Condition {
        /// Target player
        member: MemberId,
        /// Applied condition
        condition: StatusCondition,
        /// Duration in ticks
        duration_ticks: u32,
        /// Strength
        amplifier: u8,
    },
}

/// Host that records calls and serves a configurable participant list.
#[derive(Debug, Default)]
pub struct RecordingHost {
    participants: Mutex<Vec<Participant>>,
    calls: Mutex<Vec<HostCall>>,
    refusing: Mutex<HashSet<MemberId>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingHost {
    /// Creates an empty recording host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the connected participant list.
    pub fn set_participants(&self, participants: Vec<Participant>) {
        *locked(&self.participants) = participants;
    }

    /// Makes every per-player mutation for `member` fail.
    pub fn refuse(&self, member: MemberId) {
        locked(&self.refusing).insert(member);
    }

    /// Returns all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        locked(&self.calls).clone()
    }

    /// Returns recorded broadcast messages.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<String> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HostCall::Broadcast(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns recorded notifications for one player.
    #[must_use]
    pub fn notifications_for(&self, member: MemberId) -> Vec<String> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HostCall::Notify(id, msg) if *id == member => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the most recent progress update.
    #[must_use]
    pub fn last_progress(&self) -> Option<(f32, String)> {
        locked(&self.calls).iter().rev().find_map(|call| match call {
            HostCall::Progress { fraction, label } => Some((*fraction, label.clone())),
            _ => None,
        })
    }

    /// Returns the number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        locked(&self.calls).iter().filter(|c| predicate(c)).count()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        locked(&self.calls).clear();
    }

    fn record(&self, call: HostCall) {
        locked(&self.calls).push(call);
    }

    fn mutate(&self, member: MemberId, call: HostCall) -> Result<(), HostError> {
        if locked(&self.refusing).contains(&member) {
            return Err(HostError::Rejected(format!("{member} refuses mutations")));
        }
        self.record(call);
        Ok(())
    }
}

impl GameHost for RecordingHost {
    fn participants(&self) -> Vec<Participant> {
        locked(&self.participants).clone()
    }

    fn broadcast(&self, message: &str) {
        self.record(HostCall::Broadcast(message.to_string()));
    }

    fn notify(&self, member: MemberId, message: &str) {
        self.record(HostCall::Notify(member, message.to_string()));
    }

    fn update_progress(&self, fraction: f32, label: &str) {
        self.record(HostCall::Progress {
            fraction,
            label: label.to_string(),
        });
    }

    fn show_scores(&self, scores: &[TeamScore]) {
        self.record(HostCall::Scores(scores.to_vec()));
    }

    fn set_combat_enabled(&self, enabled: bool) {
        self.record(HostCall::Combat(enabled));
    }

    fn teleport(&self, member: MemberId, destination: BlockPos) -> Result<(), HostError> {
        self.mutate(member, HostCall::Teleport(member, destination))
    }

    fn set_game_mode(&self, member: MemberId, mode: GameMode) -> Result<(), HostError> {
        self.mutate(member, HostCall::GameMode(member, mode))
    }

    fn damage(&self, member: MemberId, amount: f64) -> Result<(), HostError> {
        self.mutate(member, HostCall::Damage(member, amount))
    }

    fn add_freeze_ticks(&self, member: MemberId, ticks: u32) -> Result<(), HostError> {
        self.mutate(member, HostCall::Freeze(member, ticks))
    }

    fn apply_condition(
        &self,
        member: MemberId,
        condition: StatusCondition,
        duration_ticks: u32,
        amplifier: u8,
    ) -> Result<(), HostError> {
        self.mutate(
            member,
            HostCall::Condition {
                member,
                condition,
                duration_ticks,
                amplifier,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Position;

    #[test]
    fn test_records_in_order() {
        let host = RecordingHost::new();
        host.broadcast("one");
        host.set_combat_enabled(true);
        host.broadcast("two");

        assert_eq!(host.broadcasts(), vec!["one", "two"]);
        assert_eq!(host.calls()[1], HostCall::Combat(true));
    }

    #[test]
    fn test_refused_member_errors_and_is_not_recorded() {
        let host = RecordingHost::new();
        let member = MemberId::new_v4();
        host.refuse(member);

        assert!(host.damage(member, 3.0).is_err());
        assert_eq!(host.count(|c| matches!(c, HostCall::Damage(..))), 0);
    }

    #[test]
    fn test_participants_roundtrip() {
        let host = RecordingHost::new();
        let member = MemberId::new_v4();
        host.set_participants(vec![Participant {
            id: member,
            name: "ember".to_string(),
            position: Position::new(1.0, 64.0, 1.0),
        }]);
        assert_eq!(host.participants().len(), 1);
        assert_eq!(host.participants()[0].id, member);
    }

    #[test]
    fn test_last_progress() {
        let host = RecordingHost::new();
        assert!(host.last_progress().is_none());
        host.update_progress(0.5, "half");
        host.update_progress(0.25, "quarter");
        assert_eq!(host.last_progress(), Some((0.25, "quarter".to_string())));
    }
}
