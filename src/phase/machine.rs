//! Match phase state machine.
//!
//! The [`PhaseMachine`] owns the phase, the in-phase tick counter, and the
//! optional countdown. It advances on [`tick`](PhaseMachine::tick), applies
//! entry side effects exactly once per transition, and persists its state
//! on every transition plus a periodic heartbeat in timed phases.
//!
//! [`restore_state`](PhaseMachine::restore_state) is the only way to set
//! state without side effects and is used when resuming from storage.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::PhaseError;
use crate::host::{GameHost, GameMode};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::persistence::{self, PHASE_STATE_KEY, PersistenceGateway, PhaseRecord};
use crate::territory::TerritoryDirectory;

use super::progress::{duration_to_ticks, phase_label, remaining_fraction, ticks_to_duration};
use super::state::{MatchPhase, PhaseSnapshot, PhaseTransition, TransitionCause};

/// Countdown seconds announced individually.
const FINAL_SECONDS: u64 = 5;

/// Timeline parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSettings {
    /// Dispatch ticks per second
    pub tick_rate_hz: u32,
    /// Pre-build countdown length
    pub countdown: Duration,
    /// BUILD phase length
    pub build: Duration,
    /// PVP phase length
    pub pvp: Duration,
    /// Interval between progress saves in timed phases
    pub heartbeat: Duration,
    /// Interval between label refreshes
    pub label_refresh: Duration,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            countdown: Duration::from_secs(10),
            build: Duration::from_secs(30 * 60),
            pvp: Duration::from_secs(15 * 60),
            heartbeat: Duration::from_secs(30),
            label_refresh: Duration::from_secs(60),
        }
    }
}

/// Collaborators the machine drives on transitions.
#[derive(Clone)]
pub struct PhaseServices {
    /// Host server
    pub host: Arc<dyn GameHost>,
    /// Team and island registry
    pub directory: Arc<TerritoryDirectory>,
    /// Document store for `phase-state`
    pub store: Arc<dyn PersistenceGateway>,
    /// Event stream
    pub events: Arc<EventEmitter>,
}

/// The match timeline.
pub struct PhaseMachine {
    tick_rate_hz: u32,
    countdown_ticks: u64,
    build_ticks: u64,
    pvp_ticks: u64,
    heartbeat_ticks: u64,
    label_refresh_ticks: u64,

    phase: MatchPhase,
    elapsed_ticks: u64,
    countdown_remaining: Option<u64>,
    label: String,
    ticks_since_label: u64,
    transitions_total: u64,

    services: PhaseServices,
}

impl std::fmt::Debug for PhaseMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseMachine")
            .field("phase", &self.phase)
            .field("elapsed_ticks", &self.elapsed_ticks)
            .field("countdown_remaining", &self.countdown_remaining)
            .finish_non_exhaustive()
    }
}

impl PhaseMachine {
    /// Creates a machine in LOBBY with no countdown.
    #[must_use]
    pub fn new(settings: PhaseSettings, services: PhaseServices) -> Self {
        let rate = settings.tick_rate_hz.max(1);
        let mut machine = Self {
            tick_rate_hz: rate,
            countdown_ticks: duration_to_ticks(settings.countdown, rate),
            build_ticks: duration_to_ticks(settings.build, rate),
            pvp_ticks: duration_to_ticks(settings.pvp, rate),
            heartbeat_ticks: duration_to_ticks(settings.heartbeat, rate),
            label_refresh_ticks: duration_to_ticks(settings.label_refresh, rate).max(1),
            phase: MatchPhase::Lobby,
            elapsed_ticks: 0,
            countdown_remaining: None,
            label: String::new(),
            ticks_since_label: 0,
            transitions_total: 0,
            services,
        };
        machine.refresh_label();
        machine
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Returns ticks spent in the current phase.
    #[must_use]
    pub const fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// Returns ticks left on the countdown, if one is running.
    #[must_use]
    pub const fn countdown_remaining(&self) -> Option<u64> {
        self.countdown_remaining
    }

    /// Returns `true` while a countdown is running.
    #[must_use]
    pub const fn is_counting_down(&self) -> bool {
        self.countdown_remaining.is_some()
    }

    /// Returns the current progress label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns how many transitions have been applied since creation.
    #[must_use]
    pub const fn transitions_total(&self) -> u64 {
        self.transitions_total
    }

    /// Returns the remaining share of the running timer.
    ///
    /// LOBBY reports a full bar and ENDED an empty one.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if let Some(remaining) = self.countdown_remaining {
            return remaining_fraction(remaining, self.countdown_ticks);
        }
        match self.phase {
            MatchPhase::Lobby => 1.0,
            MatchPhase::Ended => 0.0,
            MatchPhase::Build | MatchPhase::Pvp => {
                let total = self.phase_ticks(self.phase);
                remaining_fraction(total.saturating_sub(self.elapsed_ticks), total)
            }
        }
    }

    /// Returns a point-in-time view.
    #[must_use]
    pub fn snapshot(&self) -> PhaseSnapshot {
        PhaseSnapshot {
            phase: self.phase,
            elapsed_ticks: self.elapsed_ticks,
            countdown_remaining_ticks: self.countdown_remaining,
            progress: self.progress(),
            label: self.label.clone(),
        }
    }

    // ========================================================================
    // Countdown
    // ========================================================================

    /// Starts the pre-build countdown.
    ///
    /// Returns `false` without effect while a countdown is already running
    /// or while BUILD or PVP is in progress.
    pub fn start_countdown(&mut self) -> bool {
        if self.countdown_remaining.is_some() || self.phase.is_timed() {
            return false;
        }
        self.countdown_remaining = Some(self.countdown_ticks);
        let seconds = self.countdown_duration().as_secs();

        self.services
            .host
            .broadcast(&format!("The match starts in {seconds} seconds!"));
        self.services.events.emit(Event::CountdownStarted {
            timestamp: Utc::now(),
            seconds,
        });
        info!(seconds, "countdown started");

        self.refresh_label();
        self.push_progress();
        true
    }

    /// Stops a running countdown. Returns `false` if none was running.
    pub fn cancel_countdown(&mut self) -> bool {
        if self.countdown_remaining.take().is_none() {
            return false;
        }
        self.services.host.broadcast("Countdown cancelled.");
        info!("countdown cancelled");
        self.refresh_label();
        self.push_progress();
        true
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Advances the timeline by one dispatch tick.
    ///
    /// Returns the transition applied on this tick, if any.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        if let Some(remaining) = self.countdown_remaining {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.countdown_remaining = None;
                return Some(self.enter(MatchPhase::Build, TransitionCause::Countdown));
            }
            self.countdown_remaining = Some(remaining);
            self.announce_final_seconds(remaining);
        }

        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);

        if let Some(next) = self.phase.next_timed() {
            if self.elapsed_ticks >= self.phase_ticks(self.phase) {
                return Some(self.enter(next, TransitionCause::Timer));
            }
            if self.heartbeat_ticks > 0 && self.elapsed_ticks % self.heartbeat_ticks == 0 {
                debug!(phase = %self.phase, elapsed = self.elapsed_ticks, "heartbeat save");
                self.persist();
            }
        }

        self.ticks_since_label += 1;
        if self.ticks_since_label >= self.label_refresh_ticks {
            self.refresh_label();
        }
        self.push_progress();
        None
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Forces the machine into `phase`, applying its entry side effects.
    ///
    /// Any running countdown is discarded.
    pub fn transition_to(&mut self, phase: MatchPhase) -> PhaseTransition {
        self.countdown_remaining = None;
        self.enter(phase, TransitionCause::Manual)
    }

    /// Forces the phase named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::UnknownPhase`] and leaves state untouched if the
    /// name matches no phase.
    pub fn set_phase_by_name(&mut self, name: &str) -> Result<PhaseTransition, PhaseError> {
        let phase = MatchPhase::from_name(name)?;
        Ok(self.transition_to(phase))
    }

    /// Sets phase and elapsed ticks without any side effect.
    ///
    /// Nothing is announced, persisted, or sent to the host.
    pub fn restore_state(&mut self, phase: MatchPhase, elapsed_ticks: u64) {
        self.phase = phase;
        self.elapsed_ticks = elapsed_ticks;
        self.countdown_remaining = None;
        metrics::set_current_phase(phase);
        self.refresh_label();
        debug!(%phase, elapsed_ticks, "phase state restored");
    }

    /// Restores state from the `phase-state` document.
    ///
    /// Returns the restored record, or `None` if there was nothing usable
    /// (state is left as is).
    pub fn load(&mut self) -> Option<PhaseRecord> {
        let record: PhaseRecord =
            persistence::load_document(self.services.store.as_ref(), PHASE_STATE_KEY)?;
        self.restore_state(record.phase, record.elapsed_ticks);
        info!(phase = %record.phase, elapsed = record.elapsed_ticks, "phase state loaded");
        Some(record)
    }

    /// Writes the `phase-state` document. Returns whether the write succeeded.
    pub fn persist(&self) -> bool {
        let record = PhaseRecord {
            phase: self.phase,
            elapsed_ticks: self.elapsed_ticks,
        };
        persistence::save_document(self.services.store.as_ref(), PHASE_STATE_KEY, &record)
    }

    fn enter(&mut self, to: MatchPhase, cause: TransitionCause) -> PhaseTransition {
        let from = self.phase;
        self.phase = to;
        self.elapsed_ticks = 0;

        self.apply_entry_effects(to);
        self.persist();

        self.services.host.broadcast(&entry_announcement(to));
        self.transitions_total += 1;
        metrics::record_phase_transition(to);
        metrics::set_current_phase(to);
        self.services.events.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            from,
            to,
            cause,
        });
        info!(%from, %to, ?cause, "phase transition");

        self.refresh_label();
        self.push_progress();

        PhaseTransition { from, to, cause }
    }

    fn apply_entry_effects(&self, phase: MatchPhase) {
        let host = self.services.host.as_ref();
        match phase {
            MatchPhase::Lobby => host.set_combat_enabled(false),
            MatchPhase::Build => {
                self.send_teams_home();
                host.show_scores(&self.services.directory.standings());
                host.set_combat_enabled(false);
            }
            MatchPhase::Pvp => host.set_combat_enabled(true),
            MatchPhase::Ended => {
                host.set_combat_enabled(false);
                self.announce_standings();
            }
        }
    }

    fn send_teams_home(&self) {
        let host = self.services.host.as_ref();
        for team in self.services.directory.teams() {
            let spawn = self
                .services
                .directory
                .island_of_team(&team.name)
                .and_then(|island| island.spawn);
            for member in &team.members {
                if let Some(spawn) = spawn {
                    if let Err(e) = host.teleport(*member, spawn) {
                        warn!(%member, team = %team.name, error = %e, "teleport to spawn failed");
                    }
                }
                if let Err(e) = host.set_game_mode(*member, GameMode::Survival) {
                    warn!(%member, error = %e, "failed to set survival mode");
                }
            }
        }
    }

    fn announce_standings(&self) {
        let host = self.services.host.as_ref();
        let standings = self.services.directory.standings();
        let Some(leader) = standings.first() else {
            return;
        };
        let winners: Vec<_> = standings
            .iter()
            .filter(|s| s.points == leader.points)
            .map(|s| s.team.as_str())
            .collect();
        host.broadcast(&format!(
            "Winner: {} with {} points!",
            winners.join(" & "),
            leader.points
        ));
        for (rank, score) in standings.iter().enumerate() {
            host.broadcast(&format!("{}. {} - {}", rank + 1, score.team, score.points));
        }
    }

    fn announce_final_seconds(&self, remaining: u64) {
        let rate = u64::from(self.tick_rate_hz);
        if remaining % rate != 0 {
            return;
        }
        let seconds = remaining / rate;
        if (1..=FINAL_SECONDS).contains(&seconds) {
            self.services.host.broadcast(&format!("{seconds}..."));
        }
    }

    // ========================================================================
    // Progress
    // ========================================================================

    fn refresh_label(&mut self) {
        let countdown = self
            .countdown_remaining
            .map(|ticks| ticks_to_duration(ticks, self.tick_rate_hz));
        let remaining = self
            .phase_ticks(self.phase)
            .saturating_sub(self.elapsed_ticks);
        self.label = phase_label(
            self.phase,
            countdown,
            ticks_to_duration(remaining, self.tick_rate_hz),
        );
        self.ticks_since_label = 0;
    }

    fn push_progress(&self) {
        self.services
            .host
            .update_progress(self.progress(), &self.label);
    }

    const fn phase_ticks(&self, phase: MatchPhase) -> u64 {
        match phase {
            MatchPhase::Build => self.build_ticks,
            MatchPhase::Pvp => self.pvp_ticks,
            MatchPhase::Lobby | MatchPhase::Ended => 0,
        }
    }

    fn countdown_duration(&self) -> Duration {
        ticks_to_duration(self.countdown_ticks, self.tick_rate_hz)
    }
}

fn entry_announcement(phase: MatchPhase) -> String {
    match phase {
        MatchPhase::Lobby => "Back to the lobby.".to_string(),
        MatchPhase::Build => "The build phase has begun! Fortify your island.".to_string(),
        MatchPhase::Pvp => "PvP is now enabled! Defend your territory.".to_string(),
        MatchPhase::Ended => "The match is over!".to_string(),
    }
}
