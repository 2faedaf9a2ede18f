//! One dispatch tick over every engine component.
//!
//! [`Game`] owns the phase machine and the hazard orchestrator and runs
//! them in a fixed order each tick:
//!
//! 1. hazard expiration sweep
//! 2. random hazard trigger attempt
//! 3. [`TickHook`]s (BUILD only)
//! 4. phase advance
//!
//! Hazards are scheduled in every phase; only the hooks are BUILD-gated.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{HazardError, PhaseError};
use crate::hazard::{
    ActiveHazard, DisasterOrchestrator, EffectTable, HazardActivation, HazardKind, HazardSettings,
};
use crate::host::{GameHost, TeamScore};
use crate::observability::EventEmitter;
use crate::persistence::PersistenceGateway;
use crate::phase::{
    MatchPhase, PhaseMachine, PhaseServices, PhaseSettings, PhaseSnapshot, PhaseTransition,
};
use crate::territory::{IslandSeed, TerritoryDirectory};

/// Read-only view handed to tick hooks.
pub struct TickContext<'a> {
    /// Island and team registry
    pub directory: &'a TerritoryDirectory,
    /// Host server
    pub host: &'a dyn GameHost,
    /// Current phase
    pub phase: MatchPhase,
    /// Dispatch instant
    pub now: Instant,
}

/// Per-tick extension point, run only during BUILD.
///
/// Territory boundary enforcement plugs in here.
pub trait TickHook: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Runs once per BUILD tick, after hazards and before the phase advances.
    fn on_tick(&mut self, ctx: &TickContext<'_>);
}

/// Everything one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Hazards removed by the sweep
    pub expired: Vec<(String, HazardKind)>,
    /// Hazard started by the random schedule
    pub triggered: Option<HazardActivation>,
    /// Whether the BUILD hooks ran
    pub hooks_ran: bool,
    /// Phase transition applied
    pub transition: Option<PhaseTransition>,
}

/// Point-in-time view of the whole match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    /// Phase machine state
    pub phase: PhaseSnapshot,
    /// Active hazards with remaining time
    pub active_hazards: Vec<ActiveHazard>,
    /// Teams by points
    pub standings: Vec<TeamScore>,
    /// Ticks dispatched so far
    pub ticks: u64,
}

/// Static configuration for a [`Game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Timeline parameters
    pub phases: PhaseSettings,
    /// Hazard scheduling parameters
    pub hazards: HazardSettings,
    /// Territory and spawn seeds applied at boot
    pub seeds: Vec<IslandSeed>,
}

/// External collaborators for a [`Game`].
#[derive(Clone)]
pub struct GameServices {
    /// Host server
    pub host: Arc<dyn GameHost>,
    /// Document store
    pub store: Arc<dyn PersistenceGateway>,
    /// Event stream
    pub events: Arc<EventEmitter>,
}

/// The match engine.
pub struct Game {
    directory: Arc<TerritoryDirectory>,
    host: Arc<dyn GameHost>,
    orchestrator: DisasterOrchestrator,
    phase: PhaseMachine,
    hooks: Vec<Box<dyn TickHook>>,
    seeds: Vec<IslandSeed>,
    ticks: u64,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("orchestrator", &self.orchestrator)
            .field("hooks", &self.hooks.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Wires up a game with the standard effect table.
    ///
    /// Call [`boot`](Self::boot) before the first tick.
    #[must_use]
    pub fn new(settings: GameSettings, services: GameServices) -> Self {
        let directory = Arc::new(TerritoryDirectory::new(Arc::clone(&services.store)));
        let orchestrator = DisasterOrchestrator::new(
            Arc::clone(&directory),
            Arc::clone(&services.host),
            Arc::clone(&services.events),
            EffectTable::standard(),
            settings.hazards,
        );
        let phase = PhaseMachine::new(
            settings.phases,
            PhaseServices {
                host: Arc::clone(&services.host),
                directory: Arc::clone(&directory),
                store: services.store,
                events: services.events,
            },
        );
        Self {
            directory,
            host: services.host,
            orchestrator,
            phase,
            hooks: Vec::new(),
            seeds: settings.seeds,
            ticks: 0,
        }
    }

    /// Loads persisted state, bootstraps islands and teams, and saves the
    /// result.
    ///
    /// A stored phase is restored silently; without one the match stays in
    /// LOBBY.
    pub fn boot(&mut self) {
        self.directory.load();
        self.directory.bootstrap(&self.seeds);
        self.directory.save();
        let resumed = self.phase.load();
        info!(
            phase = %self.phase.phase(),
            resumed = resumed.is_some(),
            "match engine ready"
        );
    }

    /// Registers a BUILD-phase hook.
    pub fn add_hook(&mut self, hook: Box<dyn TickHook>) {
        debug!(hook = hook.name(), "tick hook registered");
        self.hooks.push(hook);
    }

    /// Runs one dispatch tick at `now`.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.ticks += 1;

        let expired = self.orchestrator.sweep_expired(now);
        let triggered = self.orchestrator.advance_schedule(now);

        let hooks_ran = self.phase.phase() == MatchPhase::Build && !self.hooks.is_empty();
        if hooks_ran {
            let ctx = TickContext {
                directory: &self.directory,
                host: self.host.as_ref(),
                phase: MatchPhase::Build,
                now,
            };
            for hook in &mut self.hooks {
                hook.on_tick(&ctx);
            }
        }

        let transition = self.phase.tick();

        TickReport {
            expired,
            triggered,
            hooks_ran,
            transition,
        }
    }

    // ========================================================================
    // Admin commands
    // ========================================================================

    /// Starts `kind` (by name) on `island`.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::UnknownKind`] for an unparseable name, or any
    /// trigger rejection.
    pub fn trigger_disaster(
        &mut self,
        island: &str,
        kind: &str,
        now: Instant,
    ) -> Result<HazardActivation, HazardError> {
        let kind = HazardKind::from_name(kind)?;
        self.orchestrator.trigger(island, kind, now)
    }

    /// Cancels every active hazard on `island`.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::IslandNotFound`] or [`HazardError::NotActive`].
    pub fn cancel_disaster(&mut self, island: &str) -> Result<Vec<HazardKind>, HazardError> {
        self.orchestrator.cancel(island)
    }

    /// Forces the phase named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::UnknownPhase`] for an unknown name.
    pub fn set_phase(&mut self, name: &str) -> Result<PhaseTransition, PhaseError> {
        self.phase.set_phase_by_name(name)
    }

    /// Starts the countdown. See [`PhaseMachine::start_countdown`].
    pub fn start_countdown(&mut self) -> bool {
        self.phase.start_countdown()
    }

    /// Stops the countdown. See [`PhaseMachine::cancel_countdown`].
    pub fn cancel_countdown(&mut self) -> bool {
        self.phase.cancel_countdown()
    }

    /// Saves every document.
    pub fn shutdown(&self) {
        let directory = self.directory.save();
        let phase = self.phase.persist();
        info!(saved = directory && phase, ticks = self.ticks, "match engine stopped");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns a point-in-time view at `now`.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase.snapshot(),
            active_hazards: self.orchestrator.active(now),
            standings: self.directory.standings(),
            ticks: self.ticks,
        }
    }

    /// Returns the shared island and team registry.
    #[must_use]
    pub const fn directory(&self) -> &Arc<TerritoryDirectory> {
        &self.directory
    }

    /// Returns the phase machine.
    #[must_use]
    pub const fn phase(&self) -> &PhaseMachine {
        &self.phase
    }

    /// Returns the phase machine mutably.
    pub const fn phase_mut(&mut self) -> &mut PhaseMachine {
        &mut self.phase
    }

    /// Returns the hazard orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &DisasterOrchestrator {
        &self.orchestrator
    }

    /// Returns the hazard orchestrator mutably.
    pub const fn orchestrator_mut(&mut self) -> &mut DisasterOrchestrator {
        &mut self.orchestrator
    }

    /// Returns the number of ticks dispatched.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}
