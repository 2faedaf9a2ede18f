//! Dispatch task.
//!
//! The [`GameRunner`] owns the [`Game`] and is the only place that mutates
//! phase or hazard state. It ticks on a fixed `tokio::time::interval` and
//! serializes admin [`Command`]s between ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{HazardError, PhaseError};
use crate::hazard::{HazardActivation, HazardKind};
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter, RunSummary};
use crate::phase::PhaseTransition;

use super::engine::{Game, GameSnapshot};
use super::handle::GameHandle;

/// Pending admin commands buffered before the sender waits.
const COMMAND_BUFFER: usize = 64;

/// Admin request executed on the dispatch task.
#[derive(Debug)]
pub enum Command {
    /// Start a hazard on an island
    TriggerDisaster {
        /// Island id
        island: String,
        /// Hazard kind
        kind: HazardKind,
        /// Reply channel
        reply: oneshot::Sender<Result<HazardActivation, HazardError>>,
    },
    /// Cancel every hazard on an island
    CancelDisaster {
        /// Island id
        island: String,
        /// Reply channel
        reply: oneshot::Sender<Result<Vec<HazardKind>, HazardError>>,
    },
    /// Force a phase by name
    SetPhase {
        /// Phase name
        name: String,
        /// Reply channel
        reply: oneshot::Sender<Result<PhaseTransition, PhaseError>>,
    },
    /// Start the pre-build countdown
    StartCountdown {
        /// Reply channel
        reply: oneshot::Sender<bool>,
    },
    /// Stop the pre-build countdown
    CancelCountdown {
        /// Reply channel
        reply: oneshot::Sender<bool>,
    },
    /// Capture a snapshot
    Snapshot {
        /// Reply channel
        reply: oneshot::Sender<GameSnapshot>,
    },
}

/// Drives a [`Game`] at a fixed tick rate until cancelled.
pub struct GameRunner {
    game: Game,
    period: Duration,
    tick_rate_hz: u32,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
    events: Arc<EventEmitter>,
}

impl std::fmt::Debug for GameRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRunner")
            .field("game", &self.game)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl GameRunner {
    /// Creates a runner and the handle that feeds it commands.
    ///
    /// The runner stops when `cancel` fires.
    #[must_use]
    pub fn new(
        game: Game,
        tick_rate_hz: u32,
        events: Arc<EventEmitter>,
        cancel: CancellationToken,
    ) -> (Self, GameHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let rate = tick_rate_hz.max(1);
        let handle = GameHandle::new(tx, Arc::clone(game.directory()));
        let runner = Self {
            game,
            period: Duration::from_secs(1) / rate,
            tick_rate_hz: rate,
            commands: rx,
            cancel,
            events,
        };
        (runner, handle)
    }

    /// Runs until cancelled, then saves every document.
    ///
    /// Missed ticks are delayed rather than replayed in a burst.
    pub async fn run(mut self) -> RunSummary {
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.events.emit(Event::MatchStarted {
            timestamp: chrono::Utc::now(),
            phase: self.game.phase().phase(),
            islands: self.game.directory().islands().len(),
            tick_rate_hz: self.tick_rate_hz,
        });
        info!(tick_rate_hz = self.tick_rate_hz, "dispatch loop started");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                Some(command) = self.commands.recv() => self.execute(command),
                _ = interval.tick() => {
                    let began = std::time::Instant::now();
                    self.game.tick(Instant::now());
                    metrics::record_tick_duration(began.elapsed());
                }
            }
        }

        self.game.shutdown();
        self.events.flush();

        RunSummary {
            ticks: self.game.ticks(),
            phase_transitions: self.game.phase().transitions_total(),
            hazards_triggered: self.game.orchestrator().triggered_total(),
            uptime_secs: started.elapsed().as_secs_f64(),
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::TriggerDisaster {
                island,
                kind,
                reply,
            } => {
                let result = self
                    .game
                    .orchestrator_mut()
                    .trigger(&island, kind, Instant::now());
                let _ = reply.send(result);
            }
            Command::CancelDisaster { island, reply } => {
                let _ = reply.send(self.game.cancel_disaster(&island));
            }
            Command::SetPhase { name, reply } => {
                let _ = reply.send(self.game.set_phase(&name));
            }
            Command::StartCountdown { reply } => {
                let _ = reply.send(self.game.start_countdown());
            }
            Command::CancelCountdown { reply } => {
                let _ = reply.send(self.game.cancel_countdown());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.game.snapshot(Instant::now()));
            }
        }
        debug!("admin command executed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::{GameServices, GameSettings};
    use crate::hazard::HazardSettings;
    use crate::host::RecordingHost;
    use crate::persistence::{MemoryStore, PHASE_STATE_KEY};
    use crate::phase::{MatchPhase, PhaseSettings};
    use crate::territory::{ElementKind, IslandSeed};
    use crate::zone::{BlockPos, Zone};

    fn runner(store: Arc<MemoryStore>) -> (GameRunner, GameHandle, CancellationToken) {
        let events = Arc::new(EventEmitter::noop());
        let mut game = Game::new(
            GameSettings {
                phases: PhaseSettings {
                    tick_rate_hz: 20,
                    countdown: Duration::from_secs(1),
                    build: Duration::from_secs(2),
                    pvp: Duration::from_secs(2),
                    heartbeat: Duration::from_secs(1),
                    label_refresh: Duration::from_secs(1),
                },
                hazards: HazardSettings {
                    interval_ticks: 1_000_000,
                    cooldown: Duration::from_secs(3),
                    seed: Some(1),
                },
                seeds: vec![IslandSeed {
                    kind: ElementKind::Water,
                    territory: Some(
                        Zone::rectangle(BlockPos::new(0, 64, 0), BlockPos::new(8, 64, 8))
                            .unwrap(),
                    ),
                    spawn: None,
                }],
            },
            GameServices {
                host: Arc::new(RecordingHost::new()),
                store,
                events: Arc::clone(&events),
            },
        );
        game.boot();
        let cancel = CancellationToken::new();
        let (runner, handle) = GameRunner::new(game, 20, events, cancel.clone());
        (runner, handle, cancel)
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_reaches_build_in_real_time() {
        let (runner, handle, cancel) = runner(Arc::new(MemoryStore::new()));
        let task = tokio::spawn(runner.run());

        assert!(handle.start_countdown().await);
        assert!(!handle.start_countdown().await);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase.phase, MatchPhase::Build);

        cancel.cancel();
        let summary = task.await.unwrap();
        assert_eq!(summary.phase_transitions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hazard_expires_after_cooldown() {
        let (runner, handle, cancel) = runner(Arc::new(MemoryStore::new()));
        let task = tokio::spawn(runner.run());

        assert!(handle.trigger_disaster("water-island", "tsunami").await);
        assert!(!handle.trigger_disaster("water-island", "tsunami").await);

        tokio::time::sleep(Duration::from_millis(3100)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.active_hazards.is_empty());
        assert!(handle.trigger_disaster("water-island", "tsunami").await);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_saves_phase() {
        let store = Arc::new(MemoryStore::new());
        let (runner, handle, cancel) = runner(store.clone());
        let task = tokio::spawn(runner.run());

        handle.set_phase("pvp").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        cancel.cancel();
        task.await.unwrap();

        let saved = store.get(PHASE_STATE_KEY).unwrap();
        assert_eq!(saved["phase"], "PVP");
        assert!(saved["elapsedTicks"].as_u64().unwrap() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_stopped_engine() {
        let (runner, handle, cancel) = runner(Arc::new(MemoryStore::new()));
        let task = tokio::spawn(runner.run());
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(handle.set_phase("pvp").await, Err(PhaseError::EngineStopped));
        assert!(!handle.start_countdown().await);
        assert!(handle.snapshot().await.is_none());
    }
}
