//! Shared integration-test harness: an engine wired to a recording host
//! and an in-memory store, plus helpers for spawning the binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use islandclash::game::{Game, GameServices, GameSettings};
use islandclash::hazard::HazardSettings;
use islandclash::host::{Participant, RecordingHost};
use islandclash::observability::EventEmitter;
use islandclash::persistence::{MemoryStore, PersistenceGateway};
use islandclash::phase::PhaseSettings;
use islandclash::territory::{ElementKind, IslandSeed};
use islandclash::zone::{BlockPos, Position, Zone};
use uuid::Uuid;

/// Ticks per second used by the harness timeline.
pub const TICK_RATE_HZ: u32 = 10;

/// A booted engine with its collaborators exposed.
pub struct TestMatch {
    pub host: Arc<RecordingHost>,
    pub store: Arc<dyn PersistenceGateway>,
    pub game: Game,
}

impl TestMatch {
    /// Boots a match over a fresh in-memory store.
    pub fn new(settings: GameSettings) -> Self {
        Self::with_store(settings, Arc::new(MemoryStore::new()))
    }

    /// Boots a match over an existing store.
    pub fn with_store(settings: GameSettings, store: Arc<dyn PersistenceGateway>) -> Self {
        let host = Arc::new(RecordingHost::new());
        let mut game = Game::new(
            settings,
            GameServices {
                host: host.clone(),
                store: Arc::clone(&store),
                events: Arc::new(EventEmitter::noop()),
            },
        );
        game.boot();
        Self { host, store, game }
    }

    /// Runs `n` ticks, all at the same instant.
    pub fn ticks(&mut self, n: u64) {
        let now = tokio::time::Instant::now();
        for _ in 0..n {
            self.game.tick(now);
        }
    }
}

/// Short timeline: 1s countdown, 2s build, 2s pvp at 10 Hz. Random hazards
/// are effectively off.
pub fn short_settings() -> GameSettings {
    GameSettings {
        phases: PhaseSettings {
            tick_rate_hz: TICK_RATE_HZ,
            countdown: Duration::from_secs(1),
            build: Duration::from_secs(2),
            pvp: Duration::from_secs(2),
            heartbeat: Duration::from_secs(1),
            label_refresh: Duration::from_secs(1),
        },
        hazards: HazardSettings {
            interval_ticks: u64::MAX,
            cooldown: Duration::from_secs(30),
            seed: Some(11),
        },
        seeds: all_island_seeds(),
    }
}

/// A 21x21 territory per island, laid out 100 blocks apart along x, with a
/// spawn at its center.
pub fn all_island_seeds() -> Vec<IslandSeed> {
    ElementKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let offset = i32::try_from(i).unwrap_or(0) * 100;
            IslandSeed {
                kind,
                territory: Some(
                    Zone::rectangle(BlockPos::new(offset, 64, 0), BlockPos::new(offset + 20, 64, 20))
                        .unwrap(),
                ),
                spawn: Some(spawn_of(kind)),
            }
        })
        .collect()
}

/// Spawn point used by [`all_island_seeds`].
pub fn spawn_of(kind: ElementKind) -> BlockPos {
    let index = ElementKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
    BlockPos::new(i32::try_from(index).unwrap_or(0) * 100 + 10, 65, 10)
}

/// A participant standing at `pos`.
pub fn participant(name: &str, pos: BlockPos) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        name: name.to_string(),
        position: Position::from(pos),
    }
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the binary to completion with `args`.
pub fn spawn_command(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_islandclash"))
        .args(args)
        .output()
        .expect("failed to run islandclash")
}
