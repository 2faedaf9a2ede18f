//! Configuration schema types.
//!
//! Every section is optional and falls back to its defaults. Durations are
//! written as humantime strings (`"30m"`, `"1m 30s"`).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::game::GameSettings;
use crate::hazard::HazardSettings;
use crate::phase::PhaseSettings;
use crate::phase::progress::duration_to_ticks;
use crate::territory::{ElementKind, IslandSeed};
use crate::zone::{BlockPos, Vertex, Zone};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of a match configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MatchConfig {
    /// Dispatch loop settings
    #[serde(default)]
    pub tick: TickConfig,

    /// Phase timeline
    #[serde(default)]
    pub phases: PhasesConfig,

    /// Random hazard scheduling
    #[serde(default)]
    pub hazards: HazardsConfig,

    /// Document store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Territory and spawn seeds, applied only where nothing is stored
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub islands: Vec<IslandConfig>,
}

impl MatchConfig {
    /// Converts the configuration into engine settings.
    ///
    /// # Errors
    ///
    /// Returns the first [`ZoneError`] among the island territories. The
    /// validator reports all of them before this is reached.
    pub fn game_settings(&self) -> Result<GameSettings, ZoneError> {
        let seeds = self
            .islands
            .iter()
            .map(IslandConfig::to_seed)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GameSettings {
            phases: self.phase_settings(),
            hazards: self.hazard_settings(),
            seeds,
        })
    }

    /// Phase machine parameters.
    #[must_use]
    pub const fn phase_settings(&self) -> PhaseSettings {
        PhaseSettings {
            tick_rate_hz: self.tick.rate_hz,
            countdown: self.phases.countdown,
            build: self.phases.build,
            pvp: self.phases.pvp,
            heartbeat: self.phases.heartbeat,
            label_refresh: self.phases.label_refresh,
        }
    }

    /// Hazard orchestrator parameters, with the interval in ticks.
    #[must_use]
    pub fn hazard_settings(&self) -> HazardSettings {
        HazardSettings {
            interval_ticks: duration_to_ticks(self.hazards.interval, self.tick.rate_hz),
            cooldown: self.hazards.cooldown,
            seed: self.hazards.seed,
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Dispatch loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Ticks per second (1..=100)
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

const fn default_rate_hz() -> u32 {
    20
}

/// Phase timeline durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasesConfig {
    /// Pre-build countdown
    #[serde(with = "humantime_duration")]
    pub countdown: Duration,

    /// BUILD phase length
    #[serde(with = "humantime_duration")]
    pub build: Duration,

    /// PVP phase length
    #[serde(with = "humantime_duration")]
    pub pvp: Duration,

    /// Interval between `phase-state` saves in timed phases
    #[serde(with = "humantime_duration")]
    pub heartbeat: Duration,

    /// Interval between label rewrites
    #[serde(with = "humantime_duration")]
    pub label_refresh: Duration,
}

impl Default for PhasesConfig {
    fn default() -> Self {
        let defaults = PhaseSettings::default();
        Self {
            countdown: defaults.countdown,
            build: defaults.build,
            pvp: defaults.pvp,
            heartbeat: defaults.heartbeat,
            label_refresh: defaults.label_refresh,
        }
    }
}

/// Random hazard scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardsConfig {
    /// Time between random trigger attempts
    #[serde(with = "humantime_duration")]
    pub interval: Duration,

    /// How long a hazard stays active
    #[serde(with = "humantime_duration")]
    pub cooldown: Duration,

    /// Fixed RNG seed for reproducible matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for HazardsConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            cooldown: Duration::from_secs(120),
            seed: None,
        }
    }
}

/// Document store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `<key>.json` documents
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data")
}

// ============================================================================
// Islands
// ============================================================================

/// Seed for one island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandConfig {
    /// Which island
    pub kind: ElementKind,

    /// Territory polygon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<TerritoryConfig>,

    /// Team spawn point; one below elevation zero means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<BlockPos>,
}

impl IslandConfig {
    /// Builds the bootstrap seed.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the territory is not a valid zone.
    pub fn to_seed(&self) -> Result<IslandSeed, ZoneError> {
        Ok(IslandSeed {
            kind: self.kind,
            territory: self.territory.as_ref().map(TerritoryConfig::to_zone).transpose()?,
            spawn: self.spawn.filter(|spawn| spawn.y >= 0),
        })
    }
}

/// Territory polygon, given either as two rectangle corners or as explicit
/// vertices.
///
/// Corners derive the vertical bound from their elevation unless `min_y`
/// or `max_y` override it. Explicit vertices without bounds cover every
/// elevation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryConfig {
    /// Opposite rectangle corners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corners: Option<[BlockPos; 2]>,

    /// Polygon vertices in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Vertex>>,

    /// Lowest covered elevation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_y: Option<i32>,

    /// Highest covered elevation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_y: Option<i32>,
}

impl TerritoryConfig {
    /// Builds the zone.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] for an invalid polygon or bound, or
    /// [`ZoneError::TooFewVertices`] when no shape is given.
    pub fn to_zone(&self) -> Result<Zone, ZoneError> {
        match (&self.corners, &self.vertices) {
            (Some([first, second]), _) => {
                let rect = Zone::rectangle(*first, *second)?;
                if self.min_y.is_none() && self.max_y.is_none() {
                    return Ok(rect);
                }
                Zone::new(
                    rect.vertices().to_vec(),
                    self.min_y.unwrap_or(rect.min_y()),
                    self.max_y.unwrap_or(rect.max_y()),
                )
            }
            (None, Some(vertices)) => Zone::new(
                vertices.clone(),
                self.min_y.unwrap_or(i32::MIN),
                self.max_y.unwrap_or(i32::MAX),
            ),
            (None, None) => Err(ZoneError::TooFewVertices { count: 0 }),
        }
    }
}

// ============================================================================
// Duration (de)serialization
// ============================================================================

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
