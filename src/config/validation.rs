//! Configuration validation
//!
//! Runs on the deserialized [`MatchConfig`] and collects every issue rather
//! than stopping at the first, so a single `validate` run reports all of
//! them.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::schema::{IslandConfig, MatchConfig};
use crate::error::{Severity, ValidationIssue};

/// Highest accepted dispatch rate.
pub const MAX_TICK_RATE_HZ: u32 = 100;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &MatchConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_tick(config);
        self.validate_phases(config);
        self.validate_hazards(config);
        self.validate_storage(config);
        self.validate_islands(&config.islands);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_tick(&mut self, config: &MatchConfig) {
        let rate = config.tick.rate_hz;
        if rate == 0 || rate > MAX_TICK_RATE_HZ {
            self.add_error(
                "tick.rate_hz",
                &format!("Tick rate must be between 1 and {MAX_TICK_RATE_HZ}, got {rate}"),
            );
        }
    }

    fn validate_phases(&mut self, config: &MatchConfig) {
        let phases = &config.phases;
        for (path, value) in [
            ("phases.build", phases.build),
            ("phases.pvp", phases.pvp),
            ("phases.heartbeat", phases.heartbeat),
            ("phases.label_refresh", phases.label_refresh),
        ] {
            if value.is_zero() {
                self.add_error(path, "Duration must be greater than zero");
            }
        }

        let period = tick_period(config.tick.rate_hz);
        if !phases.heartbeat.is_zero() && phases.heartbeat < period {
            self.add_warning(
                "phases.heartbeat",
                "Heartbeat is shorter than one tick and will fire every tick",
            );
        }
    }

    fn validate_hazards(&mut self, config: &MatchConfig) {
        let hazards = &config.hazards;
        if hazards.cooldown.is_zero() {
            self.add_error("hazards.cooldown", "Cooldown must be greater than zero");
        }

        if hazards.interval < tick_period(config.tick.rate_hz) {
            self.add_warning(
                "hazards.interval",
                "Interval is shorter than one tick; a trigger is attempted every tick",
            );
        }

        if hazards.cooldown > hazards.interval {
            self.add_warning(
                "hazards.cooldown",
                &format!(
                    "Cooldown ({}) is longer than the trigger interval ({}); hazards will overlap",
                    humantime::format_duration(hazards.cooldown),
                    humantime::format_duration(hazards.interval)
                ),
            );
        }
    }

    fn validate_storage(&mut self, config: &MatchConfig) {
        if config.storage.dir.as_os_str().is_empty() {
            self.add_error("storage.dir", "Storage directory cannot be empty");
        }
    }

    fn validate_islands(&mut self, islands: &[IslandConfig]) {
        let mut seen = HashSet::new();
        for (i, island) in islands.iter().enumerate() {
            let path = format!("islands[{i}]");
            if !seen.insert(island.kind) {
                self.add_error(
                    &format!("{path}.kind"),
                    &format!("Duplicate island '{}'", island.kind),
                );
            }
            self.validate_island(&path, island);
        }
    }

    fn validate_island(&mut self, path: &str, island: &IslandConfig) {
        let Some(territory) = &island.territory else {
            return;
        };
        let territory_path = format!("{path}.territory");

        match (&territory.corners, &territory.vertices) {
            (Some(_), Some(_)) => {
                self.add_error(
                    &territory_path,
                    "Territory cannot have both 'corners' and 'vertices'",
                );
                return;
            }
            (None, None) => {
                self.add_error(
                    &territory_path,
                    "Territory needs either 'corners' or 'vertices'",
                );
                return;
            }
            _ => {}
        }

        match territory.to_zone() {
            Ok(zone) => {
                if let Some(spawn) = island.spawn
                    && !zone.contains(spawn)
                {
                    self.add_warning(
                        &format!("{path}.spawn"),
                        &format!("Spawn {spawn} lies outside the island territory"),
                    );
                }
            }
            Err(e) => self.add_error(&territory_path, &e.to_string()),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

fn tick_period(rate_hz: u32) -> Duration {
    Duration::from_secs(1) / rate_hz.max(1)
}
