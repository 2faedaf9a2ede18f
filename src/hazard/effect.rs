//! Hazard effect strategies.
//!
//! Each strategy performs exactly one host mutation on one participant.
//! The [`EffectTable`] maps hazard kinds to strategies and can be
//! extended with [`EffectTable::register`].

use std::collections::HashMap;

use crate::error::HostError;
use crate::host::{GameHost, Participant, StatusCondition};

use super::kind::HazardKind;

/// One idempotent mutation applied to a participant caught by a hazard.
pub trait HazardEffect: Send + Sync {
    /// Applies the effect to `target`.
    ///
    /// # Errors
    ///
    /// Returns the host's error if the mutation could not be applied.
    fn apply(&self, host: &dyn GameHost, target: &Participant) -> Result<(), HostError>;
}

/// Instantaneous damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstantDamage {
    /// Damage amount
    pub amount: f64,
}

impl HazardEffect for InstantDamage {
    fn apply(&self, host: &dyn GameHost, target: &Participant) -> Result<(), HostError> {
        host.damage(target.id, self.amount)
    }
}

/// Timed status condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedCondition {
    /// Condition to apply
    pub condition: StatusCondition,
    /// Duration in ticks
    pub duration_ticks: u32,
    /// Strength, zero-based
    pub amplifier: u8,
}

impl HazardEffect for TimedCondition {
    fn apply(&self, host: &dyn GameHost, target: &Participant) -> Result<(), HostError> {
        host.apply_condition(target.id, self.condition, self.duration_ticks, self.amplifier)
    }
}

/// Freeze-timer increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freeze {
    /// Ticks added to the freeze timer
    pub ticks: u32,
}

impl HazardEffect for Freeze {
    fn apply(&self, host: &dyn GameHost, target: &Participant) -> Result<(), HostError> {
        host.add_freeze_ticks(target.id, self.ticks)
    }
}

const fn condition(condition: StatusCondition, duration_ticks: u32, amplifier: u8) -> TimedCondition {
    TimedCondition {
        condition,
        duration_ticks,
        amplifier,
    }
}

/// Dispatch table from hazard kind to effect strategy.
#[derive(Default)]
pub struct EffectTable {
    effects: HashMap<HazardKind, Box<dyn HazardEffect>>,
}

impl std::fmt::Debug for EffectTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.effects.keys().copied().collect();
        kinds.sort();
        f.debug_struct("EffectTable").field("kinds", &kinds).finish()
    }
}

impl EffectTable {
    /// Creates a table with no strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table with the standard strategy for every hazard kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(HazardKind::MeteorShower, InstantDamage { amount: 6.0 });
        table.register(
            HazardKind::Wildfire,
            condition(StatusCondition::Burning, 100, 0),
        );
        table.register(
            HazardKind::Tsunami,
            condition(StatusCondition::Slowness, 200, 1),
        );
        table.register(
            HazardKind::Whirlpool,
            condition(StatusCondition::Nausea, 160, 0),
        );
        table.register(HazardKind::Earthquake, InstantDamage { amount: 4.0 });
        table.register(
            HazardKind::Landslide,
            condition(StatusCondition::Slowness, 120, 2),
        );
        table.register(HazardKind::LightningStorm, InstantDamage { amount: 8.0 });
        table.register(
            HazardKind::Tornado,
            condition(StatusCondition::Levitation, 60, 0),
        );
        table.register(HazardKind::Blizzard, Freeze { ticks: 140 });
        table.register(HazardKind::Avalanche, Freeze { ticks: 80 });
        table
    }

    /// Installs or replaces the strategy for `kind`.
    pub fn register(&mut self, kind: HazardKind, effect: impl HazardEffect + 'static) {
        self.effects.insert(kind, Box::new(effect));
    }

    /// Removes the strategy for `kind`, returning whether one was present.
    pub fn unregister(&mut self, kind: HazardKind) -> bool {
        self.effects.remove(&kind).is_some()
    }

    /// Returns the strategy for `kind`.
    #[must_use]
    pub fn get(&self, kind: HazardKind) -> Option<&dyn HazardEffect> {
        self.effects.get(&kind).map(AsRef::as_ref)
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
