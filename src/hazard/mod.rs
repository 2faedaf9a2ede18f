//! Environmental hazards
//!
//! - [`kind`]: hazard kinds and per-island eligibility
//! - [`effect`]: effect strategies and the dispatch table
//! - [`registry`]: active hazards keyed by island and kind
//! - [`orchestrator`]: random scheduling, trigger, expiry, and cancellation

pub mod effect;
pub mod kind;
pub mod orchestrator;
pub mod registry;

pub use effect::{EffectTable, Freeze, HazardEffect, InstantDamage, TimedCondition};
pub use kind::{HazardKind, eligible_hazards};
pub use orchestrator::{DisasterOrchestrator, HazardActivation, HazardSettings, TriggerSource};
pub use registry::{ActiveHazard, ActiveHazards};
