//! Match phase timeline
//!
//! LOBBY → (countdown) → BUILD → PVP → ENDED, with manual override to any
//! phase and silent restoration from storage.

pub mod machine;
pub mod progress;
pub mod state;

pub use machine::{PhaseMachine, PhaseServices, PhaseSettings};
pub use state::{MatchPhase, PhaseSnapshot, PhaseTransition, TransitionCause};
