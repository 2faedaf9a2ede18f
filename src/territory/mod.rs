//! Islands, teams, and their territories
//!
//! - [`model`]: island, team, and elemental kind records
//! - [`directory`]: concurrent registry with bootstrap and persistence

pub mod directory;
pub mod model;

pub use directory::TerritoryDirectory;
pub use model::{ElementKind, Island, IslandSeed, Team};
