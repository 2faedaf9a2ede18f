//! `islandclash` - territory, phase and hazard engine for five-team island
//! matches
//!
//! The engine keeps a registry of five elemental islands and their teams,
//! drives a LOBBY → BUILD → PVP → ENDED timeline, and strikes islands with
//! element-themed hazards. A host server is reached through the
//! [`host::GameHost`] trait and state is saved through
//! [`persistence::PersistenceGateway`].

pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod hazard;
pub mod host;
pub mod observability;
pub mod persistence;
pub mod phase;
pub mod territory;
pub mod zone;
