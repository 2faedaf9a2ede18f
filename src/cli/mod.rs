//! Command-line interface
//!
//! Argument parsing and command handlers for the `islandclash` binary.

pub mod args;
pub mod commands;
