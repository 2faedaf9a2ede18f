//! Configuration module
//!
//! Loads and validates match configuration files: tick rate, phase
//! timeline, hazard scheduling, storage location and island seeds.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
