//! Match engine and its dispatch task.

pub mod engine;
pub mod handle;
pub mod runner;

pub use engine::{
    Game, GameServices, GameSettings, GameSnapshot, TickContext, TickHook, TickReport,
};
pub use handle::GameHandle;
pub use runner::{Command, GameRunner};
