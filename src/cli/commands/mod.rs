//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod run;
pub mod status;
pub mod validate;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::IslandClashError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), IslandClashError> {
    match cli.command {
        Commands::Run(args) => run::run(&args).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Status(args) => status::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
