//! `status` command
//!
//! Reads the persisted documents and prints the phase and team standings
//! without booting the engine.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::error::IslandClashError;
use crate::persistence::{self, JsonFileStore, PHASE_STATE_KEY, PhaseRecord};
use crate::phase::MatchPhase;
use crate::territory::TerritoryDirectory;

/// Persisted match state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Stored phase, LOBBY if none
    pub phase: MatchPhase,
    /// Ticks spent in the stored phase
    pub elapsed_ticks: u64,
    /// Teams by points
    pub teams: Vec<TeamStatus>,
}

/// One row of the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStatus {
    /// Team name
    pub team: String,
    /// Points
    pub points: u64,
    /// Member count
    pub members: usize,
    /// Linked island
    #[serde(skip_serializing_if = "Option::is_none")]
    pub island: Option<String>,
}

/// Builds the report from the documents in `store`.
///
/// Missing documents read as an empty LOBBY match.
#[must_use]
pub fn collect(store: Arc<JsonFileStore>) -> StatusReport {
    let record =
        persistence::load_document::<PhaseRecord>(store.as_ref(), PHASE_STATE_KEY).unwrap_or(
            PhaseRecord {
                phase: MatchPhase::Lobby,
                elapsed_ticks: 0,
            },
        );

    let directory = TerritoryDirectory::new(store);
    directory.load();

    let teams = directory
        .standings()
        .into_iter()
        .filter_map(|score| directory.team(&score.team))
        .map(|team| TeamStatus {
            members: team.members.len(),
            points: team.points,
            island: team.island,
            team: team.name,
        })
        .collect();

    StatusReport {
        phase: record.phase,
        elapsed_ticks: record.elapsed_ticks,
        teams,
    }
}

/// Print the persisted state.
///
/// # Errors
///
/// Returns a JSON error if the report cannot be serialized.
pub fn run(args: &StatusArgs) -> Result<(), IslandClashError> {
    let report = collect(Arc::new(JsonFileStore::new(args.data_dir.clone())));

    match args.format {
        OutputFormat::Human => {
            println!(
                "phase: {} ({} ticks elapsed)",
                report.phase, report.elapsed_ticks
            );
            if report.teams.is_empty() {
                println!("no teams stored");
            }
            for (rank, team) in report.teams.iter().enumerate() {
                println!(
                    "{:>2}. {:<8} {:>6} pts  {} members",
                    rank + 1,
                    team.team,
                    team.points,
                    team.members
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
