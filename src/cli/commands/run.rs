//! `run` command
//!
//! Loads the configuration, boots the engine against the file store and
//! drives the dispatch loop until a signal or `--stop-after` ends it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::RunArgs;
use crate::config::ConfigLoader;
use crate::error::{ExitCode, IslandClashError};
use crate::game::{Game, GameRunner, GameServices};
use crate::host::LogHost;
use crate::observability::{Event, EventEmitter, StopReason};
use crate::persistence::JsonFileStore;

/// Run a match until stopped.
///
/// # Errors
///
/// Returns a config error if the configuration does not load, or an I/O
/// error if the events file or metrics listener cannot be opened.
pub async fn run(args: &RunArgs) -> Result<(), IslandClashError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    info!(config = %args.config.display(), "loading configuration");
    let loaded = ConfigLoader::with_defaults().load(&args.config)?;
    for warning in &loaded.warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let mut config = (*loaded.config).clone();
    if let Some(seed) = args.seed {
        config.hazards.seed = Some(seed);
    }
    let settings = config.game_settings()?;
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.dir.clone());

    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::stderr(),
    });

    info!(data_dir = %data_dir.display(), "opening document store");
    let mut game = Game::new(
        settings,
        GameServices {
            host: Arc::new(LogHost::new()),
            store: Arc::new(JsonFileStore::new(data_dir)),
            events: Arc::clone(&events),
        },
    );
    game.boot();

    let cancel = CancellationToken::new();
    let (runner, _handle) =
        GameRunner::new(game, config.tick.rate_hz, Arc::clone(&events), cancel.clone());
    let task = tokio::spawn(runner.run());

    let reason = tokio::select! {
        reason = shutdown_signal() => reason,
        () = stop_after(args.stop_after) => StopReason::Shutdown,
    };
    info!(?reason, "stopping match");
    cancel.cancel();
    if reason != StopReason::Shutdown {
        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        tokio::spawn(async {
            let code = match shutdown_signal().await {
                StopReason::Terminated => ExitCode::TERMINATED,
                _ => ExitCode::INTERRUPTED,
            };
            std::process::exit(code);
        });
    }

    let summary = task.await.map_err(std::io::Error::other)?;
    info!(%summary, "match stopped");
    events.emit(Event::MatchStopped {
        timestamp: chrono::Utc::now(),
        reason,
        summary: Some(summary),
    });
    events.flush();
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() -> StopReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            return tokio::select! {
                _ = tokio::signal::ctrl_c() => StopReason::Interrupted,
                _ = sigterm.recv() => StopReason::Terminated,
            };
        }
    }
    let _ = tokio::signal::ctrl_c().await;
    StopReason::Interrupted
}

async fn stop_after(limit: Option<std::time::Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}
