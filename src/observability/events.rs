//! Structured match event stream.
//!
//! Discrete, typed events emitted while a match runs. Events are
//! serialized as newline-delimited JSON (JSONL) and carry a monotonically
//! increasing sequence number for ordering.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hazard::{HazardKind, TriggerSource};
use crate::phase::{MatchPhase, TransitionCause};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Why the match loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Interrupted by SIGINT.
    Interrupted,
    /// Terminated by SIGTERM.
    Terminated,
    /// Stopped by the embedding application.
    Shutdown,
}

/// Summary statistics emitted when the loop stops.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Dispatch ticks executed.
    pub ticks: u64,
    /// Phase transitions applied.
    pub phase_transitions: u64,
    /// Hazards successfully triggered.
    pub hazards_triggered: u64,
    /// Uptime in seconds.
    pub uptime_secs: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ticks={} transitions={} hazards={} uptime={:.1}s",
            self.ticks, self.phase_transitions, self.hazards_triggered, self.uptime_secs,
        )
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a match.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The dispatch loop has started.
    MatchStarted {
        /// When the loop started.
        timestamp: DateTime<Utc>,
        /// Phase the match resumed in.
        phase: MatchPhase,
        /// Registered islands.
        islands: usize,
        /// Dispatch rate.
        tick_rate_hz: u32,
    },

    /// A pre-build countdown began.
    CountdownStarted {
        /// When the countdown began.
        timestamp: DateTime<Utc>,
        /// Countdown length in seconds.
        seconds: u64,
    },

    /// A new phase has been entered.
    PhaseEntered {
        /// When the transition occurred.
        timestamp: DateTime<Utc>,
        /// Phase that was left.
        from: MatchPhase,
        /// Phase that was entered.
        to: MatchPhase,
        /// What caused the transition.
        cause: TransitionCause,
    },

    /// A hazard started on an island.
    HazardTriggered {
        /// When the hazard started.
        timestamp: DateTime<Utc>,
        /// Target island id.
        island: String,
        /// Hazard kind.
        kind: HazardKind,
        /// Participants inside the territory when it fired.
        targets: usize,
        /// Random schedule or admin command.
        source: TriggerSource,
    },

    /// A hazard reached its expiration.
    HazardExpired {
        /// When the sweep removed it.
        timestamp: DateTime<Utc>,
        /// Island id.
        island: String,
        /// Hazard kind.
        kind: HazardKind,
    },

    /// Active hazards on an island were cancelled by an admin.
    HazardCancelled {
        /// When they were cancelled.
        timestamp: DateTime<Utc>,
        /// Island id.
        island: String,
        /// Every kind that was removed.
        kinds: Vec<HazardKind>,
    },

    /// The dispatch loop has stopped.
    MatchStopped {
        /// When the loop stopped.
        timestamp: DateTime<Utc>,
        /// Why it stopped.
        reason: StopReason,
        /// Run summary statistics.
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<RunSummary>,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each [`emit`](Self::emit) takes the next sequence number, writes one JSON
/// line, and flushes. Serialization or I/O failures are dropped.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that appends to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) {
        if let Ok(mut w) = self.writer.lock() {
            let _ = w.flush();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
