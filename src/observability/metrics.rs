//! Metrics collection.
//!
//! Prometheus-compatible metrics with typed recording functions. Every
//! label value comes from a closed enum or a known document key, so label
//! cardinality stays bounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::IslandClashError;
use crate::hazard::{HazardKind, TriggerSource};
use crate::persistence::{PHASE_STATE_KEY, TEAMS_KEY, TERRITORIES_KEY};
use crate::phase::MatchPhase;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const KNOWN_DOCUMENTS: [&str; 3] = [TERRITORIES_KEY, TEAMS_KEY, PHASE_STATE_KEY];

/// Returns the document key when known, `"__unknown__"` otherwise.
#[must_use]
pub fn sanitize_document_label(key: &str) -> &'static str {
    KNOWN_DOCUMENTS
        .into_iter()
        .find(|known| *known == key)
        .unwrap_or("__unknown__")
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `IslandClashError::Io` if the recorder or HTTP listener cannot
/// be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), IslandClashError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| IslandClashError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "islandclash_phase_transitions_total",
        "Total number of phase transitions by entered phase"
    );
    describe_gauge!(
        "islandclash_current_phase",
        "Currently active phase (1 = active)"
    );
    describe_counter!(
        "islandclash_hazards_triggered_total",
        "Hazards started, by kind and source"
    );
    describe_counter!(
        "islandclash_hazards_expired_total",
        "Hazards removed by the expiration sweep"
    );
    describe_counter!(
        "islandclash_hazards_cancelled_total",
        "Hazards removed by admin cancellation"
    );
    describe_gauge!("islandclash_hazards_active", "Currently active hazards");
    describe_counter!(
        "islandclash_effect_failures_total",
        "Hazard effects the host failed to apply"
    );
    describe_counter!(
        "islandclash_persistence_errors_total",
        "Document read or write failures by key"
    );
    describe_histogram!(
        "islandclash_tick_duration_ms",
        "Dispatch tick duration in milliseconds"
    );
}

/// Records a phase transition.
pub fn record_phase_transition(to: MatchPhase) {
    counter!("islandclash_phase_transitions_total", "phase" => to.as_str()).increment(1);
}

/// Marks `phase` as the active phase and every other phase inactive.
pub fn set_current_phase(phase: MatchPhase) {
    for candidate in MatchPhase::ALL {
        let value = if candidate == phase { 1.0 } else { 0.0 };
        gauge!("islandclash_current_phase", "phase" => candidate.as_str()).set(value);
    }
}

/// Records a successful hazard trigger.
pub fn record_hazard_triggered(kind: HazardKind, source: TriggerSource) {
    counter!(
        "islandclash_hazards_triggered_total",
        "kind" => kind.as_str(),
        "source" => source.as_str(),
    )
    .increment(1);
}

/// Records a hazard removed by expiration.
pub fn record_hazard_expired(kind: HazardKind) {
    counter!("islandclash_hazards_expired_total", "kind" => kind.as_str()).increment(1);
}

/// Records a hazard removed by cancellation.
pub fn record_hazard_cancelled(kind: HazardKind) {
    counter!("islandclash_hazards_cancelled_total", "kind" => kind.as_str()).increment(1);
}

/// Sets the active hazard gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_hazards(count: usize) {
    gauge!("islandclash_hazards_active").set(count as f64);
}

/// Records a failed effect application.
pub fn record_effect_failure(kind: HazardKind) {
    counter!("islandclash_effect_failures_total", "kind" => kind.as_str()).increment(1);
}

/// Records a document read or write failure.
pub fn record_persistence_error(key: &str) {
    counter!(
        "islandclash_persistence_errors_total",
        "key" => sanitize_document_label(key)
    )
    .increment(1);
}

/// Records how long one dispatch tick took.
pub fn record_tick_duration(duration: Duration) {
    histogram!("islandclash_tick_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_known_documents() {
        assert_eq!(sanitize_document_label("teams"), "teams");
        assert_eq!(sanitize_document_label("phase-state"), "phase-state");
        assert_eq!(sanitize_document_label("../../etc/passwd"), "__unknown__");
    }

    #[test]
    fn test_record_functions_do_not_panic_without_recorder() {
        record_phase_transition(MatchPhase::Build);
        set_current_phase(MatchPhase::Pvp);
        record_hazard_triggered(HazardKind::Tsunami, TriggerSource::Random);
        record_hazard_expired(HazardKind::Tsunami);
        record_hazard_cancelled(HazardKind::Wildfire);
        set_active_hazards(3);
        record_effect_failure(HazardKind::Tornado);
        record_persistence_error("teams");
        record_tick_duration(Duration::from_micros(250));
    }
}
