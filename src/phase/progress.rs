//! Progress display helpers.

use std::time::Duration;

use super::state::MatchPhase;

/// Converts a duration to whole dispatch ticks, rounding down.
#[must_use]
pub fn duration_to_ticks(duration: Duration, tick_rate_hz: u32) -> u64 {
    let ticks = duration.as_millis() * u128::from(tick_rate_hz) / 1000;
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Converts dispatch ticks back to a duration.
#[must_use]
pub fn ticks_to_duration(ticks: u64, tick_rate_hz: u32) -> Duration {
    let rate = u64::from(tick_rate_hz.max(1));
    Duration::from_millis(ticks.saturating_mul(1000) / rate)
}

/// Remaining share of a timer, clamped to `0.0..=1.0`.
///
/// A zero-length timer counts as fully elapsed.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn remaining_fraction(remaining_ticks: u64, total_ticks: u64) -> f32 {
    if total_ticks == 0 {
        return 0.0;
    }
    (remaining_ticks as f64 / total_ticks as f64).clamp(0.0, 1.0) as f32
}

/// Short human rendering of a remaining duration.
///
/// Whole minutes (rounded up) from one minute on, seconds below that.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs >= 60 {
        format!("{}m", secs.div_ceil(60))
    } else {
        format!("{secs}s")
    }
}

/// Label for the progress display.
#[must_use]
pub fn phase_label(phase: MatchPhase, countdown: Option<Duration>, remaining: Duration) -> String {
    if let Some(left) = countdown {
        return format!("Starting in {}", format_remaining(left));
    }
    match phase {
        MatchPhase::Lobby => "Waiting for players".to_string(),
        MatchPhase::Build => format!("Build phase: {} left", format_remaining(remaining)),
        MatchPhase::Pvp => format!("PvP phase: {} left", format_remaining(remaining)),
        MatchPhase::Ended => "Match over".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_to_ticks() {
        assert_eq!(duration_to_ticks(Duration::from_secs(10), 20), 200);
        assert_eq!(duration_to_ticks(Duration::from_millis(75), 20), 1);
        assert_eq!(duration_to_ticks(Duration::ZERO, 20), 0);
    }

    #[test]
    fn test_ticks_to_duration() {
        assert_eq!(ticks_to_duration(200, 20), Duration::from_secs(10));
        assert_eq!(ticks_to_duration(5, 0), Duration::from_secs(5));
    }

    #[test]
    fn test_remaining_fraction_clamps() {
        assert!((remaining_fraction(50, 100) - 0.5).abs() < f32::EPSILON);
        assert!((remaining_fraction(150, 100) - 1.0).abs() < f32::EPSILON);
        assert!(remaining_fraction(10, 0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(5)), "5s");
        assert_eq!(format_remaining(Duration::from_secs(60)), "1m");
        assert_eq!(format_remaining(Duration::from_secs(61)), "2m");
    }

    #[test]
    fn test_phase_label() {
        assert_eq!(
            phase_label(MatchPhase::Build, None, Duration::from_secs(1800)),
            "Build phase: 30m left"
        );
        assert_eq!(
            phase_label(MatchPhase::Lobby, Some(Duration::from_secs(3)), Duration::ZERO),
            "Starting in 3s"
        );
        assert_eq!(phase_label(MatchPhase::Ended, None, Duration::ZERO), "Match over");
    }
}
