//! Error types for `IslandClash`
//!
//! One `thiserror` enum per domain, aggregated into [`IslandClashError`]
//! for the CLI, which maps every variant to a process exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::hazard::HazardKind;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `IslandClash` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Persistence error (unreadable or unwritable data directory)
    pub const PERSISTENCE_ERROR: i32 = 4;

    /// Match engine error (unknown phase, unknown hazard, unknown island)
    pub const GAME_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `IslandClash` operations.
///
/// Aggregates all domain-specific errors and maps each one to an exit code.
#[derive(Debug, Error)]
pub enum IslandClashError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Territory polygon construction error
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Island/team registry error
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Phase state machine error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Hazard orchestration error
    #[error(transparent)]
    Hazard(#[from] HazardError),

    /// Document store error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IslandClashError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Zone(_) | Self::Json(_) | Self::Yaml(_) => {
                ExitCode::CONFIG_ERROR
            }
            Self::Directory(_) | Self::Phase(_) | Self::Hazard(_) => ExitCode::GAME_ERROR,
            Self::Persistence(_) => ExitCode::PERSISTENCE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

fn summarize(errors: &[ValidationIssue]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "islands[2].territory")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Zone Errors
// ============================================================================

/// Territory polygon construction errors.
///
/// Raised only when a zone is built; containment queries never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// Fewer than three vertices
    #[error("a territory needs at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied
        count: usize,
    },

    /// All vertices are collinear or repeated
    #[error("territory polygon has zero area")]
    Degenerate,

    /// Two non-adjacent edges cross or touch
    #[error("territory polygon edges {first} and {second} intersect")]
    SelfIntersecting {
        /// Index of the first edge
        first: usize,
        /// Index of the second edge
        second: usize,
    },

    /// Vertical bound is inverted
    #[error("vertical bound is inverted: min_y {min_y} > max_y {max_y}")]
    InvertedBounds {
        /// Lower bound
        min_y: i32,
        /// Upper bound
        max_y: i32,
    },
}

// ============================================================================
// Directory Errors
// ============================================================================

/// Island and team registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// No island registered under this id
    #[error("island not found: {0}")]
    IslandNotFound(String),

    /// No team registered under this name
    #[error("team not found: {0}")]
    TeamNotFound(String),
}

// ============================================================================
// Phase Errors
// ============================================================================

/// Phase state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// Phase name did not match any known phase
    #[error("unknown phase: '{0}' (expected lobby, build, pvp or ended)")]
    UnknownPhase(String),

    /// The dispatch task is no longer running
    #[error("match engine is not running")]
    EngineStopped,
}

// ============================================================================
// Hazard Errors
// ============================================================================

/// Hazard orchestration errors.
///
/// Each variant is a rejection: the active-hazard registry is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HazardError {
    /// Hazard name did not match any known hazard kind
    #[error("unknown hazard kind: '{0}'")]
    UnknownKind(String),

    /// No island registered under this id
    #[error("island not found: {0}")]
    IslandNotFound(String),

    /// The island has no territory to strike
    #[error("island {0} has no territory")]
    NoTerritory(String),

    /// The same hazard is already running on this island
    #[error("{kind} is already active on {island}")]
    AlreadyActive {
        /// Island id
        island: String,
        /// Hazard kind
        kind: HazardKind,
    },

    /// Nothing to cancel on this island
    #[error("no active hazards on {0}")]
    NotActive(String),

    /// The dispatch task is no longer running
    #[error("match engine is not running")]
    EngineStopped,
}

// ============================================================================
// Persistence Errors
// ============================================================================

/// Document store errors.
///
/// Never fatal: loads fall back to empty state, saves are logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the document failed
    #[error("I/O error on document '{key}': {source}")]
    Io {
        /// Document key
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The stored document could not be decoded
    #[error("malformed document '{key}': {source}")]
    Malformed {
        /// Document key
        key: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Host Errors
// ============================================================================

/// Errors reported by the hosting game server when applying a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The participant left before the mutation was applied
    #[error("participant {0} is not online")]
    ParticipantOffline(uuid::Uuid),

    /// The host refused the mutation
    #[error("host rejected mutation: {0}")]
    Rejected(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `IslandClash` operations.
pub type Result<T> = std::result::Result<T, IslandClashError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::PERSISTENCE_ERROR, 4);
        assert_eq!(ExitCode::GAME_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_game_errors_share_exit_code() {
        let phase: IslandClashError = PhaseError::UnknownPhase("x".to_string()).into();
        let hazard: IslandClashError = HazardError::NotActive("fire-island".to_string()).into();
        let directory: IslandClashError = DirectoryError::TeamNotFound("x".to_string()).into();
        assert_eq!(phase.exit_code(), ExitCode::GAME_ERROR);
        assert_eq!(hazard.exit_code(), ExitCode::GAME_ERROR);
        assert_eq!(directory.exit_code(), ExitCode::GAME_ERROR);
    }

    #[test]
    fn test_zone_error_is_config_error() {
        let err: IslandClashError = ZoneError::TooFewVertices { count: 2 }.into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_persistence_error_exit_code() {
        let err: IslandClashError = PersistenceError::Io {
            key: "teams".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::PERSISTENCE_ERROR);
        assert!(err.to_string().contains("teams"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: IslandClashError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "islands[0].territory".to_string(),
            message: "too few vertices".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: too few vertices at islands[0].territory"
        );
    }

    #[test]
    fn test_validation_error_lists_issues() {
        let err = ConfigError::ValidationError {
            path: "match.yaml".to_string(),
            errors: vec![ValidationIssue {
                path: "tick.rate_hz".to_string(),
                message: "must be between 1 and 100".to_string(),
                severity: Severity::Error,
            }],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("match.yaml"));
        assert!(rendered.contains("tick.rate_hz"));
    }

    #[test]
    fn test_already_active_display() {
        let err = HazardError::AlreadyActive {
            island: "ice-island".to_string(),
            kind: HazardKind::Blizzard,
        };
        assert_eq!(err.to_string(), "blizzard is already active on ice-island");
    }
}
