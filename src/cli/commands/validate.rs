//! `validate` command
//!
//! Runs the full loading pipeline on each file without touching storage.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, IslandClashError, Severity, ValidationIssue};

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    valid: bool,
    warnings: Vec<String>,
}

/// Validate configuration files.
///
/// Every file is checked; the first failure is returned once all have been
/// reported.
///
/// # Errors
///
/// Returns a config error for the first file that fails to load, or for
/// the first file with warnings under `--strict`.
pub fn run(args: &ValidateArgs) -> Result<(), IslandClashError> {
    let loader = ConfigLoader::with_defaults();
    let mut first_error = None;
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");

        let outcome = loader.load(path).and_then(|loaded| {
            if args.strict && !loaded.warnings.is_empty() {
                Err(strict_failure(path, &loaded.warnings))
            } else {
                Ok(loaded.warnings)
            }
        });

        let report = match outcome {
            Ok(warnings) => FileReport {
                file: path,
                valid: true,
                warnings: warnings.iter().map(ToString::to_string).collect(),
            },
            Err(e) => {
                if args.format == OutputFormat::Human {
                    eprintln!("{}: {e}", path.display());
                }
                first_error.get_or_insert(e);
                FileReport {
                    file: path,
                    valid: false,
                    warnings: Vec::new(),
                }
            }
        };

        if args.format == OutputFormat::Human && report.valid {
            println!("{}: ok", path.display());
            for warning in &report.warnings {
                println!("  warning: {warning}");
            }
        }
        reports.push(report);
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn strict_failure(path: &Path, warnings: &[LoadWarning]) -> ConfigError {
    ConfigError::ValidationError {
        path: path.display().to_string(),
        errors: warnings
            .iter()
            .map(|w| ValidationIssue {
                path: w.location.clone().unwrap_or_default(),
                message: w.message.clone(),
                severity: Severity::Warning,
            })
            .collect(),
    }
}
