//! Configuration loader
//!
//! Pipeline:
//! 1. Size check
//! 2. UTF-8 BOM strip
//! 3. Environment variable expansion (pre-parse, on raw text)
//! 4. YAML parsing and empty-file check
//! 5. Deserialization to [`MatchConfig`]
//! 6. Validation
//! 7. Freeze with `Arc`

use crate::config::schema::MatchConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the configuration size limit.
pub const MAX_CONFIG_SIZE_ENV: &str = "ISLANDCLASH_MAX_CONFIG_SIZE";

/// Default configuration size limit (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

// ============================================================================
// Public API
// ============================================================================

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or(MAX_CONFIG_SIZE_ENV, DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<MatchConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
}

impl ConfigLoader {
    /// Creates a loader with the given limits.
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Creates a loader with default limits.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ConfigLimits::default())
    }

    /// Loads, validates and freezes a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable or over the size limit
    /// - A required environment variable is unset
    /// - YAML parsing fails or the file is empty
    /// - Validation reports errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(file_size)?;

        let raw_content = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_from_str(&raw_content, path)
    }

    /// Runs the pipeline on in-memory content. `path` is used for messages
    /// only.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus file access.
    pub fn load_from_str(&self, raw_content: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw_content.len())?;
        let mut warnings = Vec::new();

        // Handle UTF-8 BOM
        let raw_content = raw_content.strip_prefix('\u{feff}').unwrap_or(raw_content);

        // Environment variable substitution (before YAML parsing)
        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw_content, path)?;
        warnings.extend(env_sub.warnings);

        let root: Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let config: MatchConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize configuration: {e}"),
            })?;

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }

    fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.limits.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{size} bytes"),
                expected: format!("at most {} bytes", self.limits.max_config_size),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text BEFORE parsing to preserve type inference.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = VarSpec::parse(&mut chars, source_path)?;
                    match (std::env::var(&spec.name), spec.fallback) {
                        (Ok(value), _) => result.push_str(&value),
                        (Err(_), Some(Fallback::Default(value))) => result.push_str(&value),
                        (Err(_), Some(Fallback::Required(message))) => {
                            return Err(ConfigError::EnvVarNotSet {
                                var: spec.name,
                                location: if message.is_empty() {
                                    source_path.display().to_string()
                                } else {
                                    message
                                },
                            });
                        }
                        (Err(_), None) => self.warnings.push(LoadWarning {
                            message: format!(
                                "Environment variable '{}' is not set, using empty string",
                                spec.name
                            ),
                            location: Some(source_path.display().to_string()),
                        }),
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }
}

enum Fallback {
    Default(String),
    Required(String),
}

struct VarSpec {
    name: String,
    fallback: Option<Fallback>,
}

impl VarSpec {
    /// Parses the remainder of a `${...}` reference.
    fn parse(
        chars: &mut std::iter::Peekable<std::str::Chars>,
        source_path: &Path,
    ) -> Result<Self, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(Self {
                        name,
                        fallback: None,
                    });
                }
                ':' if matches!(chars.peek(), Some('-' | '?')) => {
                    let required = chars.next() == Some('?');
                    let value = read_until_close(chars, source_path)?;
                    let fallback = if required {
                        Fallback::Required(value)
                    } else {
                        Fallback::Default(value)
                    };
                    return Ok(Self {
                        name,
                        fallback: Some(fallback),
                    });
                }
                _ => name.push(c),
            }
        }

        Err(unclosed(source_path, &name))
    }
}

/// Reads content until the matching `}`, keeping nested braces.
fn read_until_close(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    source_path: &Path,
) -> Result<String, ConfigError> {
    let mut value = String::new();
    let mut depth = 1;

    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }

    Err(unclosed(source_path, &value))
}

fn unclosed(source_path: &Path, fragment: &str) -> ConfigError {
    ConfigError::ParseError {
        path: PathBuf::from(source_path),
        line: None,
        message: format!("Unclosed environment variable reference: ${{{fragment}"),
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn path() -> &'static Path {
        Path::new("test.yaml")
    }

    #[test]
    fn test_env_substitution_simple() {
        // PATH is always set
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("path: ${PATH}", path()).unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
    }

    #[test]
    fn test_env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("seed: ${ISLANDCLASH_TEST_UNSET_SEED_XYZ:-42}", path())
            .unwrap();
        assert_eq!(result, "seed: 42");
        assert!(sub.warnings.is_empty());
    }

    #[test]
    fn test_env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("dir: ${ISLANDCLASH_TEST_REQUIRED_XYZ:?set a data dir}", path());
        match result {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "ISLANDCLASH_TEST_REQUIRED_XYZ");
                assert_eq!(location, "set a data dir");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        assert_eq!(sub.substitute("cost: $$100", path()).unwrap(), "cost: $100");
        assert_eq!(sub.substitute("lone $ sign", path()).unwrap(), "lone $ sign");
    }

    #[test]
    fn test_env_substitution_missing_warning() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("value: ${ISLANDCLASH_TEST_WARN_XYZ}", path())
            .unwrap();
        assert_eq!(result, "value: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("ISLANDCLASH_TEST_WARN_XYZ"));
    }

    #[test]
    fn test_env_substitution_nested_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("v: ${ISLANDCLASH_TEST_NESTED_XYZ:-{a}}", path())
            .unwrap();
        assert_eq!(result, "v: {a}");
    }

    #[test]
    fn test_env_substitution_unclosed() {
        let mut sub = EnvSubstitution::new();
        assert!(matches!(
            sub.substitute("v: ${OPEN", path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_from_str_full_pipeline() {
        let yaml = "\u{feff}tick:\n  rate_hz: 10\nphases:\n  build: ${ISLANDCLASH_TEST_BUILD_XYZ:-20m}\n";
        let result = ConfigLoader::with_defaults().load_from_str(yaml, path()).unwrap();
        assert_eq!(result.config.tick.rate_hz, 10);
        assert_eq!(result.config.phases.build, Duration::from_secs(1200));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_config_rejected() {
        let loader = ConfigLoader::with_defaults();
        let err = loader.load_from_str("   \n# only a comment\n", path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validation_errors_fail_load() {
        let loader = ConfigLoader::with_defaults();
        let err = loader
            .load_from_str("tick:\n  rate_hz: 500\n", path())
            .unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => {
                assert_eq!(errors[0].path, "tick.rate_hz");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_warnings_returned() {
        let loader = ConfigLoader::with_defaults();
        let result = loader
            .load_from_str("hazards:\n  interval: 1m\n  cooldown: 2m\n", path())
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location.as_deref(), Some("hazards.cooldown"));
    }

    #[test]
    fn test_size_limit() {
        let loader = ConfigLoader::new(ConfigLimits { max_config_size: 8 });
        let err = loader.load_from_str("tick: {rate_hz: 20}", path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "file_size"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/nonexistent/islandclash.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  dir: /tmp/islandclash").unwrap();
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.storage.dir, PathBuf::from("/tmp/islandclash"));
    }
}
