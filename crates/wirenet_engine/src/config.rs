//! Engine configuration loading and validation.
//!
//! Configuration lives under an `[engine]` table in a TOML file:
//!
//! ```toml
//! [engine]
//! max_build_attempts = 5
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Default number of attempts a bundle build gets before a degraded snapshot
/// is published.
pub const DEFAULT_MAX_BUILD_ATTEMPTS: u32 = 5;

/// Tunable engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many times a failing bundle build is attempted before giving up.
    pub max_build_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_build_attempts: DEFAULT_MAX_BUILD_ATTEMPTS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

/// Loads and validates an engine configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates an engine configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&file.engine)?;
    Ok(file.engine)
}

/// Validates that configuration values are usable.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_build_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "max_build_attempts must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_build_attempts, DEFAULT_MAX_BUILD_ATTEMPTS);
    }

    #[test]
    fn parse_engine_section() {
        let toml = r#"
[engine]
max_build_attempts = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.max_build_attempts, 2);
    }

    #[test]
    fn zero_attempts_rejected() {
        let toml = r#"
[engine]
max_build_attempts = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = load_config_from_str("[engine\nmax_build_attempts = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn wrong_type_rejected() {
        let err = load_config_from_str("[engine]\nmax_build_attempts = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wirenet.toml");
        std::fs::write(&path, "[engine]\nmax_build_attempts = 3\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.max_build_attempts, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
