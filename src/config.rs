//! Configuration for the diagnostics using Figment.
//!
//! Configuration is layered, lowest to highest precedence:
//! 1. Built-in defaults (`DiagConfig::default()`)
//! 2. TOML file (default: `config/sequencer_diag.toml`, missing file is fine)
//! 3. Environment variables prefixed with `SEQDIAG_`
//!
//! Nested keys are separated by a double underscore so that keys which contain
//! an underscore themselves survive:
//!
//! ```text
//! SEQDIAG_APPLICATION__LOG_LEVEL=debug
//! SEQDIAG_DEVICE__BACKEND=simulated
//! SEQDIAG_DEVICE__PROFILE=profiles/sequencer_only.toml
//! SEQDIAG_PROBE__RESTORE_AFTER_WRITE=false
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sequencer_diag::config::DiagConfig;
//!
//! let config = DiagConfig::load()?;
//! println!("Log level: {}", config.application.log_level);
//! # Ok::<(), sequencer_diag::config::ConfigError>(())
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::FeatureValue;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/sequencer_diag.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "SEQDIAG_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered sources could not be merged or extracted.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    /// Values parsed but are not acceptable.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Which device backend to connect to
    #[serde(default)]
    pub device: DeviceConfig,
    /// Tunables of the exploratory probes
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Device backends known to the diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// Profile-driven in-process camera.
    #[default]
    Simulated,
    /// Basler pylon runtime. Not compiled into this build.
    Pylon,
}

impl DeviceBackend {
    /// Name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceBackend::Simulated => "simulated",
            DeviceBackend::Pylon => "pylon",
        }
    }
}

/// Device selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Backend used to reach the camera
    #[serde(default)]
    pub backend: DeviceBackend,
    /// Device profile for the simulated backend; the built-in profile is used when unset
    #[serde(default)]
    pub profile: Option<PathBuf>,
}

/// Probe tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Upper (exclusive) bound on path indices tried by the settability test
    #[serde(default = "default_max_path_candidates")]
    pub max_path_candidates: i64,
    /// Write the original value back after a settability test
    #[serde(default = "default_restore_after_write")]
    pub restore_after_write: bool,
    /// Number of sequencer sets read by the state inspection
    #[serde(default = "default_sets_to_inspect")]
    pub sequencer_sets_to_inspect: i64,
    /// Set that receives the test writes in the cross-set comparison
    #[serde(default)]
    pub compare_set_a: i64,
    /// Set that is read back in the cross-set comparison
    #[serde(default = "default_compare_set_b")]
    pub compare_set_b: i64,
    /// Preferred test values per parameter; the first one differing from the
    /// original value is written
    #[serde(default = "default_test_values")]
    pub test_values: BTreeMap<String, Vec<FeatureValue>>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_path_candidates: default_max_path_candidates(),
            restore_after_write: default_restore_after_write(),
            sequencer_sets_to_inspect: default_sets_to_inspect(),
            compare_set_a: 0,
            compare_set_b: default_compare_set_b(),
            test_values: default_test_values(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "sequencer_diag".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_max_path_candidates() -> i64 {
    3
}

fn default_restore_after_write() -> bool {
    true
}

fn default_sets_to_inspect() -> i64 {
    3
}

fn default_compare_set_b() -> i64 {
    1
}

fn default_test_values() -> BTreeMap<String, Vec<FeatureValue>> {
    BTreeMap::from([
        (
            "Width".to_string(),
            vec![FeatureValue::Integer(640), FeatureValue::Integer(800)],
        ),
        (
            "Height".to_string(),
            vec![FeatureValue::Integer(480), FeatureValue::Integer(600)],
        ),
        ("ExposureTime".to_string(), vec![FeatureValue::Float(100.0)]),
    ])
}

// ============================================================================
// Configuration Loading and Validation
// ============================================================================

impl DiagConfig {
    /// Load configuration from the default file and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path and validate it.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::extract(Self::figment(path))
    }

    /// The layered sources without extraction, so callers can merge
    /// command-line overrides on top.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(DiagConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from prepared sources.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Log format is valid (pretty, compact, json)
    /// - Candidate and set counts are positive
    /// - The two compared sets are distinct, non-negative indices
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            )));
        }

        if self.probe.max_path_candidates < 1 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid max_path_candidates {}. Must be >= 1",
                self.probe.max_path_candidates
            )));
        }

        if self.probe.sequencer_sets_to_inspect < 1 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid sequencer_sets_to_inspect {}. Must be >= 1",
                self.probe.sequencer_sets_to_inspect
            )));
        }

        if self.probe.compare_set_a < 0 || self.probe.compare_set_b < 0 {
            return Err(ConfigError::ValidationError(
                "Sequencer set indices must be >= 0".to_string(),
            ));
        }

        if self.probe.compare_set_a == self.probe.compare_set_b {
            return Err(ConfigError::ValidationError(format!(
                "compare_set_a and compare_set_b must differ (both are {})",
                self.probe.compare_set_a
            )));
        }

        for (name, values) in &self.probe.test_values {
            if values.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "test_values for '{}' cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DiagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.backend, DeviceBackend::Simulated);
        assert_eq!(config.probe.max_path_candidates, 3);
        assert!(config.probe.restore_after_write);
        assert_eq!(
            config.probe.test_values["ExposureTime"],
            vec![FeatureValue::Float(100.0)]
        );
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = DiagConfig::default();
        config.application.log_level = "loud".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid log_level"));
    }

    #[test]
    fn test_identical_compare_sets_rejected() {
        let mut config = DiagConfig::default();
        config.probe.compare_set_b = 0;

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("must differ"));
    }

    #[test]
    fn test_empty_test_values_rejected() {
        let mut config = DiagConfig::default();
        config.probe.test_values.insert("Gain".to_string(), vec![]);

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[application]
log_level = "debug"

[device]
backend = "pylon"

[probe]
max_path_candidates = 5
restore_after_write = false

[probe.test_values]
Gain = [3.5]
"#
        )
        .unwrap();

        let config = DiagConfig::load_from(file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.device.backend, DeviceBackend::Pylon);
        assert_eq!(config.probe.max_path_candidates, 5);
        assert!(!config.probe.restore_after_write);
        assert_eq!(config.probe.test_values["Gain"], vec![FeatureValue::Float(3.5)]);
        // untouched keys keep their defaults
        assert_eq!(config.probe.sequencer_sets_to_inspect, 3);
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let config = DiagConfig::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.application.log_level, "warn");
        assert!(config.device.profile.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        std::env::set_var("SEQDIAG_APPLICATION__LOG_LEVEL", "trace");
        std::env::set_var("SEQDIAG_DEVICE__PROFILE", "profiles/sequencer_only.toml");
        let config = DiagConfig::load_from("does/not/exist.toml");
        std::env::remove_var("SEQDIAG_APPLICATION__LOG_LEVEL");
        std::env::remove_var("SEQDIAG_DEVICE__PROFILE");

        let config = config.unwrap();
        assert_eq!(config.application.log_level, "trace");
        assert_eq!(
            config.device.profile,
            Some(PathBuf::from("profiles/sequencer_only.toml"))
        );
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_fails_validation() {
        std::env::set_var("SEQDIAG_PROBE__MAX_PATH_CANDIDATES", "0");
        let result = DiagConfig::load_from("does/not/exist.toml");
        std::env::remove_var("SEQDIAG_PROBE__MAX_PATH_CANDIDATES");

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
