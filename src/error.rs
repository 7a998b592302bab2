//! Custom error types for the diagnostics.
//!
//! `DiagError` is the single error type of the library. It splits into two
//! groups that the rest of the crate treats very differently:
//!
//! - **Per-feature faults** (`FeatureNotFound`, `ReadFailed`, `WriteFailed`,
//!   `NotReadable`, `NotWritable`, `TypeMismatch`, `OutOfRange`,
//!   `InvalidSymbolic`, `CommandFailed`): raised by a single device query. The
//!   probes capture these as data and keep going with the next feature.
//! - **Fatal errors** (`SdkUnavailable`, `Connection`, `DeviceNotOpen`,
//!   `Profile`, `Config`, `Io`): these end a diagnostic run. The binaries catch
//!   them once, print a single line and exit with code 1.
//!
//! `is_fatal` encodes that split so callers do not have to match on variants.

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias for results using the diagnostics error type.
pub type AppResult<T> = std::result::Result<T, DiagError>;

/// Errors raised by device access and diagnostic runs.
#[derive(Error, Debug)]
pub enum DiagError {
    /// The selected camera SDK is not compiled in or not installed
    #[error("{sdk} SDK is not available in this build. {hint}")]
    SdkUnavailable { sdk: String, hint: String },

    /// Opening or closing the device failed
    #[error("Device connection failed: {0}")]
    Connection(String),

    /// A feature was accessed on a closed device
    #[error("Device is not open")]
    DeviceNotOpen,

    /// No feature of that name
    #[error("Feature '{0}' not found")]
    FeatureNotFound(String),

    /// Reading a value, bound or option list failed
    #[error("Failed to read '{feature}': {reason}")]
    ReadFailed { feature: String, reason: String },

    /// The device refused a write
    #[error("Failed to write '{feature}': {reason}")]
    WriteFailed { feature: String, reason: String },

    /// The feature exists but cannot be read
    #[error("Feature '{0}' is not readable")]
    NotReadable(String),

    /// The feature exists but cannot be written
    #[error("Feature '{0}' is not writable")]
    NotWritable(String),

    /// Value or operation of the wrong kind
    #[error("Feature '{feature}' expects {expected} but got {found}")]
    TypeMismatch {
        feature: String,
        expected: String,
        found: String,
    },

    /// Numeric write outside the declared bounds
    #[error("Value {value} for '{feature}' is outside range {min}..={max}")]
    OutOfRange {
        feature: String,
        value: String,
        min: String,
        max: String,
    },

    /// Symbolic not offered by the enumeration
    #[error("'{value}' is not a valid option for '{feature}'")]
    InvalidSymbolic { feature: String, value: String },

    /// Command execution failed
    #[error("Command '{feature}' failed: {reason}")]
    CommandFailed { feature: String, reason: String },

    /// A simulated device profile is unreadable or inconsistent
    #[error("Device profile error: {0}")]
    Profile(String),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiagError {
    /// Whether this error must end the diagnostic run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagError::SdkUnavailable { .. }
                | DiagError::Connection(_)
                | DiagError::DeviceNotOpen
                | DiagError::Profile(_)
                | DiagError::Config(_)
                | DiagError::Io(_)
        )
    }
}

impl From<toml::de::Error> for DiagError {
    fn from(err: toml::de::Error) -> Self {
        DiagError::Profile(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiagError::ReadFailed {
            feature: "Gain".into(),
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Failed to read 'Gain': timeout");
    }

    #[test]
    fn test_sdk_unavailable_is_fatal() {
        let err = DiagError::SdkUnavailable {
            sdk: "pylon".into(),
            hint: "Install the pylon runtime.".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("pylon SDK is not available"));
    }

    #[test]
    fn test_feature_faults_are_not_fatal() {
        assert!(!DiagError::FeatureNotFound("SequencerPathSelector".into()).is_fatal());
        assert!(!DiagError::NotWritable("DeviceModelName".into()).is_fatal());
    }
}
