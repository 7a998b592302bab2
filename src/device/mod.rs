//! Camera device interface.
//!
//! `CameraDevice` is the seam between the diagnostics and a camera-control
//! SDK. It exposes the handful of node-map style calls the probes need:
//! named-feature lookup with a tri-state access answer, typed value access,
//! numeric bounds, enumeration symbolics and command execution.
//!
//! Backends are picked from configuration by [`connect`]. The only backend
//! compiled into this crate is the profile-driven [`SimulatedCamera`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DeviceBackend, DeviceConfig};
use crate::error::{AppResult, DiagError};

pub mod session;
pub mod simulated;

pub use session::DeviceSession;
pub use simulated::{DeviceProfile, FeatureSpec, SimulatedCamera};

/// Value held by a device feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Boolean feature value
    Boolean(bool),
    /// Integer feature value
    Integer(i64),
    /// Floating-point feature value
    Float(f64),
    /// Symbolic value of an enumeration
    Enumeration(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Boolean(b) => write!(f, "{}", b),
            FeatureValue::Integer(i) => write!(f, "{}", i),
            // Debug keeps the trailing ".0" on whole numbers
            FeatureValue::Float(fl) => write!(f, "{:?}", fl),
            FeatureValue::Enumeration(s) => write!(f, "{}", s),
        }
    }
}

impl FeatureValue {
    /// The feature kind this value belongs to.
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Boolean(_) => FeatureKind::Boolean,
            FeatureValue::Integer(_) => FeatureKind::Integer,
            FeatureValue::Float(_) => FeatureKind::Float,
            FeatureValue::Enumeration(_) => FeatureKind::Enumeration,
        }
    }

    /// Extract value as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FeatureValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract value as f64; integers widen
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(f) => Some(*f),
            FeatureValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract the symbolic of an enumeration value
    pub fn as_symbolic(&self) -> Option<&str> {
        match self {
            FeatureValue::Enumeration(s) => Some(s),
            _ => None,
        }
    }

    /// Shorthand for an enumeration value.
    pub fn symbolic(s: impl Into<String>) -> Self {
        FeatureValue::Enumeration(s.into())
    }
}

/// Interface type of a device feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// On/off feature
    Boolean,
    /// Integer feature with bounds
    Integer,
    /// Floating-point feature with bounds
    Float,
    /// Feature with a fixed set of symbolic values
    Enumeration,
    /// Executable feature without a value
    Command,
}

impl FeatureKind {
    /// Whether min/max bounds apply.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureKind::Integer | FeatureKind::Float)
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Boolean => "boolean",
            FeatureKind::Integer => "integer",
            FeatureKind::Float => "float",
            FeatureKind::Enumeration => "enumeration",
            FeatureKind::Command => "command",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to "does this named feature exist, and what may I do with it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureAccess {
    /// No feature of that name on the device
    NotFound,
    /// Feature exists and can only be read
    ReadOnly,
    /// Feature exists and can be read and written (or executed, for commands)
    ReadWrite,
}

impl FeatureAccess {
    /// Whether the lookup resolved.
    pub fn is_found(&self) -> bool {
        !matches!(self, FeatureAccess::NotFound)
    }

    /// Whether the value can be read.
    pub fn is_readable(&self) -> bool {
        self.is_found()
    }

    /// Whether the value can be written.
    pub fn is_writable(&self) -> bool {
        matches!(self, FeatureAccess::ReadWrite)
    }
}

/// Identification of a connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Vendor name
    pub vendor_name: String,
    /// Model name
    pub model_name: String,
    /// Serial number
    pub serial_number: String,
}

/// Capability-query interface of a camera-control SDK.
///
/// All calls are synchronous and blocking. Feature calls on a closed device
/// fail with [`DiagError::DeviceNotOpen`]; `feature_access` answers
/// `NotFound` instead.
pub trait CameraDevice {
    /// Open the device. Opening an open device is a no-op.
    fn open(&mut self) -> AppResult<()>;

    /// Close the device. Closing a closed device is a no-op.
    fn close(&mut self) -> AppResult<()>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Vendor, model and serial number.
    fn device_info(&self) -> AppResult<DeviceInfo>;

    /// Resolve a feature by name.
    fn feature_access(&self, name: &str) -> FeatureAccess;

    /// Interface type of a feature.
    fn feature_kind(&self, name: &str) -> AppResult<FeatureKind>;

    /// Read the current value.
    fn get_value(&self, name: &str) -> AppResult<FeatureValue>;

    /// Write a value.
    fn set_value(&mut self, name: &str, value: &FeatureValue) -> AppResult<()>;

    /// Lower bound of a numeric feature.
    fn get_min(&self, name: &str) -> AppResult<FeatureValue>;

    /// Upper bound of a numeric feature.
    fn get_max(&self, name: &str) -> AppResult<FeatureValue>;

    /// Ordered symbolics of an enumeration feature.
    fn get_symbolics(&self, name: &str) -> AppResult<Vec<String>>;

    /// Execute a command feature.
    ///
    /// Part of the SDK surface only. The diagnostics check that commands are
    /// executable but never fire them, since a pulse or trigger acts on the
    /// hardware.
    fn execute(&mut self, name: &str) -> AppResult<()>;
}

/// Build the device selected by configuration. The device is returned closed.
pub fn connect(config: &DeviceConfig) -> AppResult<Box<dyn CameraDevice>> {
    match config.backend {
        DeviceBackend::Simulated => {
            let profile = match &config.profile {
                Some(path) => DeviceProfile::from_file(path)?,
                None => DeviceProfile::builtin()?,
            };
            tracing::debug!(
                model = %profile.device.model_name,
                features = profile.features.len(),
                "Using simulated camera"
            );
            Ok(Box::new(SimulatedCamera::new(profile)?))
        }
        DeviceBackend::Pylon => Err(DiagError::SdkUnavailable {
            sdk: DeviceBackend::Pylon.as_str().to_string(),
            hint: "Install the Basler pylon runtime and use a build with pylon support, \
                   or set device.backend = \"simulated\"."
                .to_string(),
        }),
    }
}
