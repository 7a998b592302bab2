//! Profile-driven simulated camera.
//!
//! A [`DeviceProfile`] describes a camera's feature tree in TOML. Features
//! flagged `per_set` keep one value per sequencer set; the bank in use is the
//! one named by the set-selector feature (`SequencerSetSelector` unless the
//! profile says otherwise). All other features hold a single value shared by
//! every set.
//!
//! Faults can be injected per feature (`read_error`, `write_error`,
//! `range_error`, `options_error`, `rejected`) and per device (`open_error`,
//! `close_error`).
//!
//! ```toml
//! [device]
//! model_name = "a2A1920-160umBAS"
//! serial_number = "40123456"
//! sequencer_sets = 4
//!
//! [[features]]
//! name = "ExposureTime"
//! kind = "float"
//! value = 5000.0
//! min = 19.0
//! max = 10000000.0
//! per_set = true
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CameraDevice, DeviceInfo, FeatureAccess, FeatureKind, FeatureValue};
use crate::error::{AppResult, DiagError};

const BUILTIN_PROFILE: &str = include_str!("../../profiles/ace2_path_branching.toml");

/// Feature tree and identity of a simulated camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Device identity and device-level behaviour
    pub device: ProfileDevice,
    /// Features in declaration order
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

/// Device-level section of a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDevice {
    /// Vendor name
    #[serde(default = "default_vendor")]
    pub vendor_name: String,
    /// Model name
    pub model_name: String,
    /// Serial number
    pub serial_number: String,
    /// Number of sequencer sets backing `per_set` features
    #[serde(default = "default_sequencer_sets")]
    pub sequencer_sets: usize,
    /// Feature whose value picks the active sequencer set
    #[serde(default = "default_set_selector")]
    pub set_selector: String,
    /// Opening fails with this message
    #[serde(default)]
    pub open_error: Option<String>,
    /// Closing fails with this message
    #[serde(default)]
    pub close_error: Option<String>,
}

/// One feature of a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Feature name
    pub name: String,
    /// Interface type
    pub kind: FeatureKind,
    /// Initial value; required for everything but commands
    #[serde(default)]
    pub value: Option<FeatureValue>,
    /// Lower bound of numeric features
    #[serde(default)]
    pub min: Option<FeatureValue>,
    /// Upper bound of numeric features
    #[serde(default)]
    pub max: Option<FeatureValue>,
    /// Symbolics of enumeration features, in device order
    #[serde(default)]
    pub options: Vec<String>,
    /// Writes are refused
    #[serde(default)]
    pub read_only: bool,
    /// One value per sequencer set
    #[serde(default)]
    pub per_set: bool,
    /// Value reads fail with this message
    #[serde(default)]
    pub read_error: Option<String>,
    /// Writes and command execution fail with this message
    #[serde(default)]
    pub write_error: Option<String>,
    /// Bound reads fail with this message
    #[serde(default)]
    pub range_error: Option<String>,
    /// Symbolic reads fail with this message
    #[serde(default)]
    pub options_error: Option<String>,
    /// Values the device refuses despite being in range
    #[serde(default)]
    pub rejected: Vec<FeatureValue>,
}

fn default_vendor() -> String {
    "Basler".to_string()
}

fn default_sequencer_sets() -> usize {
    2
}

fn default_set_selector() -> String {
    "SequencerSetSelector".to_string()
}

impl DeviceProfile {
    /// The profile compiled into the crate: a camera with full sequencer
    /// path-branching support.
    pub fn builtin() -> AppResult<Self> {
        Self::from_toml(BUILTIN_PROFILE)
    }

    /// Parse a profile from TOML text.
    pub fn from_toml(text: &str) -> AppResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a profile file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DiagError::Profile(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }
}

/// Widen integers written to float features; otherwise the kinds must match.
fn coerce(kind: FeatureKind, value: &FeatureValue) -> Option<FeatureValue> {
    match (kind, value) {
        (FeatureKind::Float, FeatureValue::Integer(i)) => Some(FeatureValue::Float(*i as f64)),
        (kind, value) if value.kind() == kind => Some(value.clone()),
        _ => None,
    }
}

struct SimFeature {
    spec: FeatureSpec,
    bank: Vec<FeatureValue>,
}

/// In-process camera backed by a [`DeviceProfile`].
pub struct SimulatedCamera {
    info: DeviceInfo,
    set_count: usize,
    set_selector: String,
    open_error: Option<String>,
    close_error: Option<String>,
    is_open: bool,
    features: HashMap<String, SimFeature>,
    executions: HashMap<String, usize>,
}

impl SimulatedCamera {
    /// Build a closed camera from a profile, validating the profile on the way.
    pub fn new(profile: DeviceProfile) -> AppResult<Self> {
        let set_count = profile.device.sequencer_sets.max(1);
        let mut features = HashMap::with_capacity(profile.features.len());

        for spec in profile.features {
            let spec = Self::normalize(spec)?;
            let bank = Self::initial_bank(&spec, set_count)?;
            let name = spec.name.clone();
            if features.insert(name.clone(), SimFeature { spec, bank }).is_some() {
                return Err(DiagError::Profile(format!(
                    "duplicate feature '{}'",
                    name
                )));
            }
        }

        if let Some(selector) = features.get(&profile.device.set_selector) {
            if selector.spec.kind != FeatureKind::Integer {
                return Err(DiagError::Profile(format!(
                    "set selector '{}' must be an integer feature",
                    profile.device.set_selector
                )));
            }
        }

        Ok(Self {
            info: DeviceInfo {
                vendor_name: profile.device.vendor_name,
                model_name: profile.device.model_name,
                serial_number: profile.device.serial_number,
            },
            set_count,
            set_selector: profile.device.set_selector,
            open_error: profile.device.open_error,
            close_error: profile.device.close_error,
            is_open: false,
            features,
            executions: HashMap::new(),
        })
    }

    /// Coerce bounds to the feature kind.
    fn normalize(mut spec: FeatureSpec) -> AppResult<FeatureSpec> {
        for bound in [&mut spec.min, &mut spec.max] {
            if let Some(value) = bound.as_ref() {
                if !spec.kind.is_numeric() {
                    return Err(DiagError::Profile(format!(
                        "feature '{}': bounds only apply to numeric features",
                        spec.name
                    )));
                }
                let coerced = coerce(spec.kind, value).ok_or_else(|| {
                    DiagError::Profile(format!(
                        "feature '{}': bound {} is not {}",
                        spec.name, value, spec.kind
                    ))
                })?;
                *bound = Some(coerced);
            }
        }
        Ok(spec)
    }

    fn initial_bank(spec: &FeatureSpec, set_count: usize) -> AppResult<Vec<FeatureValue>> {
        if spec.kind == FeatureKind::Command {
            if spec.value.is_some() {
                return Err(DiagError::Profile(format!(
                    "command '{}' cannot carry a value",
                    spec.name
                )));
            }
            return Ok(Vec::new());
        }

        let value = spec.value.as_ref().ok_or_else(|| {
            DiagError::Profile(format!("feature '{}' needs an initial value", spec.name))
        })?;
        let value = coerce(spec.kind, value).ok_or_else(|| {
            DiagError::Profile(format!(
                "feature '{}': initial value {} is not {}",
                spec.name, value, spec.kind
            ))
        })?;

        if let Some(symbolic) = value.as_symbolic() {
            if !spec.options.is_empty() && !spec.options.iter().any(|o| o == symbolic) {
                return Err(DiagError::Profile(format!(
                    "feature '{}': initial value '{}' is not among its options",
                    spec.name, symbolic
                )));
            }
        }

        let banks = if spec.per_set { set_count } else { 1 };
        Ok(vec![value; banks])
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(DiagError::DeviceNotOpen)
        }
    }

    fn lookup(&self, name: &str) -> AppResult<&SimFeature> {
        self.ensure_open()?;
        self.features
            .get(name)
            .ok_or_else(|| DiagError::FeatureNotFound(name.to_string()))
    }

    /// Index of the active sequencer set, clamped into the bank.
    fn current_set(&self) -> usize {
        self.features
            .get(&self.set_selector)
            .and_then(|f| f.bank.first())
            .and_then(FeatureValue::as_i64)
            .map(|i| (i.max(0) as usize).min(self.set_count - 1))
            .unwrap_or(0)
    }

    fn bank_index(&self, spec: &FeatureSpec) -> usize {
        if spec.per_set {
            self.current_set()
        } else {
            0
        }
    }

    /// Stored value of a feature in a given sequencer set, bypassing the
    /// selector. Shared features answer the same value for every set.
    pub fn value_in_set(&self, name: &str, set: usize) -> Option<&FeatureValue> {
        let feature = self.features.get(name)?;
        let index = if feature.spec.per_set { set } else { 0 };
        feature.bank.get(index)
    }

    /// How many times a command has been executed.
    pub fn execution_count(&self, name: &str) -> usize {
        self.executions.get(name).copied().unwrap_or(0)
    }

    fn bound(
        &self,
        name: &str,
        pick: impl Fn(&FeatureSpec) -> Option<&FeatureValue>,
    ) -> AppResult<FeatureValue> {
        let feature = self.lookup(name)?;
        if !feature.spec.kind.is_numeric() {
            return Err(DiagError::TypeMismatch {
                feature: name.to_string(),
                expected: "a numeric feature".to_string(),
                found: feature.spec.kind.to_string(),
            });
        }
        if let Some(reason) = &feature.spec.range_error {
            return Err(DiagError::ReadFailed {
                feature: name.to_string(),
                reason: reason.clone(),
            });
        }
        pick(&feature.spec).cloned().ok_or_else(|| DiagError::ReadFailed {
            feature: name.to_string(),
            reason: "no bounds declared".to_string(),
        })
    }
}

impl CameraDevice for SimulatedCamera {
    fn open(&mut self) -> AppResult<()> {
        if self.is_open {
            return Ok(());
        }
        if let Some(reason) = &self.open_error {
            return Err(DiagError::Connection(reason.clone()));
        }
        self.is_open = true;
        info!(model = %self.info.model_name, serial = %self.info.serial_number, "Simulated camera opened");
        Ok(())
    }

    fn close(&mut self) -> AppResult<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        info!(model = %self.info.model_name, "Simulated camera closed");
        match &self.close_error {
            Some(reason) => Err(DiagError::Connection(reason.clone())),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn device_info(&self) -> AppResult<DeviceInfo> {
        Ok(self.info.clone())
    }

    fn feature_access(&self, name: &str) -> FeatureAccess {
        if !self.is_open {
            return FeatureAccess::NotFound;
        }
        match self.features.get(name) {
            None => FeatureAccess::NotFound,
            Some(f) if f.spec.read_only => FeatureAccess::ReadOnly,
            Some(_) => FeatureAccess::ReadWrite,
        }
    }

    fn feature_kind(&self, name: &str) -> AppResult<FeatureKind> {
        Ok(self.lookup(name)?.spec.kind)
    }

    fn get_value(&self, name: &str) -> AppResult<FeatureValue> {
        let feature = self.lookup(name)?;
        if feature.spec.kind == FeatureKind::Command {
            return Err(DiagError::TypeMismatch {
                feature: name.to_string(),
                expected: "a feature with a value".to_string(),
                found: FeatureKind::Command.to_string(),
            });
        }
        if let Some(reason) = &feature.spec.read_error {
            return Err(DiagError::ReadFailed {
                feature: name.to_string(),
                reason: reason.clone(),
            });
        }
        let index = self.bank_index(&feature.spec);
        feature
            .bank
            .get(index)
            .cloned()
            .ok_or_else(|| DiagError::ReadFailed {
                feature: name.to_string(),
                reason: format!("no value stored for set {}", index),
            })
    }

    fn set_value(&mut self, name: &str, value: &FeatureValue) -> AppResult<()> {
        self.ensure_open()?;
        let set = self.current_set();
        let feature = self
            .features
            .get_mut(name)
            .ok_or_else(|| DiagError::FeatureNotFound(name.to_string()))?;
        let spec = &feature.spec;

        if spec.kind == FeatureKind::Command {
            return Err(DiagError::TypeMismatch {
                feature: name.to_string(),
                expected: "a feature with a value".to_string(),
                found: FeatureKind::Command.to_string(),
            });
        }
        if spec.read_only {
            return Err(DiagError::NotWritable(name.to_string()));
        }
        if let Some(reason) = &spec.write_error {
            return Err(DiagError::WriteFailed {
                feature: name.to_string(),
                reason: reason.clone(),
            });
        }

        let coerced = coerce(spec.kind, value).ok_or_else(|| DiagError::TypeMismatch {
            feature: name.to_string(),
            expected: spec.kind.to_string(),
            found: value.kind().to_string(),
        })?;

        if let (Some(v), Some(min), Some(max)) = (
            coerced.as_f64(),
            spec.min.as_ref().and_then(FeatureValue::as_f64),
            spec.max.as_ref().and_then(FeatureValue::as_f64),
        ) {
            if v < min || v > max {
                return Err(DiagError::OutOfRange {
                    feature: name.to_string(),
                    value: coerced.to_string(),
                    min: spec.min.as_ref().map(ToString::to_string).unwrap_or_default(),
                    max: spec.max.as_ref().map(ToString::to_string).unwrap_or_default(),
                });
            }
        }

        if let Some(symbolic) = coerced.as_symbolic() {
            if !spec.options.iter().any(|o| o == symbolic) {
                return Err(DiagError::InvalidSymbolic {
                    feature: name.to_string(),
                    value: symbolic.to_string(),
                });
            }
        }

        if spec
            .rejected
            .iter()
            .any(|r| coerce(spec.kind, r).as_ref() == Some(&coerced))
        {
            return Err(DiagError::WriteFailed {
                feature: name.to_string(),
                reason: "value rejected by device".to_string(),
            });
        }

        let index = if spec.per_set { set } else { 0 };
        debug!(feature = name, value = %coerced, set = index, "Simulated write");
        match feature.bank.get_mut(index) {
            Some(slot) => {
                *slot = coerced;
                Ok(())
            }
            None => Err(DiagError::WriteFailed {
                feature: name.to_string(),
                reason: format!("no storage for set {}", index),
            }),
        }
    }

    fn get_min(&self, name: &str) -> AppResult<FeatureValue> {
        self.bound(name, |spec| spec.min.as_ref())
    }

    fn get_max(&self, name: &str) -> AppResult<FeatureValue> {
        self.bound(name, |spec| spec.max.as_ref())
    }

    fn get_symbolics(&self, name: &str) -> AppResult<Vec<String>> {
        let feature = self.lookup(name)?;
        if feature.spec.kind != FeatureKind::Enumeration {
            return Err(DiagError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Enumeration.to_string(),
                found: feature.spec.kind.to_string(),
            });
        }
        if let Some(reason) = &feature.spec.options_error {
            return Err(DiagError::ReadFailed {
                feature: name.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(feature.spec.options.clone())
    }

    fn execute(&mut self, name: &str) -> AppResult<()> {
        let feature = self.lookup(name)?;
        if feature.spec.kind != FeatureKind::Command {
            return Err(DiagError::TypeMismatch {
                feature: name.to_string(),
                expected: FeatureKind::Command.to_string(),
                found: feature.spec.kind.to_string(),
            });
        }
        if feature.spec.read_only {
            return Err(DiagError::NotWritable(name.to_string()));
        }
        if let Some(reason) = &feature.spec.write_error {
            return Err(DiagError::CommandFailed {
                feature: name.to_string(),
                reason: reason.clone(),
            });
        }
        debug!(feature = name, "Simulated command executed");
        *self.executions.entry(name.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
