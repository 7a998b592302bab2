//! Sequencer configuration scope and per-set state snapshots.
//!
//! Per-set values can only be addressed while `SequencerConfigurationMode` is
//! `On`, and configuration mode can only be entered while `SequencerMode` is
//! `Off`. [`ConfigurationScope`] records what it changed on the way in and
//! undoes it on the way out.

use serde::Serialize;
use tracing::{debug, warn};

use super::catalog::{
    EXPOSURE_MODE, PIXEL_FORMAT, SEQUENCER_CONFIGURATION_MODE, SEQUENCER_MODE,
    SEQUENCER_SET_SELECTOR, SEQUENCER_TRIGGER_SOURCE,
};
use crate::device::{CameraDevice, FeatureValue};
use crate::error::AppResult;

const ON: &str = "On";
const OFF: &str = "Off";

/// Sequencer configuration mode entered from a known starting state.
///
/// Must be closed with [`ConfigurationScope::exit`] on every path, including
/// after the work inside the scope failed.
#[derive(Debug)]
pub struct ConfigurationScope {
    original_mode: FeatureValue,
    original_set: Option<FeatureValue>,
}

impl ConfigurationScope {
    /// Turn the sequencer off if it was on and enter configuration mode.
    ///
    /// On failure the sequencer mode is put back before returning.
    pub fn enter(device: &mut dyn CameraDevice) -> AppResult<Self> {
        let original_mode = device.get_value(SEQUENCER_MODE)?;
        let original_set = device.get_value(SEQUENCER_SET_SELECTOR).ok();

        if original_mode.as_symbolic() == Some(ON) {
            debug!("Turning sequencer off for configuration");
            device.set_value(SEQUENCER_MODE, &FeatureValue::symbolic(OFF))?;
        }

        if let Err(e) = device.set_value(SEQUENCER_CONFIGURATION_MODE, &FeatureValue::symbolic(ON)) {
            if let Err(restore_err) = device.set_value(SEQUENCER_MODE, &original_mode) {
                warn!("Failed to restore SequencerMode: {}", restore_err);
            }
            return Err(e);
        }

        Ok(Self {
            original_mode,
            original_set,
        })
    }

    /// Select the set addressed by per-set features.
    pub fn select_set(&self, device: &mut dyn CameraDevice, index: i64) -> AppResult<()> {
        device.set_value(SEQUENCER_SET_SELECTOR, &FeatureValue::Integer(index))
    }

    /// Leave configuration mode and restore the state found on entry.
    ///
    /// Every step is attempted; the failures are returned as messages.
    pub fn exit(self, device: &mut dyn CameraDevice) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(set) = &self.original_set {
            if let Err(e) = device.set_value(SEQUENCER_SET_SELECTOR, set) {
                failures.push(format!("{}: {}", SEQUENCER_SET_SELECTOR, e));
            }
        }
        if let Err(e) = device.set_value(SEQUENCER_CONFIGURATION_MODE, &FeatureValue::symbolic(OFF)) {
            failures.push(format!("{}: {}", SEQUENCER_CONFIGURATION_MODE, e));
        }
        let current_mode = device.get_value(SEQUENCER_MODE).ok();
        if current_mode.as_ref() != Some(&self.original_mode) {
            if let Err(e) = device.set_value(SEQUENCER_MODE, &self.original_mode) {
                failures.push(format!("{}: {}", SEQUENCER_MODE, e));
            }
        }

        for failure in &failures {
            warn!("Sequencer restoration failed: {}", failure);
        }
        failures
    }
}

/// A named value read from the device, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReading {
    /// Feature name
    pub name: String,
    /// Value, when read
    pub value: Option<FeatureValue>,
    /// Read failure
    pub error: Option<String>,
}

impl FieldReading {
    /// Read one feature.
    pub fn read(device: &dyn CameraDevice, name: &str) -> Self {
        match device.get_value(name) {
            Ok(value) => Self {
                name: name.to_string(),
                value: Some(value),
                error: None,
            },
            Err(e) => Self {
                name: name.to_string(),
                value: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Field values of one sequencer set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetSnapshot {
    /// Set index
    pub index: i64,
    /// Readings in field order
    pub fields: Vec<FieldReading>,
}

/// Sequencer state before, during and after a walk over the sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencerStateReport {
    /// Sequencer and configuration mode before any change
    pub initial: Vec<FieldReading>,
    /// Pixel format outside the sequencer
    pub original_pixel_format: FieldReading,
    /// Snapshots of the sets that could be selected
    pub sets: Vec<SetSnapshot>,
    /// Failure that stopped the walk
    pub walk_error: Option<String>,
    /// Restoration steps that failed
    pub restoration_errors: Vec<String>,
    /// Sequencer mode, pixel format and exposure mode afterwards
    pub final_state: Vec<FieldReading>,
    /// Trigger that advances the sequencer
    pub trigger_source: FieldReading,
}

/// Snapshot `fields` in sets `0..set_count` inside configuration mode, then
/// restore the sequencer.
pub fn inspect_sequencer(
    device: &mut dyn CameraDevice,
    set_count: i64,
    fields: &[&str],
) -> SequencerStateReport {
    let initial = vec![
        FieldReading::read(device, SEQUENCER_MODE),
        FieldReading::read(device, SEQUENCER_CONFIGURATION_MODE),
    ];
    let original_pixel_format = FieldReading::read(device, PIXEL_FORMAT);

    let mut sets = Vec::new();
    let mut walk_error = None;
    let mut restoration_errors = Vec::new();

    match ConfigurationScope::enter(device) {
        Ok(scope) => {
            for index in 0..set_count {
                if let Err(e) = scope.select_set(device, index) {
                    warn!(set = index, "Cannot select sequencer set: {}", e);
                    walk_error = Some(e.to_string());
                    break;
                }
                let fields = fields
                    .iter()
                    .map(|name| FieldReading::read(device, name))
                    .collect();
                sets.push(SetSnapshot { index, fields });
            }
            restoration_errors = scope.exit(device);
        }
        Err(e) => {
            warn!("Cannot enter sequencer configuration mode: {}", e);
            walk_error = Some(e.to_string());
        }
    }

    let mut final_state = vec![
        FieldReading::read(device, SEQUENCER_MODE),
        FieldReading::read(device, PIXEL_FORMAT),
    ];
    if device.feature_access(EXPOSURE_MODE).is_readable() {
        final_state.push(FieldReading::read(device, EXPOSURE_MODE));
    }

    SequencerStateReport {
        initial,
        original_pixel_format,
        sets,
        walk_error,
        restoration_errors,
        final_state,
        trigger_source: FieldReading::read(device, SEQUENCER_TRIGGER_SOURCE),
    }
}
