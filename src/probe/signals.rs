//! Software signal selection and sequencer trigger-source checks.
//!
//! Switching between two HDR profiles at runtime needs software signals that
//! can be selected and pulsed, and a sequencer trigger source driven by them.

use serde::Serialize;
use tracing::{debug, warn};

use super::catalog::{SEQUENCER_TRIGGER_SOURCE, SOFTWARE_SIGNAL_PULSE, SOFTWARE_SIGNAL_SELECTOR};
use crate::device::{CameraDevice, FeatureKind, FeatureValue};
use crate::error::AppResult;

/// Substrings marking a trigger source as driven by software.
pub const SOFTWARE_SOURCE_MARKERS: [&str; 2] = ["Software", "Signal"];

/// Whether a trigger source can be fired from software to switch profiles.
pub fn is_suited_for_profile_switching(source: &str) -> bool {
    SOFTWARE_SOURCE_MARKERS
        .iter()
        .any(|marker| source.contains(marker))
}

/// Result of selecting one software signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSelection {
    /// Signal requested
    pub signal: String,
    /// Selector value read back
    pub selected: Option<FeatureValue>,
    /// Selection failure
    pub error: Option<String>,
}

/// Outcome of the software signal switching check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwitchingCheck {
    /// Selector or pulse feature missing
    Unavailable,
    /// Signals enumerated and selected
    Checked {
        /// Symbolics of the selector
        available_signals: Vec<String>,
        /// One entry per requested signal present on the device
        selections: Vec<SignalSelection>,
        /// The pulse feature is an executable command
        pulse_executable: bool,
        /// Failure writing the original selector value back
        restore_error: Option<String>,
    },
    /// The check itself failed
    Failed {
        /// Error message
        error: String,
    },
}

/// A sequencer trigger source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerSource {
    /// Symbolic name
    pub name: String,
    /// Can be fired from software
    pub suited_for_profile_switching: bool,
}

/// Outcome of the trigger-source listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerSourceCheck {
    /// No sequencer trigger source feature
    Unavailable,
    /// Sources in device order
    Listed {
        /// Sources
        sources: Vec<TriggerSource>,
    },
    /// Listing failed
    Failed {
        /// Error message
        error: String,
    },
}

/// Software signal checks for HDR profile switching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalCheckReport {
    /// Signal selection and pulse availability
    pub switching: SwitchingCheck,
    /// Sequencer trigger sources
    pub trigger_sources: TriggerSourceCheck,
}

/// Select each of `signals` that the device offers, then list the sequencer
/// trigger sources. The selector is returned to its original value.
pub fn check_software_signals(device: &mut dyn CameraDevice, signals: &[&str]) -> SignalCheckReport {
    let switching = if device.feature_access(SOFTWARE_SIGNAL_SELECTOR).is_found()
        && device.feature_access(SOFTWARE_SIGNAL_PULSE).is_found()
    {
        check_switching(device, signals).unwrap_or_else(|e| {
            warn!("Software signal check failed: {}", e);
            SwitchingCheck::Failed {
                error: e.to_string(),
            }
        })
    } else {
        SwitchingCheck::Unavailable
    };

    let trigger_sources = if device.feature_access(SEQUENCER_TRIGGER_SOURCE).is_found() {
        match device.get_symbolics(SEQUENCER_TRIGGER_SOURCE) {
            Ok(names) => TriggerSourceCheck::Listed {
                sources: names
                    .into_iter()
                    .map(|name| TriggerSource {
                        suited_for_profile_switching: is_suited_for_profile_switching(&name),
                        name,
                    })
                    .collect(),
            },
            Err(e) => TriggerSourceCheck::Failed {
                error: e.to_string(),
            },
        }
    } else {
        TriggerSourceCheck::Unavailable
    };

    SignalCheckReport {
        switching,
        trigger_sources,
    }
}

fn check_switching(device: &mut dyn CameraDevice, signals: &[&str]) -> AppResult<SwitchingCheck> {
    let available_signals = device.get_symbolics(SOFTWARE_SIGNAL_SELECTOR)?;
    let original = device.get_value(SOFTWARE_SIGNAL_SELECTOR).ok();

    let mut selections = Vec::new();
    for &signal in signals {
        if !available_signals.iter().any(|s| s == signal) {
            debug!(signal, "Signal not offered by selector");
            continue;
        }
        let selection = match device
            .set_value(SOFTWARE_SIGNAL_SELECTOR, &FeatureValue::symbolic(signal))
            .and_then(|()| device.get_value(SOFTWARE_SIGNAL_SELECTOR))
        {
            Ok(selected) => SignalSelection {
                signal: signal.to_string(),
                selected: Some(selected),
                error: None,
            },
            Err(e) => SignalSelection {
                signal: signal.to_string(),
                selected: None,
                error: Some(e.to_string()),
            },
        };
        selections.push(selection);
    }

    let pulse_executable = device.feature_access(SOFTWARE_SIGNAL_PULSE).is_writable()
        && device.feature_kind(SOFTWARE_SIGNAL_PULSE)? == FeatureKind::Command;

    let restore_error = match &original {
        Some(value) if !selections.is_empty() => device
            .set_value(SOFTWARE_SIGNAL_SELECTOR, value)
            .err()
            .map(|e| e.to_string()),
        _ => None,
    };

    Ok(SwitchingCheck::Checked {
        available_signals,
        selections,
        pulse_executable,
        restore_error,
    })
}
