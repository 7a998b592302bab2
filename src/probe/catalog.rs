//! Feature names and the parameter lists each diagnostic inspects.

use super::{Criticality, ParameterDescriptor};
use crate::device::FeatureKind;
use Criticality::{Critical, Informational};
use FeatureKind::{Command, Enumeration, Float, Integer};

/// Sequencer on/off switch
pub const SEQUENCER_MODE: &str = "SequencerMode";
/// Sequencer configuration mode switch
pub const SEQUENCER_CONFIGURATION_MODE: &str = "SequencerConfigurationMode";
/// Selects the sequencer set addressed by per-set features
pub const SEQUENCER_SET_SELECTOR: &str = "SequencerSetSelector";
/// Selects the branch path of the current set
pub const SEQUENCER_PATH_SELECTOR: &str = "SequencerPathSelector";
/// Set the current path leads to
pub const SEQUENCER_SET_NEXT: &str = "SequencerSetNext";
/// Trigger that advances along the current path
pub const SEQUENCER_TRIGGER_SOURCE: &str = "SequencerTriggerSource";
/// Selects the software signal addressed by the pulse command
pub const SOFTWARE_SIGNAL_SELECTOR: &str = "SoftwareSignalSelector";
/// Fires the selected software signal
pub const SOFTWARE_SIGNAL_PULSE: &str = "SoftwareSignalPulse";
/// Exposure control mode
pub const EXPOSURE_MODE: &str = "ExposureMode";
/// Pixel format
pub const PIXEL_FORMAT: &str = "PixelFormat";

/// Parameters that must both be present for dual-profile path branching.
pub const PATH_BRANCHING_REQUIREMENTS: [&str; 2] = [SEQUENCER_MODE, SEQUENCER_PATH_SELECTOR];

/// Software signals used to switch between the two HDR profiles.
pub const PROFILE_SWITCH_SIGNALS: [&str; 2] = ["SoftwareSignal1", "SoftwareSignal2"];

/// Fields snapshotted for every sequencer set by the state inspection.
pub const SEQUENCER_STATE_FIELDS: [&str; 5] = [
    "ExposureTime",
    PIXEL_FORMAT,
    "Width",
    "Height",
    SEQUENCER_SET_NEXT,
];

const PATH_FEATURES: [(&str, FeatureKind, Criticality); 11] = [
    (SEQUENCER_MODE, Enumeration, Critical),
    (SEQUENCER_CONFIGURATION_MODE, Enumeration, Informational),
    (SEQUENCER_SET_SELECTOR, Integer, Informational),
    (SEQUENCER_PATH_SELECTOR, Integer, Critical),
    (SEQUENCER_SET_NEXT, Integer, Informational),
    (SEQUENCER_TRIGGER_SOURCE, Enumeration, Informational),
    ("SequencerSetStart", Integer, Informational),
    ("SequencerSetLoad", Command, Informational),
    ("SequencerSetSave", Command, Informational),
    (SOFTWARE_SIGNAL_SELECTOR, Enumeration, Informational),
    (SOFTWARE_SIGNAL_PULSE, Command, Informational),
];

const SIGNAL_FEATURES: [(&str, FeatureKind); 8] = [
    (SOFTWARE_SIGNAL_SELECTOR, Enumeration),
    (SOFTWARE_SIGNAL_PULSE, Command),
    ("SoftwareSignal1", Command),
    ("SoftwareSignal2", Command),
    (SEQUENCER_TRIGGER_SOURCE, Enumeration),
    ("SequencerTriggerActivation", Enumeration),
    ("TriggerSoftware", Command),
    ("SoftwareTriggerExecute", Command),
];

const SEQUENCER_PARAMETERS: [(&str, FeatureKind); 14] = [
    ("Width", Integer),
    ("Height", Integer),
    (PIXEL_FORMAT, Enumeration),
    ("Gain", Float),
    ("GainRaw", Integer),
    ("BlackLevel", Float),
    ("Gamma", Float),
    ("ExposureTime", Float),
    ("BinningHorizontal", Integer),
    ("BinningVertical", Integer),
    ("DecimationHorizontal", Integer),
    ("DecimationVertical", Integer),
    ("OffsetX", Integer),
    ("OffsetY", Integer),
];

/// Sequencer features relevant to path branching.
pub fn path_features() -> Vec<ParameterDescriptor> {
    PATH_FEATURES
        .iter()
        .map(|&(name, kind, criticality)| ParameterDescriptor {
            name: name.to_string(),
            kind,
            criticality,
        })
        .collect()
}

/// Software signal and trigger features.
pub fn signal_features() -> Vec<ParameterDescriptor> {
    SIGNAL_FEATURES
        .iter()
        .map(|&(name, kind)| ParameterDescriptor::informational(name, kind))
        .collect()
}

/// Image and exposure parameters that may be stored per sequencer set.
pub fn sequencer_parameters() -> Vec<ParameterDescriptor> {
    SEQUENCER_PARAMETERS
        .iter()
        .map(|&(name, kind)| ParameterDescriptor::informational(name, kind))
        .collect()
}

/// Names of [`sequencer_parameters`], in order.
pub fn sequencer_parameter_names() -> Vec<&'static str> {
    SEQUENCER_PARAMETERS.iter().map(|&(name, _)| name).collect()
}
