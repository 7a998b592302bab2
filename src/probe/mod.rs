//! Capability discovery against a camera's named feature space.
//!
//! - [`capability`]: batch probing of named parameters into a [`CapabilityReport`]
//! - [`settability`]: bounded write tests on a single parameter
//! - [`comparator`]: per-set vs shared classification of sequencer parameters
//! - [`sequencer`]: sequencer configuration scope and per-set state snapshots
//! - [`signals`]: software signal selection and trigger-source checks
//! - [`catalog`]: the fixed parameter lists the diagnostics inspect

use serde::Serialize;

use crate::device::{FeatureKind, FeatureValue};

pub mod capability;
pub mod catalog;
pub mod comparator;
pub mod sequencer;
pub mod settability;
pub mod signals;

pub use capability::probe;
pub use comparator::{compare_sets, ComparisonPlan, CrossSetReport, Sharing};
pub use sequencer::{inspect_sequencer, ConfigurationScope, SequencerStateReport};
pub use settability::{candidate_range, test_write, RestoreStatus, SettabilityOutcome};
pub use signals::{check_software_signals, SignalCheckReport};

/// How much a parameter matters to the capability verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    /// Required for a higher-level capability
    Critical,
    /// Reported for context only
    Informational,
}

/// A named parameter of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    /// Feature name on the device
    pub name: String,
    /// Expected interface type
    pub kind: FeatureKind,
    /// Weight in the capability verdict
    pub criticality: Criticality,
}

impl ParameterDescriptor {
    /// Descriptor of a critical parameter.
    pub fn critical(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            criticality: Criticality::Critical,
        }
    }

    /// Descriptor of an informational parameter.
    pub fn informational(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            criticality: Criticality::Informational,
        }
    }
}

/// Which sub-probe of a parameter failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStage {
    /// Interface type lookup
    Kind,
    /// Current value read
    Value,
    /// Min/max read
    Range,
    /// Symbolic list read
    Options,
}

impl ProbeStage {
    /// Human-readable stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStage::Kind => "kind",
            ProbeStage::Value => "value",
            ProbeStage::Range => "range",
            ProbeStage::Options => "options",
        }
    }
}

/// A failed sub-probe, kept as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeFault {
    /// Failing stage
    pub stage: ProbeStage,
    /// Error message from the device
    pub message: String,
}

/// What was learned about one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterProbeResult {
    /// Feature name
    pub name: String,
    /// Interface type as reported by the device, or the expected one when unknown
    pub kind: FeatureKind,
    /// Criticality from the descriptor
    pub criticality: Criticality,
    /// The name resolved on the device
    pub found: bool,
    /// The value can be read
    pub readable: bool,
    /// The value can be written
    pub writable: bool,
    /// Current value, when read successfully
    pub current_value: Option<FeatureValue>,
    /// Declared bounds of numeric parameters
    pub range: Option<(FeatureValue, FeatureValue)>,
    /// Ordered symbolics of enumeration parameters
    pub enum_options: Option<Vec<String>>,
    /// Sub-probes that failed
    pub faults: Vec<ProbeFault>,
}

impl ParameterProbeResult {
    /// Result for a parameter that did not resolve.
    pub fn missing(descriptor: &ParameterDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            criticality: descriptor.criticality,
            found: false,
            readable: false,
            writable: false,
            current_value: None,
            range: None,
            enum_options: None,
            faults: Vec::new(),
        }
    }

    /// Whether this parameter counts towards capability verdicts.
    pub fn is_critical(&self) -> bool {
        self.criticality == Criticality::Critical
    }

    /// Integer bounds, when the range holds integers.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        let (min, max) = self.range.as_ref()?;
        Some((min.as_i64()?, max.as_i64()?))
    }
}

/// Level of sequencer support for dual HDR profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathBranchingSupport {
    /// Sequencer mode and path selector both available
    Full,
    /// Sequencer mode available, path selector missing (single profile only)
    SequencerOnly,
    /// No usable sequencer
    Unsupported,
}

impl PathBranchingSupport {
    /// Whether dual profiles with path branching are possible.
    pub fn supports_path_branching(&self) -> bool {
        matches!(self, PathBranchingSupport::Full)
    }

    /// Whether only part of the capability is present.
    pub fn is_partial(&self) -> bool {
        matches!(self, PathBranchingSupport::SequencerOnly)
    }
}

/// Ordered probe results for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityReport {
    /// One entry per probed descriptor, in input order
    pub results: Vec<ParameterProbeResult>,
}

impl CapabilityReport {
    /// Result for a parameter name.
    pub fn get(&self, name: &str) -> Option<&ParameterProbeResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Whether a parameter resolved.
    pub fn is_found(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| r.found)
    }

    /// Names of the critical parameters that resolved, in probe order.
    pub fn critical_found(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|r| r.found && r.is_critical())
            .map(|r| r.name.as_str())
    }

    /// Whether every named parameter resolved and is critical.
    pub fn supports(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|name| self.get(name).is_some_and(|r| r.found && r.is_critical()))
    }

    /// Classify sequencer path-branching support.
    pub fn path_branching(&self) -> PathBranchingSupport {
        if self.supports(&catalog::PATH_BRANCHING_REQUIREMENTS) {
            PathBranchingSupport::Full
        } else if self.supports(&[catalog::SEQUENCER_MODE]) {
            PathBranchingSupport::SequencerOnly
        } else {
            PathBranchingSupport::Unsupported
        }
    }

    /// Shorthand for `path_branching().supports_path_branching()`.
    pub fn supports_path_branching(&self) -> bool {
        self.path_branching().supports_path_branching()
    }

    /// Number of parameters that resolved.
    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|r| r.found).count()
    }
}
