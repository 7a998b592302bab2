//! Per-set vs shared classification of sequencer parameters.
//!
//! A test value is written to each parameter under set A; the parameter is
//! then read under set B. Reading back the written value means the parameter
//! is shared by all sets, anything else means every set stores its own value.
//! Originals are written back under set A and the sequencer is returned to its
//! starting state whatever happened in between.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::sequencer::ConfigurationScope;
use crate::config::ProbeConfig;
use crate::device::{CameraDevice, FeatureValue};
use crate::error::AppResult;

/// Storage class of a sequencer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sharing {
    /// One value for every set
    Shared,
    /// Stored per set
    Independent,
}

/// Classify a read-back against the value written under the other set.
pub fn classify(written: &FeatureValue, observed: &FeatureValue) -> Sharing {
    if written == observed {
        Sharing::Shared
    } else {
        Sharing::Independent
    }
}

/// Which sets to compare and which values to try.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPlan {
    /// Set that receives the test writes
    pub set_a: i64,
    /// Set that is read back
    pub set_b: i64,
    /// Preferred test values per parameter
    pub test_values: BTreeMap<String, Vec<FeatureValue>>,
}

impl ComparisonPlan {
    /// Plan from the probe configuration.
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            set_a: config.compare_set_a,
            set_b: config.compare_set_b,
            test_values: config.test_values.clone(),
        }
    }

    fn preferred(&self, name: &str, original: &FeatureValue) -> Option<FeatureValue> {
        self.test_values
            .get(name)?
            .iter()
            .find(|v| *v != original)
            .cloned()
    }
}

/// A parameter readable before the comparison started.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableParameter {
    /// Parameter name
    pub name: String,
    /// Value before the comparison
    pub value: FeatureValue,
    /// Whether writes are allowed
    pub writable: bool,
}

/// Why a parameter could not be classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "error", rename_all = "snake_case")]
pub enum UntestedReason {
    /// Writes are not allowed
    ReadOnly,
    /// No value different from the original was found
    NoAlternative,
    /// The device refused the test value
    WriteRejected(String),
    /// The comparison stopped before the read-back
    NotReadBack,
    /// Reading under set B failed
    ReadBackFailed(String),
    /// Reading the set A value before the write failed
    OriginalUnreadable(String),
}

impl fmt::Display for UntestedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UntestedReason::ReadOnly => f.write_str("read-only"),
            UntestedReason::NoAlternative => f.write_str("no alternative value"),
            UntestedReason::WriteRejected(e) => write!(f, "could not modify: {}", e),
            UntestedReason::NotReadBack => f.write_str("not read back"),
            UntestedReason::ReadBackFailed(e) => write!(f, "could not read back: {}", e),
            UntestedReason::OriginalUnreadable(e) => write!(f, "could not read original: {}", e),
        }
    }
}

/// Result of comparing one parameter across the two sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// Written and read back
    Compared(Sharing),
    /// Could not be classified
    Untested(UntestedReason),
}

/// Per-parameter comparison record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetComparison {
    /// Parameter name
    pub name: String,
    /// Value stored in set A before the test write
    pub original: FeatureValue,
    /// Value written under set A, when the write succeeded
    pub written: Option<FeatureValue>,
    /// Value read under set B
    pub observed: Option<FeatureValue>,
    /// Classification
    pub outcome: ComparisonOutcome,
}

impl SetComparison {
    /// Classification, when the parameter was compared.
    pub fn sharing(&self) -> Option<Sharing> {
        match self.outcome {
            ComparisonOutcome::Compared(sharing) => Some(sharing),
            ComparisonOutcome::Untested(_) => None,
        }
    }
}

/// Outcome of a cross-set comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSetReport {
    /// Set that received the writes
    pub set_a: i64,
    /// Set that was read back
    pub set_b: i64,
    /// Parameters readable before the comparison
    pub available: Vec<AvailableParameter>,
    /// Parameters that could not be read
    pub unavailable: Vec<String>,
    /// One record per available parameter, in order
    pub comparisons: Vec<SetComparison>,
    /// Why the comparison could not run, when it could not
    pub aborted: Option<String>,
    /// Restoration steps that failed
    pub restoration_errors: Vec<String>,
}

impl CrossSetReport {
    /// Names of parameters classified as shared.
    pub fn shared(&self) -> impl Iterator<Item = &str> {
        self.comparisons
            .iter()
            .filter(|c| c.sharing() == Some(Sharing::Shared))
            .map(|c| c.name.as_str())
    }

    /// Record for a parameter.
    pub fn comparison(&self, name: &str) -> Option<&SetComparison> {
        self.comparisons.iter().find(|c| c.name == name)
    }
}

/// Classify `parameters` as shared or per-set by writing under `plan.set_a`
/// and reading under `plan.set_b`.
///
/// Failing to enter configuration mode or to select a set aborts the
/// comparison; the reason is kept on the report. Only fatal device errors
/// are returned as `Err`.
pub fn compare_sets(
    device: &mut dyn CameraDevice,
    parameters: &[&str],
    plan: &ComparisonPlan,
) -> AppResult<CrossSetReport> {
    let mut report = CrossSetReport {
        set_a: plan.set_a,
        set_b: plan.set_b,
        available: Vec::new(),
        unavailable: Vec::new(),
        comparisons: Vec::new(),
        aborted: None,
        restoration_errors: Vec::new(),
    };

    for &name in parameters {
        let access = device.feature_access(name);
        if !access.is_readable() {
            report.unavailable.push(name.to_string());
            continue;
        }
        match device.get_value(name) {
            Ok(value) => report.available.push(AvailableParameter {
                name: name.to_string(),
                value,
                writable: access.is_writable(),
            }),
            Err(e) => {
                debug!(feature = name, "Not readable: {}", e);
                report.unavailable.push(name.to_string());
            }
        }
    }

    let scope = match ConfigurationScope::enter(device) {
        Ok(scope) => scope,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Sequencer comparison not possible: {}", e);
            report.aborted = Some(e.to_string());
            return Ok(report);
        }
    };

    let result = run_comparison(device, &scope, plan, &mut report);
    restore_originals(device, &scope, plan.set_a, &mut report);
    let mut exit_failures = scope.exit(device);
    report.restoration_errors.append(&mut exit_failures);

    match result {
        Ok(()) => {
            info!(
                compared = report.comparisons.iter().filter(|c| c.sharing().is_some()).count(),
                shared = report.shared().count(),
                "Cross-set comparison finished"
            );
            Ok(report)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Sequencer comparison aborted: {}", e);
            report.aborted = Some(e.to_string());
            Ok(report)
        }
    }
}

fn run_comparison(
    device: &mut dyn CameraDevice,
    scope: &ConfigurationScope,
    plan: &ComparisonPlan,
    report: &mut CrossSetReport,
) -> AppResult<()> {
    scope.select_set(device, plan.set_a)?;

    for parameter in &report.available {
        let record = if !parameter.writable {
            untested(parameter, parameter.value.clone(), None, UntestedReason::ReadOnly)
        } else {
            // the pre-scope reading belongs to whichever set was selected
            match device.get_value(&parameter.name) {
                Err(e) => untested(
                    parameter,
                    parameter.value.clone(),
                    None,
                    UntestedReason::OriginalUnreadable(e.to_string()),
                ),
                Ok(original) => match choose_test_value(device, plan, &parameter.name, &original) {
                    None => untested(parameter, original, None, UntestedReason::NoAlternative),
                    Some(value) => match device.set_value(&parameter.name, &value) {
                        Ok(()) => {
                            debug!(feature = %parameter.name, value = %value, set = plan.set_a, "Test value written");
                            untested(parameter, original, Some(value), UntestedReason::NotReadBack)
                        }
                        Err(e) => untested(
                            parameter,
                            original,
                            None,
                            UntestedReason::WriteRejected(e.to_string()),
                        ),
                    },
                },
            }
        };
        report.comparisons.push(record);
    }

    scope.select_set(device, plan.set_b)?;

    for comparison in report.comparisons.iter_mut() {
        let Some(written) = &comparison.written else {
            continue;
        };
        match device.get_value(&comparison.name) {
            Ok(observed) => {
                comparison.outcome = ComparisonOutcome::Compared(classify(written, &observed));
                comparison.observed = Some(observed);
            }
            Err(e) => {
                comparison.outcome =
                    ComparisonOutcome::Untested(UntestedReason::ReadBackFailed(e.to_string()));
            }
        }
    }

    Ok(())
}

fn untested(
    parameter: &AvailableParameter,
    original: FeatureValue,
    written: Option<FeatureValue>,
    reason: UntestedReason,
) -> SetComparison {
    SetComparison {
        name: parameter.name.clone(),
        original,
        written,
        observed: None,
        outcome: ComparisonOutcome::Untested(reason),
    }
}

/// Write originals back under set A for every parameter that was changed.
fn restore_originals(
    device: &mut dyn CameraDevice,
    scope: &ConfigurationScope,
    set_a: i64,
    report: &mut CrossSetReport,
) {
    if !report.comparisons.iter().any(|c| c.written.is_some()) {
        return;
    }
    if let Err(e) = scope.select_set(device, set_a) {
        report
            .restoration_errors
            .push(format!("cannot select set {} to restore values: {}", set_a, e));
        return;
    }
    for comparison in report.comparisons.iter().filter(|c| c.written.is_some()) {
        if let Err(e) = device.set_value(&comparison.name, &comparison.original) {
            report
                .restoration_errors
                .push(format!("{}: {}", comparison.name, e));
        }
    }
}

/// Pick a value different from `original`: a configured preference first,
/// otherwise one derived from the parameter's bounds or options.
fn choose_test_value(
    device: &dyn CameraDevice,
    plan: &ComparisonPlan,
    name: &str,
    original: &FeatureValue,
) -> Option<FeatureValue> {
    if let Some(value) = plan.preferred(name, original) {
        return Some(value);
    }
    match original {
        FeatureValue::Boolean(b) => Some(FeatureValue::Boolean(!b)),
        FeatureValue::Integer(current) => {
            let min = device.get_min(name).ok()?.as_i64()?;
            let max = device.get_max(name).ok()?.as_i64()?;
            [min, max]
                .into_iter()
                .find(|v| v != current)
                .map(FeatureValue::Integer)
        }
        FeatureValue::Float(current) => {
            let min = device.get_min(name).ok()?.as_f64()?;
            let max = device.get_max(name).ok()?.as_f64()?;
            [min, max]
                .into_iter()
                .find(|v| v != current)
                .map(FeatureValue::Float)
        }
        FeatureValue::Enumeration(current) => device
            .get_symbolics(name)
            .ok()?
            .into_iter()
            .find(|s| s != current)
            .map(FeatureValue::Enumeration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProfile, SimulatedCamera};

    const PROFILE: &str = r#"
[device]
model_name = "compare"
serial_number = "1"
sequencer_sets = 2

[[features]]
name = "SequencerMode"
kind = "enumeration"
value = "On"
options = ["Off", "On"]

[[features]]
name = "SequencerConfigurationMode"
kind = "enumeration"
value = "Off"
options = ["Off", "On"]

[[features]]
name = "SequencerSetSelector"
kind = "integer"
value = 0
min = 0
max = 1

[[features]]
name = "Width"
kind = "integer"
value = 1920
min = 376
max = 1920

[[features]]
name = "ExposureTime"
kind = "float"
value = 5000.0
min = 19.0
max = 100000.0
per_set = true

[[features]]
name = "PixelFormat"
kind = "enumeration"
value = "Mono8"
options = ["Mono8", "Mono12"]
per_set = true

[[features]]
name = "DeviceTemperature"
kind = "float"
value = 40.0
read_only = true

[[features]]
name = "Height"
kind = "integer"
value = 1200
min = 320
max = 1200
write_error = "locked while streaming"
"#;

    fn camera() -> SimulatedCamera {
        let mut cam = SimulatedCamera::new(DeviceProfile::from_toml(PROFILE).unwrap()).unwrap();
        cam.open().unwrap();
        cam
    }

    fn plan() -> ComparisonPlan {
        ComparisonPlan::from_config(&ProbeConfig::default())
    }

    #[test]
    fn test_classify() {
        let x = FeatureValue::Integer(640);
        assert_eq!(classify(&x, &FeatureValue::Integer(640)), Sharing::Shared);
        assert_eq!(classify(&x, &FeatureValue::Integer(1920)), Sharing::Independent);
    }

    #[test]
    fn test_shared_and_independent_parameters() {
        let mut cam = camera();
        let report = compare_sets(
            &mut cam,
            &["Width", "ExposureTime", "PixelFormat", "GainRaw"],
            &plan(),
        )
        .unwrap();

        assert!(report.aborted.is_none());
        assert_eq!(report.unavailable, vec!["GainRaw".to_string()]);

        let width = report.comparison("Width").unwrap();
        assert_eq!(width.written, Some(FeatureValue::Integer(640)));
        assert_eq!(width.sharing(), Some(Sharing::Shared));

        let exposure = report.comparison("ExposureTime").unwrap();
        assert_eq!(exposure.written, Some(FeatureValue::Float(100.0)));
        assert_eq!(exposure.observed, Some(FeatureValue::Float(5000.0)));
        assert_eq!(exposure.sharing(), Some(Sharing::Independent));

        let format = report.comparison("PixelFormat").unwrap();
        assert_eq!(format.written, Some(FeatureValue::symbolic("Mono12")));
        assert_eq!(format.sharing(), Some(Sharing::Independent));
    }

    #[test]
    fn test_originals_and_modes_restored() {
        let mut cam = camera();
        let report = compare_sets(&mut cam, &["Width", "ExposureTime"], &plan()).unwrap();

        assert!(report.restoration_errors.is_empty());
        assert_eq!(cam.value_in_set("Width", 0), Some(&FeatureValue::Integer(1920)));
        assert_eq!(cam.value_in_set("ExposureTime", 0), Some(&FeatureValue::Float(5000.0)));
        assert_eq!(cam.get_value("SequencerMode").unwrap(), FeatureValue::symbolic("On"));
        assert_eq!(
            cam.get_value("SequencerConfigurationMode").unwrap(),
            FeatureValue::symbolic("Off")
        );
    }

    #[test]
    fn test_set_a_restored_when_another_set_is_selected() {
        let mut cam = camera();
        cam.set_value("SequencerSetSelector", &FeatureValue::Integer(1)).unwrap();
        cam.set_value("ExposureTime", &FeatureValue::Float(7000.0)).unwrap();

        let report = compare_sets(&mut cam, &["ExposureTime"], &plan()).unwrap();

        let exposure = report.comparison("ExposureTime").unwrap();
        assert_eq!(exposure.original, FeatureValue::Float(5000.0));
        assert_eq!(exposure.observed, Some(FeatureValue::Float(7000.0)));
        assert_eq!(exposure.sharing(), Some(Sharing::Independent));
        assert!(report.restoration_errors.is_empty());
        assert_eq!(cam.value_in_set("ExposureTime", 0), Some(&FeatureValue::Float(5000.0)));
        assert_eq!(cam.value_in_set("ExposureTime", 1), Some(&FeatureValue::Float(7000.0)));
        assert_eq!(cam.get_value("SequencerSetSelector").unwrap(), FeatureValue::Integer(1));
    }

    #[test]
    fn test_unwritable_parameters_are_untested() {
        let mut cam = camera();
        let report = compare_sets(&mut cam, &["DeviceTemperature", "Height"], &plan()).unwrap();

        for comparison in &report.comparisons {
            assert!(comparison.sharing().is_none());
            assert!(comparison.written.is_none());
        }
        match &report.comparison("Height").unwrap().outcome {
            ComparisonOutcome::Untested(UntestedReason::WriteRejected(e)) => {
                assert!(e.contains("locked while streaming"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_preference_equal_to_original_falls_through() {
        let mut cam = camera();
        cam.set_value("Width", &FeatureValue::Integer(640)).unwrap();
        let report = compare_sets(&mut cam, &["Width"], &plan()).unwrap();
        assert_eq!(
            report.comparison("Width").unwrap().written,
            Some(FeatureValue::Integer(800))
        );
    }

    #[test]
    fn test_missing_sequencer_aborts_but_lists_availability() {
        let text = "[device]\nmodel_name = \"x\"\nserial_number = \"y\"\n\n[[features]]\nname = \"Width\"\nkind = \"integer\"\nvalue = 100\n";
        let mut cam = SimulatedCamera::new(DeviceProfile::from_toml(text).unwrap()).unwrap();
        cam.open().unwrap();

        let report = compare_sets(&mut cam, &["Width", "Height"], &plan()).unwrap();
        assert_eq!(report.available.len(), 1);
        assert!(report.comparisons.is_empty());
        assert!(report.aborted.as_deref().unwrap().contains("SequencerMode"));
    }

    #[test]
    fn test_unselectable_set_b_still_restores() {
        let mut cam = camera();
        let mut plan = plan();
        plan.set_b = 7;
        let report = compare_sets(&mut cam, &["ExposureTime"], &plan).unwrap();

        assert!(report.aborted.is_some());
        assert_eq!(cam.value_in_set("ExposureTime", 0), Some(&FeatureValue::Float(5000.0)));
        assert_eq!(
            cam.get_value("SequencerConfigurationMode").unwrap(),
            FeatureValue::symbolic("Off")
        );
    }
}
