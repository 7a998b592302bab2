//! Batch probing of named parameters.
//!
//! Every descriptor yields exactly one result. A sub-probe that fails (kind,
//! value, range or options) is recorded on the result as a [`ProbeFault`] and
//! the remaining sub-probes still run.

use std::fmt::Display;

use tracing::{debug, warn};

use super::{CapabilityReport, ParameterDescriptor, ParameterProbeResult, ProbeFault, ProbeStage};
use crate::device::{CameraDevice, FeatureKind};

/// Probe each descriptor against an open device, preserving input order.
pub fn probe(device: &dyn CameraDevice, descriptors: &[ParameterDescriptor]) -> CapabilityReport {
    let results = descriptors
        .iter()
        .map(|descriptor| probe_one(device, descriptor))
        .collect();
    CapabilityReport { results }
}

fn probe_one(device: &dyn CameraDevice, descriptor: &ParameterDescriptor) -> ParameterProbeResult {
    let name = descriptor.name.as_str();
    let mut result = ParameterProbeResult::missing(descriptor);

    let access = device.feature_access(name);
    if !access.is_found() {
        debug!(feature = name, "Feature not found");
        return result;
    }
    result.found = true;
    result.readable = access.is_readable();
    result.writable = access.is_writable();

    result.kind = match device.feature_kind(name) {
        Ok(kind) => {
            if kind != descriptor.kind {
                debug!(
                    feature = name,
                    expected = %descriptor.kind,
                    reported = %kind,
                    "Feature kind differs from expectation"
                );
            }
            kind
        }
        Err(e) => {
            record(&mut result, ProbeStage::Kind, e);
            descriptor.kind
        }
    };

    if result.readable && result.kind != FeatureKind::Command {
        match device.get_value(name) {
            Ok(value) => result.current_value = Some(value),
            Err(e) => record(&mut result, ProbeStage::Value, e),
        }
    }

    if result.kind.is_numeric() {
        match (device.get_min(name), device.get_max(name)) {
            (Ok(min), Ok(max)) => result.range = Some((min, max)),
            (Err(e), _) | (_, Err(e)) => record(&mut result, ProbeStage::Range, e),
        }
    }

    if result.kind == FeatureKind::Enumeration {
        match device.get_symbolics(name) {
            Ok(options) => result.enum_options = Some(options),
            Err(e) => record(&mut result, ProbeStage::Options, e),
        }
    }

    result
}

fn record(result: &mut ParameterProbeResult, stage: ProbeStage, error: impl Display) {
    let message = error.to_string();
    warn!(feature = %result.name, stage = stage.as_str(), "Probe failed: {}", message);
    result.faults.push(ProbeFault { stage, message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProfile, FeatureValue, SimulatedCamera};
    use crate::probe::{catalog, PathBranchingSupport};

    const PROFILE: &str = r#"
[device]
model_name = "probe-cam"
serial_number = "1"

[[features]]
name = "SequencerMode"
kind = "enumeration"
value = "Off"
options = ["Off", "On"]

[[features]]
name = "SequencerPathSelector"
kind = "integer"
value = 0
min = 0
max = 1

[[features]]
name = "Gain"
kind = "float"
value = 2.5
min = 0.0
max = 24.0
range_error = "bounds locked"

[[features]]
name = "Gamma"
kind = "float"
value = 1.0
read_error = "busy"
min = 0.0
max = 4.0

[[features]]
name = "SequencerSetSave"
kind = "command"
"#;

    fn camera(text: &str) -> SimulatedCamera {
        let mut cam = SimulatedCamera::new(DeviceProfile::from_toml(text).unwrap()).unwrap();
        cam.open().unwrap();
        cam
    }

    #[test]
    fn test_one_result_per_descriptor_in_order() {
        let cam = camera(PROFILE);
        let descriptors = catalog::path_features();
        let report = probe(&cam, &descriptors);

        assert_eq!(report.results.len(), descriptors.len());
        for (result, descriptor) in report.results.iter().zip(&descriptors) {
            assert_eq!(result.name, descriptor.name);
        }
    }

    #[test]
    fn test_missing_feature_has_no_derived_fields() {
        let cam = camera(PROFILE);
        let report = probe(&cam, &catalog::path_features());
        let missing = report.get("SequencerSetNext").unwrap();

        assert!(!missing.found);
        assert!(missing.current_value.is_none());
        assert!(missing.range.is_none());
        assert!(missing.enum_options.is_none());
        assert!(missing.faults.is_empty());
    }

    #[test]
    fn test_found_features_are_described() {
        let cam = camera(PROFILE);
        let report = probe(&cam, &catalog::path_features());

        let mode = report.get("SequencerMode").unwrap();
        assert_eq!(mode.current_value, Some(FeatureValue::symbolic("Off")));
        assert_eq!(mode.enum_options, Some(vec!["Off".to_string(), "On".to_string()]));
        assert!(mode.range.is_none());

        let path = report.get("SequencerPathSelector").unwrap();
        assert_eq!(path.integer_range(), Some((0, 1)));

        let save = report.get("SequencerSetSave").unwrap();
        assert!(save.found);
        assert!(save.current_value.is_none());
        assert!(save.faults.is_empty());
    }

    #[test]
    fn test_sub_probe_faults_do_not_stop_the_batch() {
        let cam = camera(PROFILE);
        let descriptors = vec![
            ParameterDescriptor::informational("Gamma", FeatureKind::Float),
            ParameterDescriptor::informational("Gain", FeatureKind::Float),
        ];
        let report = probe(&cam, &descriptors);

        let gamma = report.get("Gamma").unwrap();
        assert!(gamma.current_value.is_none());
        assert_eq!(gamma.faults[0].stage, ProbeStage::Value);
        assert!(gamma.range.is_some());

        let gain = report.get("Gain").unwrap();
        assert_eq!(gain.current_value, Some(FeatureValue::Float(2.5)));
        assert_eq!(gain.faults[0].stage, ProbeStage::Range);
        assert!(gain.faults[0].message.contains("bounds locked"));
    }

    #[test]
    fn test_path_branching_verdict() {
        let cam = camera(PROFILE);
        let report = probe(&cam, &catalog::path_features());
        assert_eq!(report.path_branching(), PathBranchingSupport::Full);
        assert!(report.supports_path_branching());
        assert_eq!(
            report.critical_found().collect::<Vec<_>>(),
            vec!["SequencerMode", "SequencerPathSelector"]
        );
    }

    #[test]
    fn test_sequencer_without_paths_is_partial() {
        let text = PROFILE.replace("SequencerPathSelector", "SequencerSetStart");
        let cam = camera(&text);
        let report = probe(&cam, &catalog::path_features());

        let support = report.path_branching();
        assert_eq!(support, PathBranchingSupport::SequencerOnly);
        assert!(support.is_partial());
        assert!(!report.supports_path_branching());
    }

    #[test]
    fn test_closed_device_finds_nothing() {
        let cam = SimulatedCamera::new(DeviceProfile::from_toml(PROFILE).unwrap()).unwrap();
        let report = probe(&cam, &catalog::path_features());
        assert_eq!(report.found_count(), 0);
        assert_eq!(report.path_branching(), PathBranchingSupport::Unsupported);
    }
}
