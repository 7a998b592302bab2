//! Probe scenarios against the shipped device profiles.

use sequencer_diag::config::ProbeConfig;
use sequencer_diag::device::{DeviceProfile, DeviceSession, FeatureValue, SimulatedCamera};
use sequencer_diag::diagnostics::{
    Diagnostic, PathSelectorDiagnostic, SequencerParamsDiagnostic, SequencerStateDiagnostic,
    SoftwareSignalsDiagnostic,
};
use sequencer_diag::probe::catalog;
use sequencer_diag::probe::signals::{SwitchingCheck, TriggerSourceCheck};
use sequencer_diag::probe::{probe, PathBranchingSupport, Sharing};
use sequencer_diag::report::TextReport;

fn profile(name: &str) -> DeviceProfile {
    let path = format!("{}/profiles/{}", env!("CARGO_MANIFEST_DIR"), name);
    DeviceProfile::from_file(path).unwrap()
}

fn session(name: &str) -> DeviceSession {
    let camera = SimulatedCamera::new(profile(name)).unwrap();
    DeviceSession::open(Box::new(camera)).unwrap()
}

fn text<R: TextReport>(report: &R) -> String {
    let mut out = Vec::new();
    report.write_text(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn path_branching_verdict_per_profile() {
    let cases = [
        ("ace2_path_branching.toml", PathBranchingSupport::Full),
        ("sequencer_only.toml", PathBranchingSupport::SequencerOnly),
        ("no_sequencer.toml", PathBranchingSupport::Unsupported),
    ];
    for (name, expected) in cases {
        let session = session(name);
        let report = probe(session.device(), &catalog::path_features());
        assert_eq!(report.results.len(), 11, "{}", name);
        assert_eq!(report.path_branching(), expected, "{}", name);
    }
}

#[test]
fn path_selector_diagnostic_tests_both_paths() {
    let mut session = session("ace2_path_branching.toml");
    let report = PathSelectorDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let output = text(&report);

    assert!(output.contains("✓ SequencerPathSelector: Available - Current: 0 (Range: 0-1)"));
    assert!(output.contains("○ SequencerTriggerSource: Available - Current: ExposureActive"));
    assert!(output.contains("Path selector range: 0 to 1"));
    assert!(output.contains("  ✓ Can set path 0"));
    assert!(output.contains("  ✓ Can set path 1"));
    assert!(!output.contains("Can set path 2"));
    assert_eq!(
        session.device().get_value("SequencerPathSelector").unwrap(),
        FeatureValue::Integer(0)
    );
}

#[test]
fn sequencer_only_camera_is_partial_and_skips_path_test() {
    let mut session = session("sequencer_only.toml");
    let report = PathSelectorDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let output = text(&report);

    assert!(report.support.is_partial());
    assert!(report.path_test.is_none());
    assert!(output.contains("✗ SequencerPathSelector: NOT FOUND (CRITICAL)"));
    assert!(output.contains("⚠ Camera supports sequencer mode but NOT path branching"));
    assert!(!output.contains("Testing SequencerPathSelector"));
}

#[test]
fn sequencer_params_classifies_the_ace2_profile() {
    let mut session = session("ace2_path_branching.toml");
    let report = SequencerParamsDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let comparison = &report.comparison;

    assert!(comparison.aborted.is_none());
    assert!(comparison.unavailable.contains(&"GainRaw".to_string()));
    assert_eq!(
        comparison.comparison("Width").unwrap().sharing(),
        Some(Sharing::Shared)
    );
    assert_eq!(
        comparison.comparison("ExposureTime").unwrap().sharing(),
        Some(Sharing::Independent)
    );
    assert_eq!(
        comparison.comparison("Gain").unwrap().sharing(),
        Some(Sharing::Independent)
    );

    let output = text(&report);
    assert!(output.contains("✓ Width: 1920"));
    assert!(output.contains("✗ DecimationHorizontal: Not available"));
    assert!(output.contains("  Set Width to 640"));
    assert!(output.contains("  Width: 640 (SAME as Set 0!)"));
    assert!(output.contains("  ExposureTime: 5000.0 (different from Set 0: 100.0)"));
}

#[test]
fn sequencer_params_leaves_device_as_found() {
    let mut session = session("ace2_path_branching.toml");
    SequencerParamsDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let device = session.device();

    assert_eq!(device.get_value("Width").unwrap(), FeatureValue::Integer(1920));
    assert_eq!(device.get_value("ExposureTime").unwrap(), FeatureValue::Float(5000.0));
    assert_eq!(device.get_value("SequencerMode").unwrap(), FeatureValue::symbolic("Off"));
    assert_eq!(
        device.get_value("SequencerConfigurationMode").unwrap(),
        FeatureValue::symbolic("Off")
    );
}

#[test]
fn sequencer_params_without_sequencer_reports_availability_only() {
    let mut session = session("no_sequencer.toml");
    let report = SequencerParamsDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let output = text(&report);

    assert!(report.comparison.comparisons.is_empty());
    assert!(output.contains("✓ Width: 1280"));
    assert!(output.contains("✗ Gamma: Not available"));
    assert!(output.contains("Sequencer comparison not possible"));
}

#[test]
fn sequencer_state_walks_configured_sets() {
    let mut session = session("ace2_path_branching.toml");
    let probe_config = ProbeConfig {
        sequencer_sets_to_inspect: 2,
        ..ProbeConfig::default()
    };
    let report = SequencerStateDiagnostic
        .run(&mut session, &probe_config)
        .unwrap();
    let output = text(&report);

    assert_eq!(report.sets.len(), 2);
    assert!(output.contains("SequencerMode: Off"));
    assert!(output.contains("--- Sequencer Set 1 ---"));
    assert!(output.contains("  Exposure Time: 5000.00 μs"));
    assert!(output.contains("  Pixel Format: Mono8"));
    assert!(output.contains("Exposure Mode: Timed"));
    assert!(output.contains("SequencerTriggerSource: ExposureActive"));
}

#[test]
fn sequencer_state_without_sequencer_still_reports_final_state() {
    let mut session = session("no_sequencer.toml");
    let report = SequencerStateDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let output = text(&report);

    assert!(report.sets.is_empty());
    assert!(output.contains("Error checking sequencer sets"));
    assert!(output.contains("Current Pixel Format: Mono8"));
}

#[test]
fn software_signals_on_ace2() {
    let mut session = session("ace2_path_branching.toml");
    let report = SoftwareSignalsDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();

    match &report.checks.switching {
        SwitchingCheck::Checked { selections, .. } => assert_eq!(selections.len(), 2),
        other => panic!("unexpected switching check {:?}", other),
    }
    match &report.checks.trigger_sources {
        TriggerSourceCheck::Listed { sources } => assert_eq!(
            sources.iter().filter(|s| s.suited_for_profile_switching).count(),
            3
        ),
        other => panic!("unexpected trigger check {:?}", other),
    }

    let output = text(&report);
    assert!(output.contains("✓ SoftwareSignalSelector: Available - Current: SoftwareSignal1"));
    assert!(output.contains("✗ SoftwareSignal1: Not found"));
    assert!(output.contains("Testing SoftwareSignal2:\n  Selected: SoftwareSignal2\n  Pulse command: Available"));
    assert!(output.contains("  - SoftwareSignal1\n    ^ Good for HDR profile switching"));
    assert!(output.contains("  - Line1\n"));
}

#[test]
fn software_signals_without_selector() {
    let mut session = session("no_sequencer.toml");
    let report = SoftwareSignalsDiagnostic
        .run(&mut session, &ProbeConfig::default())
        .unwrap();
    let output = text(&report);

    assert!(output.contains("SoftwareSignalSelector or SoftwareSignalPulse not available"));
    assert!(output.contains("SequencerTriggerSource not available"));
    assert!(output.contains("✓ TriggerSoftware: Available"));
}
