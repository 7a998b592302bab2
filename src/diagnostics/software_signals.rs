//! Software signal capabilities for HDR profile switching.

use std::io::{self, Write};

use serde::Serialize;

use super::Diagnostic;
use crate::config::ProbeConfig;
use crate::device::DeviceSession;
use crate::error::AppResult;
use crate::probe::catalog::{self, PROFILE_SWITCH_SIGNALS};
use crate::probe::signals::{SwitchingCheck, TriggerSourceCheck};
use crate::probe::{check_software_signals, probe, CapabilityReport, SignalCheckReport};
use crate::report::{self, MarkerStyle, TextReport};

/// `check_software_signals`
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareSignalsDiagnostic;

/// Report of `check_software_signals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftwareSignalsReport {
    /// Signal and trigger features
    pub capabilities: CapabilityReport,
    /// Selection and trigger-source checks
    pub checks: SignalCheckReport,
}

impl Diagnostic for SoftwareSignalsDiagnostic {
    type Report = SoftwareSignalsReport;

    fn name(&self) -> &'static str {
        "check_software_signals"
    }

    fn banner(&self) -> Option<&'static str> {
        Some("Checking camera software signal features...")
    }

    fn prints_completion(&self) -> bool {
        true
    }

    fn run(&self, session: &mut DeviceSession, _probe: &ProbeConfig) -> AppResult<SoftwareSignalsReport> {
        let capabilities = probe(session.device(), &catalog::signal_features());
        let checks = check_software_signals(session.device_mut(), &PROFILE_SWITCH_SIGNALS);
        Ok(SoftwareSignalsReport {
            capabilities,
            checks,
        })
    }
}

impl TextReport for SoftwareSignalsReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        report::write_heading(out, "Software Signal Features:")?;
        report::write_capabilities(out, &self.capabilities, MarkerStyle::Uniform)?;

        report::write_section(out, "Testing Software Signal Switching:")?;
        match &self.checks.switching {
            SwitchingCheck::Unavailable => {
                writeln!(out, "SoftwareSignalSelector or SoftwareSignalPulse not available")?;
            }
            SwitchingCheck::Failed { error } => {
                writeln!(out, "Error testing software signals: {}", error)?;
            }
            SwitchingCheck::Checked {
                available_signals,
                selections,
                pulse_executable,
                restore_error,
            } => {
                writeln!(out, "Available signals:")?;
                for signal in available_signals {
                    writeln!(out, "  - {}", signal)?;
                }
                for selection in selections {
                    writeln!(out, "\nTesting {}:", selection.signal)?;
                    match (&selection.selected, &selection.error) {
                        (Some(selected), _) => writeln!(out, "  Selected: {}", selected)?,
                        (None, Some(error)) => writeln!(out, "  Selection failed: {}", error)?,
                        (None, None) => writeln!(out, "  Selection failed")?,
                    }
                    if *pulse_executable {
                        writeln!(out, "  Pulse command: Available")?;
                    } else {
                        writeln!(out, "  Pulse command: Not executable")?;
                    }
                }
                if let Some(error) = restore_error {
                    writeln!(out, "⚠ Could not restore signal selector: {}", error)?;
                }
            }
        }

        report::write_section(out, "Sequencer Trigger Sources:")?;
        match &self.checks.trigger_sources {
            TriggerSourceCheck::Unavailable => {
                writeln!(out, "SequencerTriggerSource not available")?;
            }
            TriggerSourceCheck::Failed { error } => {
                writeln!(out, "Error checking trigger sources: {}", error)?;
            }
            TriggerSourceCheck::Listed { sources } => {
                writeln!(out, "Available trigger sources:")?;
                for source in sources {
                    writeln!(out, "  - {}", source.name)?;
                    if source.suited_for_profile_switching {
                        writeln!(out, "    ^ Good for HDR profile switching")?;
                    }
                }
            }
        }
        Ok(())
    }
}
