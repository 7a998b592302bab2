//! Which image parameters are stored per sequencer set.

use std::io::{self, Write};

use serde::Serialize;

use super::Diagnostic;
use crate::config::ProbeConfig;
use crate::device::DeviceSession;
use crate::error::AppResult;
use crate::probe::catalog;
use crate::probe::comparator::{ComparisonOutcome, UntestedReason};
use crate::probe::{compare_sets, ComparisonPlan, CrossSetReport, Sharing};
use crate::report::TextReport;

const RULE: usize = 60;

/// `check_sequencer_params`
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerParamsDiagnostic;

/// Report of `check_sequencer_params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencerParamsReport {
    /// Availability and cross-set classification
    pub comparison: CrossSetReport,
}

impl Diagnostic for SequencerParamsDiagnostic {
    type Report = SequencerParamsReport;

    fn name(&self) -> &'static str {
        "check_sequencer_params"
    }

    fn run(&self, session: &mut DeviceSession, probe: &ProbeConfig) -> AppResult<SequencerParamsReport> {
        let comparison = compare_sets(
            session.device_mut(),
            &catalog::sequencer_parameter_names(),
            &ComparisonPlan::from_config(probe),
        )?;
        Ok(SequencerParamsReport { comparison })
    }
}

fn rule(out: &mut dyn Write, ch: char) -> io::Result<()> {
    crate::report::write_rule(out, ch, RULE)
}

impl TextReport for SequencerParamsReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        let report = &self.comparison;

        writeln!(out, "Checking which parameters are affected by sequencer sets...")?;
        rule(out, '-')?;
        // availability in catalog order
        for name in catalog::sequencer_parameter_names() {
            match report.available.iter().find(|p| p.name == name) {
                Some(parameter) => writeln!(out, "✓ {}: {}", name, parameter.value)?,
                None => writeln!(out, "✗ {}: Not available", name)?,
            }
        }

        writeln!(out)?;
        rule(out, '=')?;
        writeln!(out, "Testing sequencer parameter storage...")?;
        rule(out, '=')?;

        if let Some(reason) = &report.aborted {
            if report.comparisons.is_empty() {
                writeln!(out, "\nSequencer comparison not possible: {}", reason)?;
                return write_restoration(out, report);
            }
        }

        writeln!(out, "\n--- Modifying Set {} ---", report.set_a)?;
        for comparison in &report.comparisons {
            match (&comparison.written, &comparison.outcome) {
                (Some(value), _) => writeln!(out, "  Set {} to {}", comparison.name, value)?,
                (None, ComparisonOutcome::Untested(UntestedReason::WriteRejected(error))) => {
                    writeln!(out, "  Could not modify {}: {}", comparison.name, error)?
                }
                _ => {}
            }
        }

        writeln!(
            out,
            "\n--- Checking Set {} (should have original values) ---",
            report.set_b
        )?;
        for comparison in &report.comparisons {
            let (Some(written), Some(observed)) = (&comparison.written, &comparison.observed) else {
                continue;
            };
            match comparison.sharing() {
                Some(Sharing::Independent) => writeln!(
                    out,
                    "  {}: {} (different from Set {}: {})",
                    comparison.name, observed, report.set_a, written
                )?,
                Some(Sharing::Shared) => writeln!(
                    out,
                    "  {}: {} (SAME as Set {}!)",
                    comparison.name, observed, report.set_a
                )?,
                None => {}
            }
        }

        if let Some(reason) = &report.aborted {
            writeln!(out, "\n⚠ Comparison aborted: {}", reason)?;
        }
        write_restoration(out, report)?;

        writeln!(out)?;
        rule(out, '=')?;
        writeln!(
            out,
            "IMPORTANT: Parameters that show 'SAME as Set {}' are",
            report.set_a
        )?;
        writeln!(out, "shared across ALL sequencer sets and need special handling!")?;
        rule(out, '=')
    }
}

fn write_restoration(out: &mut dyn Write, report: &CrossSetReport) -> io::Result<()> {
    for error in &report.restoration_errors {
        writeln!(out, "⚠ Could not restore {}", error)?;
    }
    Ok(())
}
