//! Sequencer path-branching support for dual HDR profiles.

use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use super::Diagnostic;
use crate::config::ProbeConfig;
use crate::device::DeviceSession;
use crate::error::AppResult;
use crate::probe::catalog::{self, SEQUENCER_PATH_SELECTOR};
use crate::probe::{
    candidate_range, probe, test_write, CapabilityReport, PathBranchingSupport, RestoreStatus,
    SettabilityOutcome,
};
use crate::report::{self, MarkerStyle, TextReport};

/// `check_path_selector`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSelectorDiagnostic;

/// Path selector settability, when the selector exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathSelectorTest {
    /// Candidate paths were written
    Tested {
        /// Write results
        outcome: SettabilityOutcome,
    },
    /// The selector exists but its bounds could not be read
    Failed {
        /// Error message
        error: String,
    },
}

/// Report of `check_path_selector`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSelectorReport {
    /// Sequencer path features
    pub capabilities: CapabilityReport,
    /// Verdict
    pub support: PathBranchingSupport,
    /// Settability of the path selector
    pub path_test: Option<PathSelectorTest>,
}

impl Diagnostic for PathSelectorDiagnostic {
    type Report = PathSelectorReport;

    fn name(&self) -> &'static str {
        "check_path_selector"
    }

    fn banner(&self) -> Option<&'static str> {
        Some("Checking camera sequencer path selector support...")
    }

    fn prints_completion(&self) -> bool {
        true
    }

    fn run(&self, session: &mut DeviceSession, probe_config: &ProbeConfig) -> AppResult<PathSelectorReport> {
        let capabilities = probe(session.device(), &catalog::path_features());
        let support = capabilities.path_branching();
        info!(?support, found = capabilities.found_count(), "Path features probed");

        let path_test = capabilities
            .get(SEQUENCER_PATH_SELECTOR)
            .filter(|r| r.found && r.is_critical())
            .map(|selector| match selector.integer_range() {
                Some((min, max)) => {
                    let candidates = candidate_range(min, max, probe_config.max_path_candidates);
                    PathSelectorTest::Tested {
                        outcome: test_write(
                            session.device_mut(),
                            SEQUENCER_PATH_SELECTOR,
                            &candidates,
                            probe_config.restore_after_write,
                        ),
                    }
                }
                None => PathSelectorTest::Failed {
                    error: selector
                        .faults
                        .first()
                        .map(|f| f.message.clone())
                        .unwrap_or_else(|| "path selector range unavailable".to_string()),
                },
            });

        Ok(PathSelectorReport {
            capabilities,
            support,
            path_test,
        })
    }
}

impl TextReport for PathSelectorReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        report::write_heading(out, "Sequencer Path Features:")?;
        report::write_capabilities(out, &self.capabilities, MarkerStyle::ByCriticality)?;

        report::write_section(out, "Dual HDR Profile Capability Check:")?;
        match self.support {
            PathBranchingSupport::Full => {
                writeln!(out, "✓ Camera SUPPORTS dual HDR profiles with path branching")?;
                writeln!(out, "  - SequencerPathSelector is available")?;
                writeln!(out, "  - Sequencer mode is available")?;
            }
            PathBranchingSupport::SequencerOnly => {
                writeln!(out, "⚠ Camera supports sequencer mode but NOT path branching")?;
                writeln!(out, "  - Single HDR profile mode is supported")?;
                writeln!(out, "  - Dual profile mode requires SequencerPathSelector")?;
            }
            PathBranchingSupport::Unsupported => {
                writeln!(out, "✗ Camera does NOT support HDR sequencer mode")?;
            }
        }

        let Some(test) = &self.path_test else {
            return Ok(());
        };
        report::write_section(out, "Testing SequencerPathSelector:")?;
        match test {
            PathSelectorTest::Failed { error } => {
                writeln!(out, "Error testing path selector: {}", error)?;
            }
            PathSelectorTest::Tested { outcome } => write_outcome(out, outcome)?,
        }
        Ok(())
    }
}

fn write_outcome(out: &mut dyn Write, outcome: &SettabilityOutcome) -> io::Result<()> {
    if let Some((min, max)) = &outcome.range {
        writeln!(out, "Path selector range: {} to {}", min, max)?;
    }
    match &outcome.original {
        Some(current) => writeln!(out, "Current path: {}", current)?,
        None => writeln!(out, "Current path: <unreadable>")?,
    }
    for attempt in &outcome.attempts {
        if attempt.accepted {
            writeln!(out, "  ✓ Can set path {}", attempt.value)?;
        } else {
            writeln!(out, "  ✗ Cannot set path {}", attempt.value)?;
        }
    }
    match &outcome.restore {
        RestoreStatus::Restored | RestoreStatus::Unchanged | RestoreStatus::Disabled => {}
        RestoreStatus::OriginalUnknown => {
            writeln!(out, "  ⚠ Original path unknown, selector left at last written value")?;
        }
        RestoreStatus::Failed(error) => {
            writeln!(out, "  ⚠ Could not restore original path: {}", error)?;
        }
    }
    Ok(())
}
