//! Sequencer mode, per-set snapshots and trigger configuration.

use std::io::{self, Write};

use super::Diagnostic;
use crate::config::ProbeConfig;
use crate::device::DeviceSession;
use crate::error::AppResult;
use crate::probe::catalog::SEQUENCER_STATE_FIELDS;
use crate::probe::sequencer::FieldReading;
use crate::probe::{inspect_sequencer, SequencerStateReport};
use crate::report::{format_value, write_reading, TextReport};

/// `check_sequencer_state`
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerStateDiagnostic;

impl Diagnostic for SequencerStateDiagnostic {
    type Report = SequencerStateReport;

    fn name(&self) -> &'static str {
        "check_sequencer_state"
    }

    fn run(&self, session: &mut DeviceSession, probe: &ProbeConfig) -> AppResult<SequencerStateReport> {
        Ok(inspect_sequencer(
            session.device_mut(),
            probe.sequencer_sets_to_inspect,
            &SEQUENCER_STATE_FIELDS,
        ))
    }
}

/// Console label of a snapshot field.
fn field_label(name: &str) -> &str {
    match name {
        "ExposureTime" => "Exposure Time",
        "PixelFormat" => "Pixel Format",
        other => other,
    }
}

fn write_field(out: &mut dyn Write, reading: &FieldReading) -> io::Result<()> {
    match (&reading.value, reading.name.as_str()) {
        (Some(value), "ExposureTime") => {
            writeln!(out, "  Exposure Time: {} μs", format_value(value))
        }
        _ => write_reading(out, "  ", field_label(&reading.name), reading),
    }
}

impl TextReport for SequencerStateReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Current Sequencer State:")?;
        for reading in &self.initial {
            write_reading(out, "", &reading.name, reading)?;
        }

        writeln!(out, "\n--- Checking Sequencer Sets Configuration ---")?;
        write_reading(
            out,
            "",
            "Original Pixel Format (outside sequencer)",
            &self.original_pixel_format,
        )?;

        for set in &self.sets {
            writeln!(out, "\n--- Sequencer Set {} ---", set.index)?;
            for reading in &set.fields {
                write_field(out, reading)?;
            }
        }
        if let Some(error) = &self.walk_error {
            writeln!(out, "Error checking sequencer sets: {}", error)?;
        }
        for error in &self.restoration_errors {
            writeln!(out, "⚠ Could not restore {}", error)?;
        }

        writeln!(out, "\n--- Final State ---")?;
        for reading in &self.final_state {
            let label = match reading.name.as_str() {
                "PixelFormat" => "Current Pixel Format",
                "ExposureMode" => "Exposure Mode",
                other => other,
            };
            write_reading(out, "", label, reading)?;
        }

        writeln!(out, "\n--- Trigger Configuration ---")?;
        write_reading(out, "", &self.trigger_source.name, &self.trigger_source)
    }
}
