//! Report rendering.
//!
//! Diagnostics build typed reports; this module turns them into the console
//! layout (one line per parameter with ✓/○/✗ markers) or into a JSON
//! document wrapped in a [`DiagnosticRun`] envelope.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::{DeviceInfo, FeatureValue};
use crate::probe::sequencer::FieldReading;
use crate::probe::{CapabilityReport, ParameterProbeResult};

/// Width of the `=` and `-` rules between sections.
pub const RULE_WIDTH: usize = 50;

/// Something that renders itself in the console layout.
pub trait TextReport {
    /// Write the report body.
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// JSON envelope of a diagnostic run.
#[derive(Debug, Serialize)]
pub struct DiagnosticRun<'a, R: Serialize> {
    /// Diagnostic name
    pub diagnostic: &'a str,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Device the report is about
    pub device: &'a DeviceInfo,
    /// Diagnostic-specific report
    pub report: &'a R,
}

impl<'a, R: Serialize> DiagnosticRun<'a, R> {
    /// Wrap a report, stamped with the current time.
    pub fn new(diagnostic: &'a str, device: &'a DeviceInfo, report: &'a R) -> Self {
        Self {
            diagnostic,
            generated_at: Utc::now(),
            device,
            report,
        }
    }

    /// Pretty-printed JSON followed by a newline.
    pub fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}

/// Marker selection for capability lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// ✓ for critical parameters, ○ for the rest
    ByCriticality,
    /// ✓ for every parameter found
    Uniform,
}

/// "Connected to" and "Serial Number" lines followed by a blank line.
pub fn write_device_header(out: &mut dyn Write, info: &DeviceInfo) -> io::Result<()> {
    writeln!(out, "Connected to: {}", info.model_name)?;
    writeln!(out, "Serial Number: {}", info.serial_number)?;
    writeln!(out)
}

/// A rule of `width` repetitions of `ch`.
pub fn write_rule(out: &mut dyn Write, ch: char, width: usize) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(width))
}

/// Blank line, `=` rule, title, `-` rule.
pub fn write_section(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    write_rule(out, '=', RULE_WIDTH)?;
    writeln!(out, "{}", title)?;
    write_rule(out, '-', 40)
}

/// Title followed by a `-` rule.
pub fn write_heading(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out, "{}", title)?;
    write_rule(out, '-', 40)
}

/// One block per probed parameter.
pub fn write_capabilities(
    out: &mut dyn Write,
    report: &CapabilityReport,
    style: MarkerStyle,
) -> io::Result<()> {
    for result in &report.results {
        write_parameter(out, result, style)?;
    }
    Ok(())
}

fn write_parameter(
    out: &mut dyn Write,
    result: &ParameterProbeResult,
    style: MarkerStyle,
) -> io::Result<()> {
    if !result.found {
        return if result.is_critical() {
            writeln!(out, "✗ {}: NOT FOUND (CRITICAL)", result.name)
        } else {
            writeln!(out, "✗ {}: Not found", result.name)
        };
    }

    let marker = match style {
        MarkerStyle::ByCriticality if !result.is_critical() => '○',
        _ => '✓',
    };
    write!(out, "{} {}: Available", marker, result.name)?;
    if let Some(value) = &result.current_value {
        write!(out, " - Current: {}", value)?;
    }
    if let Some((min, max)) = &result.range {
        write!(out, " (Range: {}-{})", min, max)?;
    }
    if let Some(options) = &result.enum_options {
        write!(out, "\n  Options: {}", options.join(", "))?;
    }
    writeln!(out)?;
    for fault in &result.faults {
        writeln!(out, "  ⚠ {} unavailable: {}", fault.stage.as_str(), fault.message)?;
    }
    Ok(())
}

/// `label: value`, or `label: <unavailable: reason>` when the read failed.
pub fn write_reading(out: &mut dyn Write, indent: &str, label: &str, reading: &FieldReading) -> io::Result<()> {
    match (&reading.value, &reading.error) {
        (Some(value), _) => writeln!(out, "{}{}: {}", indent, label, format_value(value)),
        (None, Some(error)) => writeln!(out, "{}{}: <unavailable: {}>", indent, label, error),
        (None, None) => writeln!(out, "{}{}: <unavailable>", indent, label),
    }
}

/// Floats with two decimals, everything else as displayed by the device.
pub fn format_value(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Float(f) => format!("{:.2}", f),
        other => other.to_string(),
    }
}
