//! The diagnostics shipped as executables.
//!
//! Each diagnostic runs against an open [`DeviceSession`] and returns a typed
//! report that renders either as console text or as JSON.

use serde::Serialize;

use crate::config::ProbeConfig;
use crate::device::DeviceSession;
use crate::error::AppResult;
use crate::report::TextReport;

pub mod path_selector;
pub mod sequencer_params;
pub mod sequencer_state;
pub mod software_signals;

pub use path_selector::PathSelectorDiagnostic;
pub use sequencer_params::SequencerParamsDiagnostic;
pub use sequencer_state::SequencerStateDiagnostic;
pub use software_signals::SoftwareSignalsDiagnostic;

/// A diagnostic runnable by the command-line front end.
pub trait Diagnostic {
    /// Report produced by a run.
    type Report: Serialize + TextReport;

    /// Executable name, also used as the JSON `diagnostic` field.
    fn name(&self) -> &'static str;

    /// Line printed above the device header, if any.
    fn banner(&self) -> Option<&'static str> {
        None
    }

    /// Whether to print the completion line after the report.
    fn prints_completion(&self) -> bool {
        false
    }

    /// Run against an open device.
    fn run(&self, session: &mut DeviceSession, probe: &ProbeConfig) -> AppResult<Self::Report>;
}
