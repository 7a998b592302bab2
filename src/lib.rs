//! Camera sequencer capability diagnostics.
//!
//! This library probes a machine-vision camera's named feature space to find
//! out whether it can run dual HDR profiles through sequencer path branching.
//! It is used by the `check_*` executables under `tools/`.
//!
//! - [`device`]: the camera interface, the simulated backend and scoped sessions
//! - [`probe`]: capability probing, settability tests, cross-set comparison
//! - [`diagnostics`]: the four diagnostics and their reports
//! - [`report`]: console and JSON rendering
//! - [`cli`]: the shared executable front end

pub mod cli;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod probe;
pub mod report;

pub use error::{AppResult, DiagError};
