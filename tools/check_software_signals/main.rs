//! Checks the software signals and sequencer trigger sources used to switch HDR profiles at runtime.
//!
//! ```bash
//! cargo run --bin check_software_signals
//! cargo run --bin check_software_signals -- --profile profiles/no_sequencer.toml --json
//! ```

use std::process::ExitCode;

use clap::Parser;
use sequencer_diag::cli::{self, CommonArgs};
use sequencer_diag::diagnostics::SoftwareSignalsDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "check_software_signals")]
#[command(version)]
#[command(about = "Check software signal capabilities for HDR profile switching", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::run(SoftwareSignalsDiagnostic, &args.common)
}
