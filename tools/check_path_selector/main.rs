//! Checks whether the camera supports dual HDR profiles through sequencer path branching.
//!
//! ```bash
//! cargo run --bin check_path_selector
//! cargo run --bin check_path_selector -- --profile profiles/sequencer_only.toml --json
//! ```

use std::process::ExitCode;

use clap::Parser;
use sequencer_diag::cli::{self, CommonArgs};
use sequencer_diag::diagnostics::PathSelectorDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "check_path_selector")]
#[command(version)]
#[command(about = "Check sequencer path selector support for dual HDR profiles", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::run(PathSelectorDiagnostic, &args.common)
}
