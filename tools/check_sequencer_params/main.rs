//! Finds out which image parameters each sequencer set stores on its own and which ones all sets share.
//!
//! ```bash
//! cargo run --bin check_sequencer_params
//! cargo run --bin check_sequencer_params -- --profile profiles/ace2_path_branching.toml --json
//! ```

use std::process::ExitCode;

use clap::Parser;
use sequencer_diag::cli::{self, CommonArgs};
use sequencer_diag::diagnostics::SequencerParamsDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "check_sequencer_params")]
#[command(version)]
#[command(about = "Check which parameters are stored per sequencer set", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::run(SequencerParamsDiagnostic, &args.common)
}
