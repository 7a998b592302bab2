//! Prints the sequencer state, a snapshot of the first sequencer sets and the trigger configuration.
//!
//! ```bash
//! cargo run --bin check_sequencer_state
//! cargo run --bin check_sequencer_state -- --profile profiles/ace2_path_branching.toml --json
//! ```

use std::process::ExitCode;

use clap::Parser;
use sequencer_diag::cli::{self, CommonArgs};
use sequencer_diag::diagnostics::SequencerStateDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "check_sequencer_state")]
#[command(version)]
#[command(about = "Show sequencer mode, per-set values and trigger configuration", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::run(SequencerStateDiagnostic, &args.common)
}
