//! Shared command-line front end of the diagnostic executables.
//!
//! Every executable takes the same optional flags, opens the configured
//! device, runs one [`Diagnostic`] and prints its report. The report is
//! rendered into a buffer and only printed once the run succeeded, so a
//! failure produces a single `ERROR: <message>` line on stdout and exit
//! status 1 instead of a partial report.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Args;
use figment::providers::Serialized;
use tracing::{info, warn};

use crate::config::{DiagConfig, DEFAULT_CONFIG_PATH};
use crate::device::{self, DeviceSession};
use crate::diagnostics::Diagnostic;
use crate::logging;
use crate::report::{self, DiagnosticRun, TextReport};

/// Flags shared by all diagnostics.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Configuration file (a missing file falls back to defaults)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Device profile for the simulated backend, overriding the configuration
    #[arg(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for CommonArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            profile: None,
            json: false,
        }
    }
}

impl CommonArgs {
    /// Layered configuration with the command-line overrides on top.
    pub fn load_config(&self) -> anyhow::Result<DiagConfig> {
        let mut figment = DiagConfig::figment(&self.config);
        if let Some(profile) = &self.profile {
            figment = figment.merge(Serialized::default("device.profile", profile));
        }
        DiagConfig::extract(figment)
            .with_context(|| format!("Failed to load configuration from {}", self.config.display()))
    }
}

/// Run a diagnostic and translate the outcome into an exit status.
pub fn run<D: Diagnostic>(diagnostic: D, args: &CommonArgs) -> ExitCode {
    match execute(&diagnostic, args) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            match stdout.write_all(&output).and_then(|()| stdout.flush()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            println!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, install logging and return the rendered report.
pub fn execute<D: Diagnostic>(diagnostic: &D, args: &CommonArgs) -> anyhow::Result<Vec<u8>> {
    let config = args.load_config()?;
    if let Err(e) = logging::init(&config.application) {
        // a subscriber installed by the host process is fine
        eprintln!("Logging not initialised: {}", e);
    }
    render(diagnostic, &config, args.json)
}

/// Open the configured device, run the diagnostic and render its report.
pub fn render<D: Diagnostic>(
    diagnostic: &D,
    config: &DiagConfig,
    json: bool,
) -> anyhow::Result<Vec<u8>> {
    info!(
        diagnostic = diagnostic.name(),
        backend = config.device.backend.as_str(),
        "Starting diagnostic"
    );

    let device = device::connect(&config.device)?;
    let mut session = DeviceSession::open(device)?;
    let report = diagnostic.run(&mut session, &config.probe)?;

    let mut out = Vec::new();
    if json {
        DiagnosticRun::new(diagnostic.name(), session.info(), &report).write_json(&mut out)?;
    } else {
        render_text(diagnostic, session.info(), &report, &mut out)?;
    }

    if let Err(e) = session.close() {
        warn!("Failed to close device: {}", e);
    }
    Ok(out)
}

fn render_text<D: Diagnostic>(
    diagnostic: &D,
    info: &device::DeviceInfo,
    body: &D::Report,
    out: &mut Vec<u8>,
) -> anyhow::Result<()> {
    if let Some(banner) = diagnostic.banner() {
        writeln!(out, "{}", banner)?;
        report::write_rule(out, '=', report::RULE_WIDTH)?;
    }
    report::write_device_header(out, info)?;
    body.write_text(out).map_err(|e| anyhow!("Failed to render report: {}", e))?;
    if diagnostic.prints_completion() {
        writeln!(out, "\n✓ Diagnostic complete!")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{PathSelectorDiagnostic, SequencerStateDiagnostic};
    use serial_test::serial;

    fn args(profile: Option<&str>) -> CommonArgs {
        CommonArgs {
            config: PathBuf::from("does/not/exist.toml"),
            profile: profile.map(PathBuf::from),
            json: false,
        }
    }

    // leaves the global subscriber alone so log-capturing tests keep working
    fn render_with<D: Diagnostic>(diagnostic: &D, args: &CommonArgs) -> anyhow::Result<Vec<u8>> {
        let config = args.load_config()?;
        render(diagnostic, &config, args.json)
    }

    fn profile_path(name: &str) -> String {
        format!("{}/profiles/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    #[serial]
    fn test_profile_flag_overrides_configuration() {
        let path = profile_path("sequencer_only.toml");
        let config = args(Some(&path)).load_config().unwrap();
        assert_eq!(config.device.profile, Some(PathBuf::from(path)));
    }

    #[test]
    #[serial]
    fn test_text_report_starts_with_banner_and_header() {
        let output = render_with(&PathSelectorDiagnostic, &args(None)).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Checking camera sequencer path selector support...");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "Connected to: a2A1920-160umBAS");
        assert_eq!(lines[3], "Serial Number: 40123456");
        assert!(text.contains("✓ Camera SUPPORTS dual HDR profiles with path branching"));
        assert!(text.trim_end().ends_with("✓ Diagnostic complete!"));
    }

    #[test]
    #[serial]
    fn test_open_failure_yields_no_report() {
        let path = profile_path("open_failure.toml");
        let err = render_with(&SequencerStateDiagnostic, &args(Some(&path))).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("exclusively opened"));
        assert!(!message.contains('\n'));
    }

    #[test]
    #[serial]
    fn test_json_output_is_a_single_document() {
        let mut args = args(None);
        args.json = true;
        let output = render_with(&SequencerStateDiagnostic, &args).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["diagnostic"], "check_sequencer_state");
        assert_eq!(json["report"]["sets"].as_array().unwrap().len(), 3);
    }
}
