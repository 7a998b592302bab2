//! Global subscriber installation, kept in its own test binary.

use sequencer_diag::config::ApplicationConfig;
use sequencer_diag::logging;

#[test]
fn second_init_is_an_error_not_a_panic() {
    let config = ApplicationConfig::default();
    assert!(logging::init(&config).is_ok());
    assert!(logging::init(&config).is_err());
}
