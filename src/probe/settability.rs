//! Bounded write tests on a single parameter.
//!
//! Candidates are written in order. Values outside the declared range are
//! refused before reaching the device. Once every candidate has been tried the
//! original value is written back, unless restoration is disabled or nothing
//! was changed.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::device::{CameraDevice, FeatureValue};

/// Outcome of writing one candidate value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteAttempt {
    /// Value written
    pub value: FeatureValue,
    /// The device accepted the value
    pub accepted: bool,
    /// Rejection reason
    pub error: Option<String>,
}

impl WriteAttempt {
    fn accepted(value: &FeatureValue) -> Self {
        Self {
            value: value.clone(),
            accepted: true,
            error: None,
        }
    }

    fn rejected(value: &FeatureValue, error: impl Into<String>) -> Self {
        Self {
            value: value.clone(),
            accepted: false,
            error: Some(error.into()),
        }
    }
}

/// What happened to the original value after the test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RestoreStatus {
    /// Original value written back
    Restored,
    /// No candidate was accepted, so nothing needed restoring
    Unchanged,
    /// Restoration turned off in configuration
    Disabled,
    /// The original value could not be read beforehand
    OriginalUnknown,
    /// Writing the original value back failed
    Failed(String),
}

/// Result of a settability test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettabilityOutcome {
    /// Parameter under test
    pub feature: String,
    /// Value before the test
    pub original: Option<FeatureValue>,
    /// Declared bounds, when readable
    pub range: Option<(FeatureValue, FeatureValue)>,
    /// One entry per candidate, in order
    pub attempts: Vec<WriteAttempt>,
    /// Restoration of the original value
    pub restore: RestoreStatus,
}

impl SettabilityOutcome {
    /// Candidates the device accepted.
    pub fn accepted_values(&self) -> impl Iterator<Item = &FeatureValue> {
        self.attempts.iter().filter(|a| a.accepted).map(|a| &a.value)
    }

    /// Whether every candidate was accepted.
    pub fn all_accepted(&self) -> bool {
        self.attempts.iter().all(|a| a.accepted)
    }
}

/// Integer candidates `min..min(max + 1, limit)`, at most `limit` of them.
///
/// Empty when `limit <= min` or the range is inverted.
pub fn candidate_range(min: i64, max: i64, limit: i64) -> Vec<FeatureValue> {
    let end = max.saturating_add(1).min(limit);
    let count = usize::try_from(limit).unwrap_or(0);
    (min..end).take(count).map(FeatureValue::Integer).collect()
}

/// Write each candidate to `feature` and record which ones the device accepts.
pub fn test_write(
    device: &mut dyn CameraDevice,
    feature: &str,
    candidates: &[FeatureValue],
    restore: bool,
) -> SettabilityOutcome {
    let original = match device.get_value(feature) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(feature, "Cannot read value before settability test: {}", e);
            None
        }
    };
    let range = match (device.get_min(feature), device.get_max(feature)) {
        (Ok(min), Ok(max)) => Some((min, max)),
        _ => None,
    };

    let mut attempts = Vec::with_capacity(candidates.len());
    for value in candidates {
        attempts.push(attempt(device, feature, value, range.as_ref()));
    }

    let changed = attempts.iter().any(|a| a.accepted);
    let restore = match (&original, restore, changed) {
        (_, false, _) => RestoreStatus::Disabled,
        (_, true, false) => RestoreStatus::Unchanged,
        (None, true, true) => RestoreStatus::OriginalUnknown,
        (Some(value), true, true) => match device.set_value(feature, value) {
            Ok(()) => {
                debug!(feature, value = %value, "Original value restored");
                RestoreStatus::Restored
            }
            Err(e) => {
                warn!(feature, "Failed to restore original value: {}", e);
                RestoreStatus::Failed(e.to_string())
            }
        },
    };

    info!(
        feature,
        tried = attempts.len(),
        accepted = attempts.iter().filter(|a| a.accepted).count(),
        "Settability test finished"
    );

    SettabilityOutcome {
        feature: feature.to_string(),
        original,
        range,
        attempts,
        restore,
    }
}

fn attempt(
    device: &mut dyn CameraDevice,
    feature: &str,
    value: &FeatureValue,
    range: Option<&(FeatureValue, FeatureValue)>,
) -> WriteAttempt {
    if let Some((min, max)) = range {
        if let (Some(v), Some(lo), Some(hi)) = (value.as_f64(), min.as_f64(), max.as_f64()) {
            if v < lo || v > hi {
                return WriteAttempt::rejected(
                    value,
                    format!("{} is outside the declared range {}..={}", value, min, max),
                );
            }
        }
    }

    match device.set_value(feature, value) {
        Ok(()) => WriteAttempt::accepted(value),
        Err(e) => {
            debug!(feature, value = %value, "Write rejected: {}", e);
            WriteAttempt::rejected(value, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProfile, SimulatedCamera};

    const PROFILE: &str = r#"
[device]
model_name = "settable"
serial_number = "1"

[[features]]
name = "SequencerPathSelector"
kind = "integer"
value = 0
min = 0
max = 1

[[features]]
name = "Locked"
kind = "integer"
value = 7
min = 0
max = 10
read_only = true

[[features]]
name = "Picky"
kind = "integer"
value = 0
min = 0
max = 5
rejected = [1]
"#;

    fn camera() -> SimulatedCamera {
        let mut cam = SimulatedCamera::new(DeviceProfile::from_toml(PROFILE).unwrap()).unwrap();
        cam.open().unwrap();
        cam
    }

    #[test]
    fn test_candidate_range_limits() {
        assert_eq!(
            candidate_range(0, 1, 3),
            vec![FeatureValue::Integer(0), FeatureValue::Integer(1)]
        );
        assert_eq!(candidate_range(0, 7, 3).len(), 3);
        assert!(candidate_range(2, 1, 3).is_empty());
        assert!(candidate_range(5, 9, 3).is_empty());
        assert_eq!(candidate_range(0, i64::MAX, 2).len(), 2);
    }

    #[test]
    fn test_candidate_range_with_huge_negative_minimum_is_capped() {
        let candidates = candidate_range(i64::MIN, 1, 3);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0], FeatureValue::Integer(i64::MIN));
        assert!(candidate_range(0, 1, -1).is_empty());
    }

    #[test]
    fn test_all_candidates_accepted_and_restored() {
        let mut cam = camera();
        cam.set_value("SequencerPathSelector", &FeatureValue::Integer(1))
            .unwrap();

        let outcome = test_write(&mut cam, "SequencerPathSelector", &candidate_range(0, 1, 3), true);

        assert!(outcome.all_accepted());
        assert_eq!(outcome.accepted_values().count(), 2);
        assert_eq!(outcome.restore, RestoreStatus::Restored);
        assert_eq!(
            cam.get_value("SequencerPathSelector").unwrap(),
            FeatureValue::Integer(1)
        );
    }

    #[test]
    fn test_restore_disabled_leaves_last_write() {
        let mut cam = camera();
        let outcome = test_write(&mut cam, "SequencerPathSelector", &candidate_range(0, 1, 3), false);

        assert_eq!(outcome.restore, RestoreStatus::Disabled);
        assert_eq!(
            cam.get_value("SequencerPathSelector").unwrap(),
            FeatureValue::Integer(1)
        );
    }

    #[test]
    fn test_out_of_range_candidate_never_reaches_device() {
        let mut cam = camera();
        let candidates = [FeatureValue::Integer(0), FeatureValue::Integer(4)];
        let outcome = test_write(&mut cam, "SequencerPathSelector", &candidates, true);

        assert!(outcome.attempts[0].accepted);
        assert!(!outcome.attempts[1].accepted);
        assert!(outcome.attempts[1]
            .error
            .as_deref()
            .unwrap()
            .contains("outside the declared range"));
    }

    #[test]
    fn test_rejections_are_recorded_per_candidate() {
        let mut cam = camera();
        let outcome = test_write(&mut cam, "Picky", &candidate_range(0, 5, 3), true);
        let accepted: Vec<_> = outcome.attempts.iter().map(|a| a.accepted).collect();
        assert_eq!(accepted, vec![true, false, true]);
        assert_eq!(outcome.restore, RestoreStatus::Restored);
    }

    #[test]
    fn test_read_only_parameter_is_unchanged() {
        let mut cam = camera();
        let outcome = test_write(&mut cam, "Locked", &candidate_range(0, 10, 3), true);
        assert!(outcome.accepted_values().next().is_none());
        assert_eq!(outcome.restore, RestoreStatus::Unchanged);
        assert_eq!(outcome.original, Some(FeatureValue::Integer(7)));
    }
}
