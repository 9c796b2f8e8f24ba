//! Light gate.
//!
//! Photocell readings wander around the threshold at dusk.  The gate is
//! evaluated once per wake cycle and nowhere else, so that wander only ever
//! shows up as one cycle's decision and never as rapid toggling.

use crate::error::SensorError;

/// `true` when the room is bright enough for a full action.
///
/// A failed read counts as dark: a silent bird is the safe mistake.
pub fn is_light_sufficient(reading: Result<u16, SensorError>, threshold: u16) -> bool {
    match reading {
        Ok(level) => level >= threshold,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_light_sufficient(Ok(1200), 1200));
        assert!(is_light_sufficient(Ok(4095), 1200));
        assert!(!is_light_sufficient(Ok(1199), 1200));
    }

    #[test]
    fn zero_threshold_is_always_lit() {
        assert!(is_light_sufficient(Ok(0), 0));
    }

    #[test]
    fn sensor_errors_count_as_dark() {
        assert!(!is_light_sufficient(Err(SensorError::AdcReadFailed), 0));
        assert!(!is_light_sufficient(Err(SensorError::NotPresent), 100));
    }
}
