//! Boundary validation of raw selections from the presentation layer

use crate::error::{Result, TrialError};
use crate::registry::TrialId;

/// Highest valid selection per trial: card 0-2, digit 0-5, push tick 0
pub fn max_selection(trial: TrialId) -> u8 {
    match trial {
        TrialId::Telekinesis => 0,
        TrialId::Clairvoyance => super::payload::CARD_SLOTS as u8 - 1,
        TrialId::Precognition => super::payload::DIGIT_MAX,
    }
}

/// A selection already checked against its trial's range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection(u8);

impl Selection {
    pub fn validate(trial: TrialId, raw: i64) -> Result<Self> {
        let max = max_selection(trial);
        if raw < 0 || raw > max as i64 {
            return Err(TrialError::InvalidSelection {
                trial,
                value: raw,
                max,
            });
        }
        Ok(Selection(raw as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_range() {
        assert_eq!(Selection::validate(TrialId::Clairvoyance, 2).unwrap().value(), 2);
        let err = Selection::validate(TrialId::Clairvoyance, 3).unwrap_err();
        assert!(matches!(
            err,
            TrialError::InvalidSelection { value: 3, max: 2, .. }
        ));
    }

    #[test]
    fn test_digit_range() {
        for d in 0..=5 {
            assert!(Selection::validate(TrialId::Precognition, d).is_ok());
        }
        assert!(Selection::validate(TrialId::Precognition, 6).is_err());
        assert!(Selection::validate(TrialId::Precognition, -1).is_err());
    }

    #[test]
    fn test_tick_only_accepts_zero() {
        assert_eq!(Selection::validate(TrialId::Telekinesis, 0).unwrap().value(), 0);
        assert!(Selection::validate(TrialId::Telekinesis, 1).is_err());
    }

    #[test]
    fn test_error_message() {
        let err = Selection::validate(TrialId::Precognition, 9).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid selection 9 for precognition (expected 0..=5)"
        );
    }
}
