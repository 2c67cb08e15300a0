//! Channel value types — polarity, channel kinds, PWM duty scaling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Clock divider programmed into the PWM peripheral at setup.
pub const PWM_CLOCK_DIVIDER: u32 = 16;

/// Counter range of the PWM peripheral; a duty of `PWM_RANGE` is fully on.
pub const PWM_RANGE: u32 = 1024;

/// Duty written to every PWM channel by `setup`.
pub const DEFAULT_PWM_PERCENT: u8 = 0;

/// Wiring polarity of the whole device.
///
/// Inversion is global rather than per channel: it reflects how the relay
/// board is wired, not how an individual load behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Normal,
    Inverted,
}

impl Polarity {
    #[must_use]
    pub fn from_inverted(inverted: bool) -> Self {
        if inverted {
            Self::Inverted
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub fn is_inverted(self) -> bool {
        matches!(self, Self::Inverted)
    }

    /// Map a logical level to a physical one (and back; the transform is
    /// its own inverse).
    #[must_use]
    pub fn apply(self, level: bool) -> bool {
        match self {
            Self::Normal => level,
            Self::Inverted => !level,
        }
    }
}

/// The two kinds of logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Switch,
    Pwm,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("switch"),
            Self::Pwm => f.write_str("pwm"),
        }
    }
}

/// Validate a requested duty in percent.
///
/// # Errors
///
/// Returns [`ValidationError::PercentOutOfRange`] above 100.
pub fn check_percent(percent: u32) -> Result<u8, ValidationError> {
    u8::try_from(percent)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(ValidationError::PercentOutOfRange(percent))
}

/// Scale a logical percent to the peripheral duty range.
#[must_use]
pub fn percent_to_duty(percent: u8) -> u32 {
    u32::from(percent.min(100)) * PWM_RANGE / 100
}

/// Round a dimmer level in `[0, 1]` to whole percent. Out-of-range and NaN
/// levels clamp to the nearest bound (NaN to 0).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn level_to_percent(level: f64) -> u8 {
    if level.is_nan() {
        return 0;
    }
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_leave_level_unchanged_with_normal_polarity() {
        assert!(Polarity::Normal.apply(true));
        assert!(!Polarity::Normal.apply(false));
    }

    #[test]
    fn should_invert_level_with_inverted_polarity() {
        assert!(!Polarity::Inverted.apply(true));
        assert!(Polarity::Inverted.apply(false));
        assert_eq!(Polarity::from_inverted(true), Polarity::Inverted);
        assert!(!Polarity::default().is_inverted());
    }

    #[test]
    fn should_accept_percent_up_to_hundred() {
        assert_eq!(check_percent(0), Ok(0));
        assert_eq!(check_percent(100), Ok(100));
        assert_eq!(
            check_percent(101),
            Err(ValidationError::PercentOutOfRange(101))
        );
        assert_eq!(
            check_percent(70_000),
            Err(ValidationError::PercentOutOfRange(70_000))
        );
    }

    #[test]
    fn should_scale_percent_to_duty_range() {
        assert_eq!(percent_to_duty(0), 0);
        assert_eq!(percent_to_duty(50), 512);
        assert_eq!(percent_to_duty(100), PWM_RANGE);
    }

    #[test]
    fn should_round_level_to_percent() {
        assert_eq!(level_to_percent(0.0), 0);
        assert_eq!(level_to_percent(0.494), 49);
        assert_eq!(level_to_percent(0.496), 50);
        assert_eq!(level_to_percent(1.0), 100);
        assert_eq!(level_to_percent(-0.3), 0);
        assert_eq!(level_to_percent(f64::NAN), 0);
    }

    #[test]
    fn should_display_kind_in_lowercase() {
        assert_eq!(ChannelKind::Switch.to_string(), "switch");
        assert_eq!(ChannelKind::Pwm.to_string(), "pwm");
    }
}
