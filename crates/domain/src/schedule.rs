//! Schedule — the fixed daily program the automation engine follows.
//!
//! Everything here is a pure function of the time of day:
//!
//! - the light and CO2 outputs follow lists of half-open on-windows,
//! - the dimmer follows a sine [`envelope`] over a reference window,
//!   multiplied by a [`ramp_gate`] that fades it out for a mid-afternoon
//!   dark period and back in afterwards.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::channel::level_to_percent;
use crate::error::ValidationError;
use crate::time::{Interval, TimeOfDay, is_on};

/// Smooth rise-peak-fall curve across `window`.
///
/// `sin(pi * (t - start) / (end - start))`: 0 at the start, 1 at the
/// midpoint, falling back towards 0 at the end. Returns 0 for any `t`
/// outside `[start, end)` instead of the negative lobe of the sine.
#[must_use]
pub fn envelope(window: &Interval, t: TimeOfDay) -> f64 {
    if !window.contains(t) {
        return 0.0;
    }
    let elapsed = f64::from(t.seconds() - window.start().seconds());
    (PI * elapsed / f64::from(window.len_secs())).sin()
}

/// Boundaries of the dimmer's dark period.
///
/// ```text
/// 1 ─────┐                 ┌───── 1
///         \               /
///          \_____________/
///  fade_out_start  dark_end
///        dark_start   fade_in_end
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDarkPeriod")]
pub struct DarkPeriod {
    fade_out_start: TimeOfDay,
    dark_start: TimeOfDay,
    dark_end: TimeOfDay,
    fade_in_end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawDarkPeriod {
    fade_out_start: TimeOfDay,
    dark_start: TimeOfDay,
    dark_end: TimeOfDay,
    fade_in_end: TimeOfDay,
}

impl TryFrom<RawDarkPeriod> for DarkPeriod {
    type Error = ValidationError;

    fn try_from(raw: RawDarkPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.fade_out_start, raw.dark_start, raw.dark_end, raw.fade_in_end)
    }
}

impl DarkPeriod {
    /// # Errors
    ///
    /// Returns [`ValidationError::DarkPeriodOrder`] unless
    /// `fade_out_start < dark_start <= dark_end < fade_in_end`.
    pub fn new(
        fade_out_start: TimeOfDay,
        dark_start: TimeOfDay,
        dark_end: TimeOfDay,
        fade_in_end: TimeOfDay,
    ) -> Result<Self, ValidationError> {
        if fade_out_start < dark_start && dark_start <= dark_end && dark_end < fade_in_end {
            Ok(Self {
                fade_out_start,
                dark_start,
                dark_end,
                fade_in_end,
            })
        } else {
            Err(ValidationError::DarkPeriodOrder)
        }
    }

    #[must_use]
    pub fn fade_out_start(&self) -> TimeOfDay {
        self.fade_out_start
    }

    #[must_use]
    pub fn dark_start(&self) -> TimeOfDay {
        self.dark_start
    }

    #[must_use]
    pub fn dark_end(&self) -> TimeOfDay {
        self.dark_end
    }

    #[must_use]
    pub fn fade_in_end(&self) -> TimeOfDay {
        self.fade_in_end
    }
}

impl Default for DarkPeriod {
    fn default() -> Self {
        Self {
            fade_out_start: TimeOfDay::from_hms(15, 30, 0),
            dark_start: TimeOfDay::from_hms(16, 0, 0),
            dark_end: TimeOfDay::from_hms(18, 0, 0),
            fade_in_end: TimeOfDay::from_hms(18, 30, 0),
        }
    }
}

/// Piecewise gate in `[0, 1]` suppressing the envelope around the dark period.
#[must_use]
pub fn ramp_gate(dark: &DarkPeriod, t: TimeOfDay) -> f64 {
    let fraction = |from: TimeOfDay, to: TimeOfDay| {
        f64::from(t.seconds() - from.seconds()) / f64::from(to.seconds() - from.seconds())
    };
    if t < dark.fade_out_start {
        1.0
    } else if t < dark.dark_start {
        1.0 - fraction(dark.fade_out_start, dark.dark_start)
    } else if t < dark.dark_end {
        0.0
    } else if t < dark.fade_in_end {
        fraction(dark.dark_end, dark.fade_in_end)
    } else {
        1.0
    }
}

/// Channel states the engine wants at a given time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    pub lights_on: bool,
    pub co2_on: bool,
    /// Filtration/heating; always on while automation runs.
    pub aux_on: bool,
    pub dimmer_percent: u8,
}

/// The daily program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Windows during which both light channels are on.
    pub lights: Vec<Interval>,
    /// Windows during which the CO2 valve is open.
    pub co2: Vec<Interval>,
    /// Reference window of the dimmer envelope.
    pub envelope: Interval,
    pub dark_period: DarkPeriod,
}

impl Default for Schedule {
    fn default() -> Self {
        let window = |start: u32, end: u32| {
            Interval::new_unchecked(TimeOfDay::from_hms(start, 0, 0), TimeOfDay::from_hms(end, 0, 0))
        };
        Self {
            lights: vec![window(12, 16), window(18, 22)],
            co2: vec![window(10, 14), window(16, 20)],
            envelope: window(12, 22),
            dark_period: DarkPeriod::default(),
        }
    }
}

impl Schedule {
    #[must_use]
    pub fn lights_on(&self, now: TimeOfDay) -> bool {
        is_on(&self.lights, now)
    }

    #[must_use]
    pub fn co2_on(&self, now: TimeOfDay) -> bool {
        is_on(&self.co2, now)
    }

    /// `envelope(now) * ramp_gate(now)`, in `[0, 1]`.
    #[must_use]
    pub fn dimmer_level(&self, now: TimeOfDay) -> f64 {
        envelope(&self.envelope, now) * ramp_gate(&self.dark_period, now)
    }

    #[must_use]
    pub fn evaluate(&self, now: TimeOfDay) -> DesiredState {
        DesiredState {
            lights_on: self.lights_on(now),
            co2_on: self.co2_on(now),
            aux_on: true,
            dimmer_percent: level_to_percent(self.dimmer_level(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn dot(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn reference_window() -> Interval {
        Interval::parse("12:00:00", "22:00:00").unwrap()
    }

    #[test]
    fn should_peak_envelope_at_window_midpoint() {
        let level = envelope(&reference_window(), dot("17:00:00"));
        assert!((level - 1.0).abs() < EPSILON, "got {level}");
    }

    #[test]
    fn should_zero_envelope_at_window_endpoints() {
        assert!(envelope(&reference_window(), dot("12:00:00")).abs() < EPSILON);
        assert!(envelope(&reference_window(), dot("22:00:00")).abs() < EPSILON);
    }

    #[test]
    fn should_keep_envelope_symmetric() {
        let rise = envelope(&reference_window(), dot("13:00:00"));
        let fall = envelope(&reference_window(), dot("21:00:00"));
        assert!((rise - fall).abs() < EPSILON);
        assert!(rise > 0.3 && rise < 0.32);
    }

    #[test]
    fn should_not_go_negative_outside_window() {
        assert!(envelope(&reference_window(), dot("08:00:00")).abs() < EPSILON);
        assert!(envelope(&reference_window(), dot("23:30:00")).abs() < EPSILON);
    }

    #[test]
    fn should_gate_dimmer_around_dark_period() {
        let dark = DarkPeriod::default();
        assert!((ramp_gate(&dark, dot("15:00:00")) - 1.0).abs() < EPSILON);
        assert!((ramp_gate(&dark, dot("15:45:00")) - 0.5).abs() < EPSILON);
        assert!(ramp_gate(&dark, dot("17:00:00")).abs() < EPSILON);
        assert!((ramp_gate(&dark, dot("18:15:00")) - 0.5).abs() < EPSILON);
        assert!((ramp_gate(&dark, dot("19:00:00")) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn should_hit_ramp_boundaries_exactly() {
        let dark = DarkPeriod::default();
        assert!((ramp_gate(&dark, dot("15:30:00")) - 1.0).abs() < EPSILON);
        assert!(ramp_gate(&dark, dot("16:00:00")).abs() < EPSILON);
        assert!(ramp_gate(&dark, dot("18:00:00")).abs() < EPSILON);
        assert!((ramp_gate(&dark, dot("18:30:00")) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn should_reject_unordered_dark_period() {
        let result = DarkPeriod::new(
            dot("16:00:00"),
            dot("15:30:00"),
            dot("18:00:00"),
            dot("18:30:00"),
        );
        assert_eq!(result, Err(ValidationError::DarkPeriodOrder));
    }

    #[test]
    fn should_allow_dark_period_without_plateau() {
        let dark = DarkPeriod::new(
            dot("15:30:00"),
            dot("16:00:00"),
            dot("16:00:00"),
            dot("16:30:00"),
        )
        .unwrap();
        assert!(ramp_gate(&dark, dot("16:00:00")).abs() < EPSILON);
        assert!((ramp_gate(&dark, dot("16:15:00")) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn should_evaluate_midday_as_lit_with_co2() {
        let state = Schedule::default().evaluate(dot("13:00:00"));
        assert!(state.lights_on);
        assert!(state.co2_on);
        assert!(state.aux_on);
        assert_eq!(state.dimmer_percent, 31);
    }

    #[test]
    fn should_evaluate_dark_period_as_unlit_and_dimmed() {
        let state = Schedule::default().evaluate(dot("17:00:00"));
        assert!(!state.lights_on);
        assert!(state.co2_on);
        assert_eq!(state.dimmer_percent, 0);
    }

    #[test]
    fn should_evaluate_night_as_everything_off_but_aux() {
        let state = Schedule::default().evaluate(dot("08:00:00"));
        assert!(!state.lights_on);
        assert!(!state.co2_on);
        assert!(state.aux_on);
        assert_eq!(state.dimmer_percent, 0);
    }

    #[test]
    fn should_half_dim_in_the_middle_of_the_fade_in() {
        // envelope(18:15) = sin(0.625 pi) ~ 0.924, gate 0.5
        let state = Schedule::default().evaluate(dot("18:15:00"));
        assert!(state.lights_on);
        assert_eq!(state.dimmer_percent, 46);
    }

    #[test]
    fn should_deserialize_partial_schedule_with_defaults() {
        let schedule: Schedule = toml::from_str(
            "
            lights = [{ start = '09:00:00', end = '11:00:00' }]

            [dark_period]
            fade_out_start = '14:00:00'
            dark_start = '14:10:00'
            dark_end = '14:20:00'
            fade_in_end = '14:30:00'
            ",
        )
        .unwrap();
        assert_eq!(schedule.lights, vec![Interval::parse("09:00:00", "11:00:00").unwrap()]);
        assert_eq!(schedule.co2, Schedule::default().co2);
        assert_eq!(schedule.dark_period.dark_start(), dot("14:10:00"));
    }

    #[test]
    fn should_reject_malformed_literal_in_schedule() {
        let result: Result<Schedule, _> =
            toml::from_str("envelope = { start = '12:00', end = '22:00:00' }");
        assert!(result.is_err());
    }
}
