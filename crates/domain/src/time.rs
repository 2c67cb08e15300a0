//! Time-of-day helpers.
//!
//! A [`TimeOfDay`] (a "dot") is the number of whole seconds since local
//! midnight. The automation schedule is expressed entirely in dots and
//! half-open [`Interval`]s of dots.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Seconds in a (DST-free) day; the exclusive upper bound of a dot.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Whole seconds since local midnight, always in `0..SECONDS_PER_DAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// `00:00:00`.
    pub const MIDNIGHT: Self = Self(0);

    /// Build from components. Values past the end of the day wrap around.
    #[must_use]
    pub const fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self::from_seconds(hour * 3600 + minute * 60 + second)
    }

    /// Build from seconds since midnight, wrapping into the day.
    #[must_use]
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds % SECONDS_PER_DAY)
    }

    /// The current local wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(Local::now().time())
    }

    /// Seconds since midnight.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(self.0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        // leap seconds (nanosecond >= 1e9) still report 23:59:59 here
        Self::from_seconds(time.num_seconds_from_midnight())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, rest) = (self.0 / 3600, self.0 % 3600);
        write!(f, "{h:02}:{:02}:{:02}", rest / 60, rest % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .map(Self::from)
            .map_err(|_| ValidationError::MalformedScheduleLiteral(s.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Half-open range `[start, end)` of dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawInterval {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<RawInterval> for Interval {
    type Error = ValidationError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Create an interval, rejecting `end <= start`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyInterval`] when the range holds no dot.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EmptyInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub(crate) const fn new_unchecked(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parse both bounds from `HH:MM:SS` literals.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedScheduleLiteral`] for an unparsable
    /// bound, or [`ValidationError::EmptyInterval`].
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(start.parse()?, end.parse()?)
    }

    #[must_use]
    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Length in seconds.
    #[must_use]
    pub fn len_secs(&self) -> u32 {
        self.end.seconds() - self.start.seconds()
    }

    /// `start <= dot < end`.
    #[must_use]
    pub fn contains(&self, dot: TimeOfDay) -> bool {
        self.start <= dot && dot < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Whether `dot` falls inside any of `windows`.
#[must_use]
pub fn is_on(windows: &[Interval], dot: TimeOfDay) -> bool {
    windows.iter().any(|window| window.contains(dot))
}

/// Seconds from `now` to the smallest multiple of `interval_secs` (counted
/// from midnight) that is `>= now`. Zero when `now` is already aligned.
///
/// The multiple may lie past the end of the day when `interval_secs` does not
/// divide it.
#[must_use]
pub fn seconds_until_next_multiple(now: TimeOfDay, interval_secs: u32) -> u32 {
    if interval_secs == 0 {
        return 0;
    }
    (interval_secs - now.seconds() % interval_secs) % interval_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn should_parse_hh_mm_ss_literal() {
        assert_eq!(dot("12:00:05").seconds(), 43_205);
        assert_eq!(dot("00:00:00"), TimeOfDay::MIDNIGHT);
        assert_eq!(dot("23:59:59").seconds(), SECONDS_PER_DAY - 1);
    }

    #[test]
    fn should_reject_malformed_literal() {
        for literal in ["", "12:00", "25:00:00", "12:61:00", "noon", "12-00-00"] {
            assert_eq!(
                literal.parse::<TimeOfDay>(),
                Err(ValidationError::MalformedScheduleLiteral(literal.to_string())),
                "{literal:?} should not parse"
            );
        }
    }

    #[test]
    fn should_format_with_leading_zeros() {
        assert_eq!(TimeOfDay::from_hms(7, 5, 3).to_string(), "07:05:03");
        assert_eq!(TimeOfDay::MIDNIGHT.to_string(), "00:00:00");
    }

    #[test]
    fn should_wrap_seconds_past_end_of_day() {
        assert_eq!(TimeOfDay::from_seconds(SECONDS_PER_DAY + 5).seconds(), 5);
        assert_eq!(TimeOfDay::from_hms(24, 0, 1).seconds(), 1);
    }

    #[test]
    fn should_convert_from_naive_time_ignoring_subseconds() {
        let time = NaiveTime::from_hms_milli_opt(12, 0, 5, 900).unwrap();
        assert_eq!(TimeOfDay::from(time), TimeOfDay::from_hms(12, 0, 5));
        assert_eq!(
            TimeOfDay::from_hms(12, 0, 5).as_naive_time(),
            NaiveTime::from_hms_opt(12, 0, 5).unwrap()
        );
    }

    #[test]
    fn should_serialize_as_string() {
        let json = serde_json::to_string(&TimeOfDay::from_hms(18, 30, 0)).unwrap();
        assert_eq!(json, "\"18:30:00\"");
        let parsed: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TimeOfDay::from_hms(18, 30, 0));
        assert!(serde_json::from_str::<TimeOfDay>("\"18h30\"").is_err());
    }

    #[test]
    fn should_treat_interval_end_as_exclusive() {
        let interval = Interval::parse("12:00:00", "16:00:00").unwrap();
        assert!(interval.contains(dot("12:00:00")));
        assert!(interval.contains(dot("15:59:59")));
        assert!(!interval.contains(dot("16:00:00")));
        assert!(!interval.contains(dot("11:59:59")));
        assert_eq!(interval.len_secs(), 4 * 3600);
    }

    #[test]
    fn should_reject_empty_or_reversed_interval() {
        assert!(matches!(
            Interval::parse("16:00:00", "16:00:00"),
            Err(ValidationError::EmptyInterval { .. })
        ));
        assert!(matches!(
            Interval::parse("22:00:00", "06:00:00"),
            Err(ValidationError::EmptyInterval { .. })
        ));
    }

    #[test]
    fn should_match_any_window() {
        let windows = [
            Interval::parse("12:00:00", "16:00:00").unwrap(),
            Interval::parse("18:00:00", "22:00:00").unwrap(),
        ];
        assert!(is_on(&windows, dot("13:00:00")));
        assert!(is_on(&windows, dot("18:00:00")));
        assert!(!is_on(&windows, dot("17:00:00")));
        assert!(!is_on(&windows, dot("22:00:00")));
        assert!(!is_on(&[], dot("13:00:00")));
    }

    #[test]
    fn should_count_seconds_to_next_aligned_boundary() {
        assert_eq!(seconds_until_next_multiple(dot("12:00:05"), 60), 55);
        assert_eq!(seconds_until_next_multiple(dot("12:00:00"), 60), 0);
        assert_eq!(seconds_until_next_multiple(dot("12:07:00"), 600), 180);
        assert_eq!(seconds_until_next_multiple(dot("23:59:59"), 3600), 1);
        assert_eq!(seconds_until_next_multiple(dot("00:00:00"), 7), 0);
        assert_eq!(seconds_until_next_multiple(dot("00:00:01"), 7), 6);
    }

    #[test]
    fn should_deserialize_interval_from_toml_table() {
        #[derive(Deserialize)]
        struct Doc {
            window: Interval,
        }
        let doc: Doc = toml::from_str("window = { start = '10:00:00', end = '14:00:00' }").unwrap();
        assert_eq!(doc.window.start(), TimeOfDay::from_hms(10, 0, 0));
        assert_eq!(doc.window.end(), TimeOfDay::from_hms(14, 0, 0));

        let reversed: Result<Doc, _> =
            toml::from_str("window = { start = '14:00:00', end = '10:00:00' }");
        assert!(reversed.is_err());
    }
}
