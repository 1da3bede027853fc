use polars::prelude::TimeUnit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::FrequencyError;

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Units used when printing a Frequency, largest first
const DISPLAY_UNITS: [(i64, &str); 7] = [
    (NANOS_PER_DAY, "d"),
    (NANOS_PER_HOUR, "h"),
    (NANOS_PER_MINUTE, "min"),
    (NANOS_PER_SECOND, "s"),
    (NANOS_PER_MILLI, "ms"),
    (NANOS_PER_MICRO, "us"),
    (1, "ns"),
];

/// A fixed sampling interval, used as the spacing of placeholder rows inserted across a timegap.
///
/// Frequencies are written as a magnitude followed by a unit, with or without a space between
/// them. Both the short aliases used by instrument software (`10S`, `500ms`, `1min`, `2H`) and
/// spelled out units (`10 seconds`) are accepted; unit names are case-insensitive. A bare unit
/// (`S`) means a magnitude of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    nanos: i64,
}

impl Frequency {
    pub fn from_nanos(nanos: i64) -> Result<Self, FrequencyError> {
        if nanos <= 0 {
            return Err(FrequencyError::NotPositive(format!("{nanos}ns")));
        }
        Ok(Self { nanos })
    }

    pub fn from_secs(secs: i64) -> Result<Self, FrequencyError> {
        Self::from_nanos(secs.saturating_mul(NANOS_PER_SECOND))
    }

    pub fn parse(expr: &str) -> Result<Self, FrequencyError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(FrequencyError::Empty);
        }

        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (magnitude, unit) = trimmed.split_at(split);
        let unit = unit.trim();

        let magnitude: f64 = if magnitude.is_empty() {
            1.0
        } else {
            magnitude
                .parse()
                .map_err(|_| FrequencyError::BadMagnitude(expr.to_string()))?
        };
        let scale = unit_nanos(unit)
            .ok_or_else(|| FrequencyError::UnknownUnit(expr.to_string(), unit.to_string()))?;

        let nanos = (magnitude * scale as f64).round();
        if !nanos.is_finite() || nanos < 1.0 || nanos > i64::MAX as f64 {
            return Err(FrequencyError::NotPositive(expr.to_string()));
        }
        Ok(Self {
            nanos: nanos as i64,
        })
    }

    pub fn as_nanos(&self) -> i64 {
        self.nanos
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SECOND as f64
    }

    /// Express the interval as a count of ticks of a timestamp column's unit.
    /// Returns None if the interval is not a positive whole number of ticks.
    pub fn in_unit(&self, unit: TimeUnit) -> Option<i64> {
        let tick = match unit {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => NANOS_PER_MICRO,
            TimeUnit::Milliseconds => NANOS_PER_MILLI,
        };
        let ticks = self.nanos / tick;
        (ticks > 0 && self.nanos % tick == 0).then_some(ticks)
    }
}

fn unit_nanos(unit: &str) -> Option<i64> {
    let nanos = match unit.to_ascii_lowercase().as_str() {
        "ns" | "nanosecond" | "nanoseconds" => 1,
        "us" | "µs" | "microsecond" | "microseconds" => NANOS_PER_MICRO,
        "ms" | "l" | "millisecond" | "milliseconds" => NANOS_PER_MILLI,
        "s" | "sec" | "secs" | "second" | "seconds" => NANOS_PER_SECOND,
        "m" | "t" | "min" | "mins" | "minute" | "minutes" => NANOS_PER_MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => NANOS_PER_HOUR,
        "d" | "day" | "days" => NANOS_PER_DAY,
        _ => return None,
    };
    Some(nanos)
}

impl Default for Frequency {
    /// Ten seconds, the cadence of a diffraction scan
    fn default() -> Self {
        Self {
            nanos: 10 * NANOS_PER_SECOND,
        }
    }
}

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Frequency {
    type Error = FrequencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Every interval is a whole number of nanoseconds, so the last unit always matches
        let (scale, name) = DISPLAY_UNITS
            .iter()
            .find(|(scale, _)| self.nanos % scale == 0)
            .copied()
            .unwrap_or((1, "ns"));
        write!(f, "{}{}", self.nanos / scale, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_instrument_aliases() {
        assert_eq!(Frequency::parse("10S").unwrap().as_nanos(), 10 * NANOS_PER_SECOND);
        assert_eq!(Frequency::parse("10s").unwrap().as_nanos(), 10 * NANOS_PER_SECOND);
        assert_eq!(Frequency::parse("500ms").unwrap().as_nanos(), 500 * NANOS_PER_MILLI);
        assert_eq!(Frequency::parse("1min").unwrap().as_nanos(), NANOS_PER_MINUTE);
        assert_eq!(Frequency::parse("2H").unwrap().as_nanos(), 2 * NANOS_PER_HOUR);
        assert_eq!(Frequency::parse("S").unwrap().as_nanos(), NANOS_PER_SECOND);
    }

    #[test]
    fn parses_spelled_out_units() {
        assert_eq!(
            Frequency::parse("10 seconds").unwrap(),
            Frequency::from_secs(10).unwrap()
        );
        assert_eq!(
            Frequency::parse(" 1.5 minutes ").unwrap(),
            Frequency::from_secs(90).unwrap()
        );
    }

    #[test]
    fn rejects_bad_expressions() {
        assert_eq!(Frequency::parse("   "), Err(FrequencyError::Empty));
        assert!(matches!(
            Frequency::parse("10 fortnights"),
            Err(FrequencyError::UnknownUnit(_, _))
        ));
        assert!(matches!(
            Frequency::parse("1.2.3s"),
            Err(FrequencyError::BadMagnitude(_))
        ));
        assert!(matches!(
            Frequency::parse("0s"),
            Err(FrequencyError::NotPositive(_))
        ));
        assert!(Frequency::from_nanos(-5).is_err());
    }

    #[test]
    fn converts_to_column_units() {
        let freq = Frequency::parse("10s").unwrap();
        assert_eq!(freq.in_unit(TimeUnit::Milliseconds), Some(10_000));
        assert_eq!(freq.in_unit(TimeUnit::Microseconds), Some(10_000_000));
        assert_eq!(freq.in_unit(TimeUnit::Nanoseconds), Some(10 * NANOS_PER_SECOND));

        let fine = Frequency::parse("500us").unwrap();
        assert_eq!(fine.in_unit(TimeUnit::Milliseconds), None);
    }

    #[test]
    fn rejects_fractional_tick_counts() {
        let freq = Frequency::parse("1500us").unwrap();
        assert_eq!(freq.in_unit(TimeUnit::Milliseconds), None);
        assert_eq!(freq.in_unit(TimeUnit::Microseconds), Some(1500));
        assert_eq!(freq.in_unit(TimeUnit::Nanoseconds), Some(1_500_000));
    }

    #[test]
    fn displays_in_largest_whole_unit() {
        assert_eq!(Frequency::parse("120 seconds").unwrap().to_string(), "2min");
        assert_eq!(Frequency::parse("1500ms").unwrap().to_string(), "1500ms");
        assert_eq!(Frequency::parse("10S").unwrap().to_string(), "10s");
    }

    #[test]
    fn deserializes_from_yaml_string() {
        let freq: Frequency = serde_yaml::from_str("10 seconds").unwrap();
        assert_eq!(freq, Frequency::from_secs(10).unwrap());
        assert!(serde_yaml::from_str::<Frequency>("ten seconds").is_err());
    }
}
