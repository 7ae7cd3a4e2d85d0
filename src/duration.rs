use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

// Fraction digits beyond this cannot change a nanosecond count for any unit.
const MAX_FRACTION_DIGITS: usize = 18;

/// A span of time as understood by the workqueue backend.
///
/// `Duration` wraps [`std::time::Duration`] and gives it the compact text form
/// the backend speaks on the wire: a sequence of `<magnitude><unit>` components
/// such as `"168h"`, `"5min"`, `"1h30m"` or `"1.5s"`.
///
/// Values serialize to the canonical form produced by [`Display`](fmt::Display)
/// (`"5m0s"`, `"168h0m0s"`, `"250ms"`), which always parses back to the same span.
///
/// # Examples
///
/// ```
/// use workqueue::Duration;
///
/// let retention: Duration = "168h".parse().unwrap();
/// assert_eq!(retention.to_string(), "168h0m0s");
///
/// let delay = Duration::parse("5min").unwrap();
/// assert_eq!(delay, Duration::from_mins(5));
/// assert_eq!(delay.to_string(), "5m0s");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(std::time::Duration);

/// Reasons a duration string is rejected by [`Duration::parse`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("empty duration string")]
    Empty,

    #[error("invalid duration magnitude in {0:?}")]
    InvalidMagnitude(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

impl Duration {
    pub const ZERO: Duration = Duration(std::time::Duration::ZERO);

    /// Parses a duration string such as `"168h"`, `"5min"` or `"1h30m15.5s"`.
    ///
    /// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` (or `min`) and `h`.
    /// Magnitudes may carry a decimal fraction. The bare string `"0"` is zero.
    ///
    /// # Errors
    ///
    /// Returns a [`DurationParseError`] for empty input, a non-numeric magnitude,
    /// a missing or unrecognised unit, or a span too large to represent.
    pub fn parse(text: &str) -> Result<Self, DurationParseError> {
        if text.is_empty() {
            return Err(DurationParseError::Empty);
        }
        if text == "0" {
            return Ok(Self::ZERO);
        }

        let mut rest = text;
        let mut total: u128 = 0;

        while !rest.is_empty() {
            let magnitude_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let (magnitude, tail) = rest.split_at(magnitude_end);

            let unit_end = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);

            let (whole, fraction) = split_magnitude(magnitude)
                .ok_or_else(|| DurationParseError::InvalidMagnitude(text.to_string()))?;

            if unit.is_empty() {
                return Err(DurationParseError::MissingUnit(text.to_string()));
            }
            let scale = unit_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
                unit: unit.to_string(),
                input: text.to_string(),
            })?;

            total = scale_component(whole, fraction, scale)
                .and_then(|nanos| total.checked_add(nanos))
                .ok_or_else(|| DurationParseError::Overflow(text.to_string()))?;

            rest = tail;
        }

        from_total_nanos(total).ok_or_else(|| DurationParseError::Overflow(text.to_string()))
    }

    /// Saturates at `u64::MAX` seconds instead of overflowing.
    pub const fn from_hours(hours: u64) -> Self {
        Self(std::time::Duration::from_secs(hours.saturating_mul(3600)))
    }

    /// Saturates at `u64::MAX` seconds instead of overflowing.
    pub const fn from_mins(mins: u64) -> Self {
        Self(std::time::Duration::from_secs(mins.saturating_mul(60)))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(std::time::Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(std::time::Duration::from_millis(millis))
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(std::time::Duration::from_nanos(nanos))
    }

    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub const fn as_std(&self) -> std::time::Duration {
        self.0
    }

    pub const fn as_nanos(&self) -> u128 {
        self.0.as_nanos()
    }
}

fn split_magnitude(magnitude: &str) -> Option<(&str, &str)> {
    let (whole, fraction) = match magnitude.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (magnitude, ""),
    };
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return None;
    }
    Some((whole, fraction))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" | "min" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

fn scale_component(whole: &str, fraction: &str, scale: u128) -> Option<u128> {
    let mut value: u128 = 0;
    for digit in whole.bytes() {
        value = value
            .checked_mul(10)?
            .checked_add(u128::from(digit - b'0'))?;
    }
    let mut nanos = value.checked_mul(scale)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let mut numerator: u128 = 0;
        let mut denominator: u128 = 1;
        for digit in fraction.bytes() {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }
        nanos = nanos.checked_add(numerator * scale / denominator)?;
    }

    Some(nanos)
}

fn from_total_nanos(total: u128) -> Option<Duration> {
    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    // Remainder of a division by 1e9 always fits in u32.
    let subsec = (total % NANOS_PER_SEC) as u32;
    Some(Duration(std::time::Duration::new(secs, subsec)))
}

/// Splits `value` into a whole part and a `.fraction` suffix with `precision`
/// decimal places, trailing zeros trimmed.
fn split_fraction(value: u128, precision: u32) -> (u128, String) {
    let scale = 10u128.pow(precision);
    let (whole, remainder) = (value / scale, value % scale);
    if remainder == 0 {
        return (whole, String::new());
    }
    let digits = format!("{:0width$}", remainder, width = precision as usize);
    (whole, format!(".{}", digits.trim_end_matches('0')))
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }

        if nanos < NANOS_PER_SEC {
            let (precision, unit) = if nanos < NANOS_PER_MICRO {
                (0, "ns")
            } else if nanos < NANOS_PER_MILLI {
                (3, "µs")
            } else {
                (6, "ms")
            };
            let (whole, fraction) = split_fraction(nanos, precision);
            return write!(f, "{whole}{fraction}{unit}");
        }

        let (total_secs, fraction) = split_fraction(nanos, 9);
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        if total_mins == 0 {
            return write!(f, "{secs}{fraction}s");
        }

        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if hours == 0 {
            write!(f, "{mins}m{secs}{fraction}s")
        } else {
            write!(f, "{hours}h{mins}m{secs}{fraction}s")
        }
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self(value)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a duration string like \"5m0s\" or a nanosecond count")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        Duration::parse(value).map_err(E::custom)
    }

    // Go encoders emit time.Duration as integer nanoseconds.
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom("negative durations are not supported"))
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}
