//! Parsing of raw serial lines into temperature samples.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ParseError;

/// A single parsed temperature reading, in whatever units the device reports.
///
/// A `Sample` is always finite; malformed or non-finite lines never become
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Sample(f64);

impl Sample {
    /// Wrap a reading, rejecting infinities and NaN.
    pub fn new(value: f64) -> Result<Self, ParseError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ParseError::NonFinite(value.to_string()))
        }
    }

    /// The raw reading.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for Sample {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        let value: f64 = text.parse().map_err(|_| ParseError::NotANumber(text.to_string()))?;
        Sample::new(value)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_temperature(self.0))
    }
}

/// Decode one line of device output and parse it as a sample.
///
/// The line may still carry its `\r` terminator; surrounding whitespace is
/// ignored.
pub fn parse_line(line: &[u8]) -> Result<Sample, ParseError> {
    let text = std::str::from_utf8(line).map_err(|_| ParseError::Encoding)?;
    text.parse()
}

/// Format a reading for labels and annotations.
///
/// Whole numbers keep one decimal place ("36.0") the way the device prints
/// them; anything else uses the shortest exact representation.
pub fn format_temperature(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
