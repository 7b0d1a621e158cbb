//! Classification of lines arriving from the sensor
//!
//! The sensor multiplexes speed readings and free text on one line stream.
//! A line is a reading exactly when it is a plain decimal literal:
//! optional sign, digits with an optional decimal point, optional exponent.
//! `inf`, `nan` and values that overflow to infinity are not readings.

use crate::types::Reading;
use std::time::Instant;

/// Result of classifying one line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Timeout or blank line; ignored without a report
    Empty,
    /// A speed reading
    Reading(Reading),
    /// Anything else, reported verbatim to the diagnostic sink
    Unrecognized(String),
}

/// Classify a line received at `now`
pub fn parse_line(line: &str, now: Instant) -> ParsedLine {
    let text = line.trim();
    if text.is_empty() {
        return ParsedLine::Empty;
    }

    match parse_speed(text) {
        Some(raw_speed) => ParsedLine::Reading(Reading::new(now, raw_speed)),
        None => ParsedLine::Unrecognized(text.to_string()),
    }
}

/// Parse a decimal literal into a finite value
pub fn parse_speed(text: &str) -> Option<f64> {
    if !is_decimal_literal(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
