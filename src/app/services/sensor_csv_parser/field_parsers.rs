//! Field parsing utilities for sensor CSV rows
//!
//! This module provides the naive line tokenizer and the numeric coercion
//! helpers shared by both decoding strategies. Coercion never fails: an
//! unusable cell becomes `None`.

use crate::app::models::{is_valid_latitude, is_valid_longitude};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches header text that declares a Celsius column ("°C", "° C", "celsius")
static CELSIUS_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)°\s?c|celsius").expect("Failed to compile Celsius header regex")
});

/// Temperature unit declared by a column header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// Headers without a Celsius marker are taken as Fahrenheit
    pub fn from_header(header: &str) -> Self {
        if CELSIUS_HEADER_REGEX.is_match(header) {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        }
    }
}

/// Split a line on commas, trimming each cell and removing double quotes
///
/// Quoted cells are not protected: an embedded comma still splits.
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().replace('"', ""))
        .collect()
}

/// Get a cell by index, or None past the end of a short row
pub fn cell(fields: &[String], index: usize) -> Option<&str> {
    fields.get(index).map(String::as_str)
}

/// Parse a finite number; empty and non-numeric cells yield None
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a latitude, discarding values outside [-90, 90]
pub fn parse_latitude(value: Option<&str>) -> Option<f64> {
    parse_number(value).filter(|v| is_valid_latitude(*v))
}

/// Parse a longitude, discarding values outside [-180, 180]
pub fn parse_longitude(value: Option<&str>) -> Option<f64> {
    parse_number(value).filter(|v| is_valid_longitude(*v))
}

/// Parse a temperature and normalize it to Fahrenheit
///
/// Celsius-labelled readings at or above `celsius_guard` are assumed to be
/// mislabelled Fahrenheit and are left alone.
pub fn parse_temperature(
    value: Option<&str>,
    unit: TemperatureUnit,
    celsius_guard: f64,
) -> Option<f64> {
    parse_number(value).map(|v| normalize_temperature(v, unit, celsius_guard))
}

/// Convert a reading to Fahrenheit according to its declared unit
pub fn normalize_temperature(value: f64, unit: TemperatureUnit, celsius_guard: f64) -> f64 {
    match unit {
        TemperatureUnit::Celsius if value < celsius_guard => value * 9.0 / 5.0 + 32.0,
        _ => value,
    }
}

/// Drop the sub-second part of a clock string ("19:32:51.484" -> "19:32:51")
pub fn strip_subseconds(time: &str) -> String {
    time.split('.').next().unwrap_or_default().trim().to_string()
}

/// Split a combined "date time" cell; returns the time part when present
pub fn split_date_time(value: &str) -> (String, Option<String>) {
    match value.split_once(' ') {
        Some((date, time)) => (date.trim().to_string(), Some(strip_subseconds(time))),
        None => (value.trim().to_string(), None),
    }
}
