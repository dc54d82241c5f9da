//! Column detection for header-matched sensor CSV files
//!
//! Loggers from different vendors name their columns differently
//! ("Latitude", "GPS lat", "Thermistor Temperature (°C)", ...). This module
//! maps the header row onto a fixed set of semantic fields by
//! case-insensitive substring matching against prioritized candidates.

use super::field_parsers::TemperatureUnit;
use crate::constants::column_candidates;
use serde::Serialize;
use std::fmt;

/// Semantic fields recognized in a sensor trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticField {
    Date,
    Time,
    Seconds,
    Latitude,
    Longitude,
    InternalTemperature,
    ProbeTemperature,
}

impl SemanticField {
    /// All fields in declaration order
    pub const ALL: [SemanticField; 7] = [
        SemanticField::Date,
        SemanticField::Time,
        SemanticField::Seconds,
        SemanticField::Latitude,
        SemanticField::Longitude,
        SemanticField::InternalTemperature,
        SemanticField::ProbeTemperature,
    ];

    /// Header candidates in priority order
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Date => column_candidates::DATE,
            SemanticField::Time => column_candidates::TIME,
            SemanticField::Seconds => column_candidates::SECONDS,
            SemanticField::Latitude => column_candidates::LATITUDE,
            SemanticField::Longitude => column_candidates::LONGITUDE,
            SemanticField::InternalTemperature => column_candidates::INTERNAL_TEMPERATURE,
            SemanticField::ProbeTemperature => column_candidates::PROBE_TEMPERATURE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SemanticField::Date => "date",
            SemanticField::Time => "time",
            SemanticField::Seconds => "seconds",
            SemanticField::Latitude => "latitude",
            SemanticField::Longitude => "longitude",
            SemanticField::InternalTemperature => "internalTemperature",
            SemanticField::ProbeTemperature => "probeTemperature",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic field to header index mapping, built once per file
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    /// Cleaned header names (trimmed, quotes removed)
    headers: Vec<String>,

    /// Index per field, indexed by the field's discriminant
    indices: [Option<usize>; 7],
}

impl ColumnMap {
    /// Build the mapping from a cleaned header row
    pub fn from_headers(headers: &[String]) -> Self {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

        let mut indices = [None; 7];
        for (slot, field) in indices.iter_mut().zip(SemanticField::ALL) {
            *slot = find_column(&lowered, field.candidates());
        }

        Self {
            headers: headers.to_vec(),
            indices,
        }
    }

    /// Index of the column matched for a field, if any
    pub fn index(&self, field: SemanticField) -> Option<usize> {
        self.indices[field as usize]
    }

    /// Header text of the column matched for a field, if any
    pub fn header(&self, field: SemanticField) -> Option<&str> {
        self.index(field)
            .and_then(|i| self.headers.get(i))
            .map(String::as_str)
    }

    /// Unit declared by the header of a temperature field
    pub fn unit(&self, field: SemanticField) -> TemperatureUnit {
        self.header(field)
            .map(TemperatureUnit::from_header)
            .unwrap_or(TemperatureUnit::Fahrenheit)
    }

    /// Fields with no matching header
    pub fn missing_fields(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .into_iter()
            .filter(|field| self.index(*field).is_none())
            .collect()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

/// First candidate with any hit wins; within a candidate, the first column wins
fn find_column(lowered_headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        let needle = candidate.to_lowercase();
        lowered_headers.iter().position(|h| h.contains(&needle))
    })
}
