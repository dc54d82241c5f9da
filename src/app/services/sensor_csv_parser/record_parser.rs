//! Individual row decoding for sensor CSV files
//!
//! One function per decoding strategy turns a tokenized line into a
//! `CsvRecord`; a third narrows a record into a drawable point.

use super::column_mapping::{ColumnMap, SemanticField};
use super::field_parsers::{
    TemperatureUnit, cell, parse_latitude, parse_longitude, parse_number, parse_temperature,
    split_date_time, strip_subseconds,
};
use crate::app::models::{CsvRecord, VisualizationPoint};
use crate::constants::positional_layout;

/// Temperature units declared by the header of a positional file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalUnits {
    pub internal: TemperatureUnit,
    pub probe: TemperatureUnit,
}

impl PositionalUnits {
    /// Read the unit markers from the header cells at the temperature positions
    pub fn from_header(header: &[String]) -> Self {
        let unit_at = |index: usize| {
            cell(header, index)
                .map(TemperatureUnit::from_header)
                .unwrap_or(TemperatureUnit::Fahrenheit)
        };
        Self {
            internal: unit_at(positional_layout::INTERNAL_TEMPERATURE),
            probe: unit_at(positional_layout::PROBE_TEMPERATURE),
        }
    }
}

impl Default for PositionalUnits {
    fn default() -> Self {
        Self {
            internal: TemperatureUnit::Fahrenheit,
            probe: TemperatureUnit::Fahrenheit,
        }
    }
}

/// Decode a row of the fixed 7-column layout
///
/// Missing trailing cells and non-numeric cells become absent values.
pub fn decode_positional_row(
    fields: &[String],
    units: PositionalUnits,
    celsius_guard: f64,
) -> CsvRecord {
    use positional_layout::*;

    CsvRecord {
        date: cell(fields, DATE).unwrap_or_default().to_string(),
        time: strip_subseconds(cell(fields, TIME).unwrap_or_default()),
        elapsed_seconds: parse_number(cell(fields, SECONDS)),
        latitude: parse_latitude(cell(fields, LATITUDE)),
        longitude: parse_longitude(cell(fields, LONGITUDE)),
        internal_temperature: parse_temperature(
            cell(fields, INTERNAL_TEMPERATURE),
            units.internal,
            celsius_guard,
        ),
        probe_temperature: parse_temperature(
            cell(fields, PROBE_TEMPERATURE),
            units.probe,
            celsius_guard,
        ),
    }
}

/// Decode a row using a header-derived column map
pub fn decode_mapped_row(fields: &[String], map: &ColumnMap, celsius_guard: f64) -> CsvRecord {
    let value = |field: SemanticField| map.index(field).and_then(|i| cell(fields, i));

    // A date cell may carry the clock as well ("11/08/2021 19:32:51.484")
    let (date, embedded_time) = value(SemanticField::Date)
        .map(split_date_time)
        .unwrap_or_default();
    let time = match embedded_time {
        Some(time) => time,
        None => strip_subseconds(value(SemanticField::Time).unwrap_or_default()),
    };

    CsvRecord {
        date,
        time,
        elapsed_seconds: parse_number(value(SemanticField::Seconds)),
        latitude: parse_latitude(value(SemanticField::Latitude)),
        longitude: parse_longitude(value(SemanticField::Longitude)),
        internal_temperature: parse_temperature(
            value(SemanticField::InternalTemperature),
            map.unit(SemanticField::InternalTemperature),
            celsius_guard,
        ),
        probe_temperature: parse_temperature(
            value(SemanticField::ProbeTemperature),
            map.unit(SemanticField::ProbeTemperature),
            celsius_guard,
        ),
    }
}

/// Narrow a record into a drawable point
///
/// Requires valid coordinates and at least one temperature. A missing
/// temperature borrows the other one.
pub fn to_visualization_point(record: &CsvRecord) -> Result<VisualizationPoint, &'static str> {
    let (Some(lat), Some(lng)) = (record.latitude, record.longitude) else {
        return Err("missing or out-of-range coordinates");
    };

    let (probe_temp, internal_temp) =
        match (record.probe_temperature, record.internal_temperature) {
            (Some(probe), Some(internal)) => (probe, internal),
            (Some(probe), None) => (probe, probe),
            (None, Some(internal)) => (internal, internal),
            (None, None) => return Err("no temperature reading"),
        };

    Ok(VisualizationPoint {
        date: record.date.clone(),
        time: record.time.clone(),
        lat,
        lng,
        probe_temp,
        internal_temp,
    })
}

/// Names of the numeric fields absent from a record
pub fn absent_fields(record: &CsvRecord) -> Vec<&'static str> {
    let mut absent = Vec::new();
    if record.elapsed_seconds.is_none() {
        absent.push("seconds");
    }
    if record.latitude.is_none() {
        absent.push("latitude");
    }
    if record.longitude.is_none() {
        absent.push("longitude");
    }
    if record.internal_temperature.is_none() {
        absent.push("internalTemperature");
    }
    if record.probe_temperature.is_none() {
        absent.push("probeTemperature");
    }
    absent
}
