//! Data models for heat trace ingestion
//!
//! This module contains the core data structures for decoded sensor rows,
//! completeness reports and map-ready points. All of them are created per
//! request and dropped once the parse → analyze → report cycle finishes.

use crate::constants::{
    DEFAULT_MAP_CENTER, DEFAULT_MAP_MAX_ZOOM, DEFAULT_MAP_MIN_ZOOM, DEFAULT_MAP_ZOOM,
    LATITUDE_RANGE, LONGITUDE_RANGE,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Decoded Sensor Row
// =============================================================================

/// One decoded data row of a sensor CSV file
///
/// Numeric fields are `None` when the cell was empty, non-numeric, or (for
/// coordinates) outside the valid range. Temperatures are in Fahrenheit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRecord {
    /// Raw calendar string, unparsed; may be empty
    pub date: String,

    /// Raw clock string with any sub-second part removed
    pub time: String,

    /// Elapsed-time counter used only to compute the trace duration
    pub elapsed_seconds: Option<f64>,

    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: Option<f64>,

    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: Option<f64>,

    /// Logger body temperature
    pub internal_temperature: Option<f64>,

    /// External probe temperature
    pub probe_temperature: Option<f64>,
}

impl CsvRecord {
    /// Both coordinates are present
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// At least one temperature reading is present
    pub fn has_any_temperature(&self) -> bool {
        self.internal_temperature.is_some() || self.probe_temperature.is_some()
    }

    /// Whether any field carries data at all
    pub fn has_any_field(&self) -> bool {
        !self.date.is_empty()
            || !self.time.is_empty()
            || self.elapsed_seconds.is_some()
            || self.latitude.is_some()
            || self.longitude.is_some()
            || self.has_any_temperature()
    }

    /// `date time` joined, or None when both are empty
    pub fn timestamp(&self) -> Option<String> {
        match (self.date.is_empty(), self.time.is_empty()) {
            (true, true) => None,
            (false, true) => Some(self.date.clone()),
            (true, false) => Some(self.time.clone()),
            (false, false) => Some(format!("{} {}", self.date, self.time)),
        }
    }
}

// =============================================================================
// Analysis Report
// =============================================================================

/// Completeness summary of a decoded file
///
/// Missing flags follow an any-match policy: a single offending row sets the
/// flag for the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvAnalysisReport {
    /// Number of decoded data rows, valid or not
    pub num_records: usize,
    pub missing_lat_lng: bool,
    pub missing_internal_temp: bool,
    pub missing_probe_temp: bool,
    /// Span of the elapsed-seconds column in minutes, rounded to 2 decimals
    pub total_minutes: f64,
}

impl CsvAnalysisReport {
    /// Rows exist and no field is missing anywhere
    pub fn is_complete(&self) -> bool {
        self.num_records > 0
            && !self.missing_lat_lng
            && !self.missing_internal_temp
            && !self.missing_probe_temp
    }
}

// =============================================================================
// Visualization
// =============================================================================

/// A drawable point: every field is concrete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationPoint {
    pub date: String,
    pub time: String,
    pub lat: f64,
    pub lng: f64,
    pub probe_temp: f64,
    pub internal_temp: f64,
}

impl VisualizationPoint {
    pub fn position(&self) -> MapPosition {
        MapPosition {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Probe temperature summary over a point series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

// =============================================================================
// Map Geometry
// =============================================================================

/// A WGS84 coordinate on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub lat: f64,
    pub lng: f64,
}

impl MapPosition {
    /// Create a position, rejecting out-of-range coordinates
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let position = Self { lat, lng };
        if !position.is_valid() {
            return Err(Error::invalid_input(format!(
                "Invalid coordinate ({}, {}): latitude must be within [-90, 90] and longitude within [-180, 180]",
                lat, lng
            )));
        }
        Ok(position)
    }

    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.lat) && is_valid_longitude(self.lng)
    }
}

/// Check a latitude against the valid range
pub fn is_valid_latitude(value: f64) -> bool {
    (LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&value)
}

/// Check a longitude against the valid range
pub fn is_valid_longitude(value: f64) -> bool {
    (LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&value)
}

/// Initial viewport for the submissions map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub center: MapPosition,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: MapPosition {
                lat: DEFAULT_MAP_CENTER.0,
                lng: DEFAULT_MAP_CENTER.1,
            },
            zoom: DEFAULT_MAP_ZOOM,
            min_zoom: DEFAULT_MAP_MIN_ZOOM,
            max_zoom: DEFAULT_MAP_MAX_ZOOM,
        }
    }
}
