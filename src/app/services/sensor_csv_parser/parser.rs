//! Core sensor CSV parser implementation
//!
//! Two decoding strategies coexist because their callers need different
//! inclusion policies:
//! - positional decoding feeds validation, where every data line is kept so
//!   the row count is accurate and gaps are flagged rather than dropped;
//! - header-matched decoding feeds map rendering, where rows with nothing
//!   usable are dropped, and the visualization pass further keeps only
//!   drawable points.

use std::path::Path;
use tracing::{debug, info, warn};

use super::column_mapping::{ColumnMap, SemanticField};
use super::field_parsers::split_fields;
use super::record_parser::{
    PositionalUnits, absent_fields, decode_mapped_row, decode_positional_row,
    to_visualization_point,
};
use super::stats::{ParseResult, ParseStats, VisualizationResult};
use crate::app::models::CsvRecord;
use crate::config::IngestConfig;
use crate::constants::DEFAULT_CELSIUS_GUARD;
use crate::{Error, Result};

/// Sensor CSV parser
///
/// Holds only the unit-conversion threshold; every call is independent and
/// nothing about the input is retained.
#[derive(Debug, Clone, Copy)]
pub struct SensorCsvParser {
    celsius_guard: f64,
}

impl Default for SensorCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorCsvParser {
    /// Create a parser with the default Celsius guard
    pub fn new() -> Self {
        Self {
            celsius_guard: DEFAULT_CELSIUS_GUARD,
        }
    }

    /// Create a parser using the thresholds from configuration
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new().with_celsius_guard(config.celsius_guard)
    }

    /// Override the Celsius guard threshold
    pub fn with_celsius_guard(mut self, celsius_guard: f64) -> Self {
        self.celsius_guard = celsius_guard;
        self
    }

    /// Read an uploaded trace into memory
    pub async fn read_trace(path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read file {}", path.display()), e))
    }

    /// Decode by fixed position: date, time, seconds, lat, lng, internal, probe
    ///
    /// Every data line yields a record, including blank and malformed ones,
    /// so `records.len()` is the file's data line count.
    pub fn parse_positional(&self, raw: &str) -> ParseResult {
        let mut stats = ParseStats::new();
        let lines: Vec<&str> = clean_text(raw).lines().collect();

        if lines.len() < 2 {
            debug!("Positional parse: no data rows after header");
            return ParseResult {
                records: Vec::new(),
                stats,
            };
        }

        let units = PositionalUnits::from_header(&split_fields(lines[0]));
        debug!("Positional units: {:?}", units);

        let mut records = Vec::with_capacity(lines.len() - 1);
        for (offset, line) in lines[1..].iter().enumerate() {
            let line_number = offset + 2;
            stats.total_records += 1;

            let record = decode_positional_row(&split_fields(line), units, self.celsius_guard);
            let absent = absent_fields(&record);
            if !absent.is_empty() {
                debug!("Row {} has absent fields: {}", line_number, absent.join(", "));
                stats.flag(line_number, format!("absent {}", absent.join(", ")));
            }

            records.push(record);
            stats.records_parsed += 1;
        }

        info!(
            "Positional parse: {} records ({} with gaps)",
            stats.records_parsed, stats.records_flagged
        );

        ParseResult { records, stats }
    }

    /// Decode using a column map built from the header row
    ///
    /// Blank lines are ignored. A row with no usable field is logged and
    /// left out.
    pub fn parse_header_matched(&self, raw: &str) -> ParseResult {
        let mut stats = ParseStats::new();
        let mut records = Vec::new();

        for (line_number, decoded) in self.decode_mapped_lines(raw, &mut stats) {
            if decoded.has_any_field() {
                records.push(decoded);
                stats.records_parsed += 1;
            } else {
                debug!("Skipped row {}: no usable field", line_number);
                stats.skip(line_number, "no usable field");
            }
        }

        info!(
            "Header-matched parse: {} of {} rows kept",
            stats.records_parsed, stats.total_records
        );

        ParseResult { records, stats }
    }

    /// Decode drawable points for map rendering
    ///
    /// Only rows with valid coordinates and at least one temperature
    /// survive.
    pub fn parse_for_visualization(&self, raw: &str) -> VisualizationResult {
        let mut stats = ParseStats::new();
        let mut points = Vec::new();

        for (line_number, decoded) in self.decode_mapped_lines(raw, &mut stats) {
            match to_visualization_point(&decoded) {
                Ok(point) => {
                    points.push(point);
                    stats.records_parsed += 1;
                }
                Err(reason) => {
                    debug!("Skipped row {}: {}", line_number, reason);
                    stats.skip(line_number, reason);
                }
            }
        }

        if points.is_empty() && stats.total_records > 0 {
            warn!(
                "No drawable points in {} data rows",
                stats.total_records
            );
        } else {
            info!(
                "Visualization parse: {} points from {} rows",
                stats.records_parsed, stats.total_records
            );
        }

        VisualizationResult { points, stats }
    }

    /// Tokenize non-blank lines and decode them through the header's column map
    fn decode_mapped_lines(&self, raw: &str, stats: &mut ParseStats) -> Vec<(usize, CsvRecord)> {
        let lines: Vec<(usize, &str)> = clean_text(raw)
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, line))
            .collect();

        let Some(((_, header_line), data_lines)) = lines.split_first() else {
            debug!("Header-matched parse: empty input");
            return Vec::new();
        };

        let map = ColumnMap::from_headers(&split_fields(header_line));
        let missing = map.missing_fields();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(SemanticField::name).collect();
            debug!("No header matched for: {}", names.join(", "));
        }

        data_lines
            .iter()
            .map(|(line_number, line)| {
                stats.total_records += 1;
                (
                    *line_number,
                    decode_mapped_row(&split_fields(line), &map, self.celsius_guard),
                )
            })
            .collect()
    }
}

/// Trim surrounding whitespace and a leading byte-order mark
fn clean_text(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}
