//! Sensor CSV parser for handheld temperature logger exports
//!
//! This module turns raw CSV text into typed rows. It tolerates
//! heterogeneous column naming, optional fields, Celsius-labelled
//! temperature columns and malformed individual rows: no single bad line
//! ever fails a parse.
//!
//! ## Architecture
//!
//! The parser is organized into logical components:
//! - [`parser`] - Decoding strategies and their inclusion policies
//! - [`column_mapping`] - Fuzzy header matching onto semantic fields
//! - [`record_parser`] - Per-row decoding for each strategy
//! - [`field_parsers`] - Tokenizing, numeric coercion and unit normalization
//! - [`stats`] - Parsing statistics and result structures
//!
//! ## Usage
//!
//! ```rust
//! use heat_ingest::app::services::sensor_csv_parser::parse_positional;
//!
//! let raw = "date,time,seconds,lat,lng,internal,probe\n\
//!            1/1/24,10:00:00,0,33.77,-84.39,75,74";
//! let result = parse_positional(raw);
//! assert_eq!(result.records.len(), 1);
//! ```

pub mod column_mapping;
pub mod field_parsers;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::{ColumnMap, SemanticField};
pub use field_parsers::TemperatureUnit;
pub use parser::SensorCsvParser;
pub use stats::{ParseResult, ParseStats, VisualizationResult};

/// Decode by fixed position with default settings (validation path)
pub fn parse_positional(raw: &str) -> ParseResult {
    SensorCsvParser::new().parse_positional(raw)
}

/// Decode by header matching with default settings
pub fn parse_header_matched(raw: &str) -> ParseResult {
    SensorCsvParser::new().parse_header_matched(raw)
}

/// Decode drawable points with default settings (map rendering path)
pub fn parse_for_visualization(raw: &str) -> VisualizationResult {
    SensorCsvParser::new().parse_for_visualization(raw)
}
