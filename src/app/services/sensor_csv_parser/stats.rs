//! Parsing statistics and result structures for sensor CSV decoding
//!
//! These travel alongside the decoded rows so callers can surface skipped
//! and flagged rows without the parser ever failing on a bad line.

use crate::app::models::{CsvRecord, VisualizationPoint};

/// Decoded rows with basic statistics
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Decoded rows, in file order
    pub records: Vec<CsvRecord>,

    /// Basic parsing statistics
    pub stats: ParseStats,
}

/// Drawable points with basic statistics
#[derive(Debug, Clone)]
pub struct VisualizationResult {
    /// Points that passed the strict filter, in file order
    pub points: Vec<VisualizationPoint>,

    /// Basic parsing statistics
    pub stats: ParseStats,
}

/// Simple parsing statistics
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseStats {
    /// Total number of data lines encountered
    pub total_records: usize,

    /// Number of rows returned to the caller
    pub records_parsed: usize,

    /// Number of rows left out of the result
    pub records_skipped: usize,

    /// Number of returned rows with at least one absent numeric field
    pub records_flagged: usize,

    /// Per-row diagnostics for debugging
    pub errors: Vec<String>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            total_records: 0,
            records_parsed: 0,
            records_skipped: 0,
            records_flagged: 0,
            errors: Vec::new(),
        }
    }

    /// Record a dropped row with its diagnostic
    pub fn skip(&mut self, line_number: usize, reason: impl Into<String>) {
        self.records_skipped += 1;
        self.errors
            .push(format!("Row {}: {}", line_number, reason.into()));
    }

    /// Record a kept row that has gaps
    pub fn flag(&mut self, line_number: usize, reason: impl Into<String>) {
        self.records_flagged += 1;
        self.errors
            .push(format!("Row {}: {}", line_number, reason.into()));
    }

    /// Calculate the share of lines returned as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.records_parsed as f64 / self.total_records as f64) * 100.0
        }
    }

    /// Calculate the share of returned rows without gaps as a percentage
    pub fn clean_rate(&self) -> f64 {
        if self.records_parsed == 0 {
            0.0
        } else {
            let clean = self.records_parsed.saturating_sub(self.records_flagged);
            (clean as f64 / self.records_parsed as f64) * 100.0
        }
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}
