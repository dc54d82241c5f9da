//! Completeness analysis for decoded sensor traces
//!
//! Consumes positional-parser output and produces the report that decides
//! whether an upload is accepted as-is or shown back to the user with an
//! itemized list of issues.

use crate::app::models::{CsvAnalysisReport, CsvRecord};
use crate::constants::{FALSE_FLAG, TRUE_FLAG};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Build the completeness report for a set of decoded rows
///
/// Missing flags are any-match: one offending row taints the report. The
/// elapsed span only considers rows with a present counter and is zero when
/// there are none.
pub fn analyze(records: &[CsvRecord]) -> CsvAnalysisReport {
    let mut missing_lat_lng = false;
    let mut missing_internal_temp = false;
    let mut missing_probe_temp = false;
    let mut span: Option<(f64, f64)> = None;

    for record in records {
        missing_lat_lng |= !record.has_coordinates();
        missing_internal_temp |= record.internal_temperature.is_none();
        missing_probe_temp |= record.probe_temperature.is_none();

        if let Some(seconds) = record.elapsed_seconds {
            span = Some(match span {
                Some((min, max)) => (min.min(seconds), max.max(seconds)),
                None => (seconds, seconds),
            });
        }
    }

    let total_minutes = match span {
        Some((min, max)) => round_to(((max - min) / 60.0).max(0.0), 2),
        None => {
            debug!("No elapsed-seconds values; reporting zero minutes");
            0.0
        }
    };

    CsvAnalysisReport {
        num_records: records.len(),
        missing_lat_lng,
        missing_internal_temp,
        missing_probe_temp,
        total_minutes,
    }
}

/// Round half away from zero to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Validation Issues
// =============================================================================

/// One user-facing problem with an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    NoDataRows,
    MissingLatLng,
    MissingInternalTemp,
    MissingProbeTemp,
}

impl ValidationIssue {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationIssue::NoDataRows => "No valid data rows found",
            ValidationIssue::MissingLatLng => "Some rows are missing latitude/longitude",
            ValidationIssue::MissingInternalTemp => "Some rows are missing internal temperature",
            ValidationIssue::MissingProbeTemp => "Some rows are missing probe temperature",
        }
    }

    /// Whether the upload cannot be submitted even with acknowledgement
    pub fn is_blocking(&self) -> bool {
        matches!(self, ValidationIssue::NoDataRows)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Issues implied by a report, in display order
pub fn issues_for(report: &CsvAnalysisReport) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if report.num_records == 0 {
        issues.push(ValidationIssue::NoDataRows);
        return issues;
    }
    if report.missing_lat_lng {
        issues.push(ValidationIssue::MissingLatLng);
    }
    if report.missing_internal_temp {
        issues.push(ValidationIssue::MissingInternalTemp);
    }
    if report.missing_probe_temp {
        issues.push(ValidationIssue::MissingProbeTemp);
    }
    issues
}

/// Everything shown to the user before they fix the file or submit anyway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub report: CsvAnalysisReport,
    pub issues: Vec<ValidationIssue>,
    /// First few decoded rows
    pub preview: Vec<CsvRecord>,
    /// `date time` of the first and last timestamped rows
    pub start_time: Option<String>,
    pub stop_time: Option<String>,
}

impl ValidationSummary {
    /// Analyze rows and collect the issue list and preview
    pub fn build(records: &[CsvRecord], preview_rows: usize) -> Self {
        let report = analyze(records);
        let issues = issues_for(&report);
        let (start_time, stop_time) = time_bounds(records);

        Self {
            report,
            issues,
            preview: records.iter().take(preview_rows).cloned().collect(),
            start_time,
            stop_time,
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Whether any issue prevents submission outright
    pub fn is_blocked(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_blocking)
    }

    /// Issues joined for a single-line message
    pub fn issue_list(&self) -> String {
        self.issues
            .iter()
            .map(ValidationIssue::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Timestamps of the first and last rows that carry a date or time
pub fn time_bounds(records: &[CsvRecord]) -> (Option<String>, Option<String>) {
    let first = records.iter().find_map(CsvRecord::timestamp);
    let last = records.iter().rev().find_map(CsvRecord::timestamp);
    (first, last)
}

// =============================================================================
// Persisted Report Row
// =============================================================================

/// Report fields as written to the row store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvReportRow {
    pub num_records: usize,
    pub has_lat_lng: String,
    pub has_internal_temp: String,
    pub has_probe_temp: String,
    /// Minutes
    pub time_taken: f64,
    pub complete: String,
    pub start_time: Option<String>,
    pub stop_time: Option<String>,
}

impl CsvReportRow {
    pub fn from_summary(summary: &ValidationSummary) -> Self {
        let report = &summary.report;
        Self {
            num_records: report.num_records,
            has_lat_lng: flag(!report.missing_lat_lng),
            has_internal_temp: flag(!report.missing_internal_temp),
            has_probe_temp: flag(!report.missing_probe_temp),
            time_taken: report.total_minutes,
            complete: flag(report.is_complete()),
            start_time: summary.start_time.clone(),
            stop_time: summary.stop_time.clone(),
        }
    }
}

fn flag(value: bool) -> String {
    let encoded = if value { TRUE_FLAG } else { FALSE_FLAG };
    encoded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::sensor_csv_parser::parse_positional;

    fn record(seconds: Option<f64>) -> CsvRecord {
        CsvRecord {
            date: "1/1/24".to_string(),
            time: "10:00:00".to_string(),
            elapsed_seconds: seconds,
            latitude: Some(33.77),
            longitude: Some(-84.39),
            internal_temperature: Some(75.0),
            probe_temperature: Some(74.0),
        }
    }

    #[test]
    fn test_end_to_end_walking_trace() {
        let raw = "date,time,seconds,lat,lng,internal,probe
1/1/24,10:00:00,0,33.77,-84.39,75,74
1/1/24,10:00:30,30,,,76,75
1/1/24,10:01:00,60,33.78,-84.40,77,76";
        let report = analyze(&parse_positional(raw).records);

        assert_eq!(report.num_records, 3);
        assert!(report.missing_lat_lng);
        assert!(!report.missing_internal_temp);
        assert!(!report.missing_probe_temp);
        assert_eq!(report.total_minutes, 1.0);
    }

    #[test]
    fn test_num_records_counts_invalid_rows() {
        let raw = "date,time,seconds,lat,lng,internal,probe
x,x,x,x,x,x,x
,,,,,,
1/1/24,10:00:00,0,33.77,-84.39,75,74";
        let report = analyze(&parse_positional(raw).records);
        assert_eq!(report.num_records, 3);
        assert!(report.missing_lat_lng);
        assert!(report.missing_internal_temp);
        assert!(report.missing_probe_temp);
    }

    #[test]
    fn test_flags_clear_only_when_every_row_is_valid() {
        let records = vec![record(Some(0.0)), record(Some(10.0))];
        let report = analyze(&records);
        assert!(!report.missing_lat_lng);

        let mut tainted = records.clone();
        tainted[1].longitude = None;
        assert!(analyze(&tainted).missing_lat_lng);
        assert!(!analyze(&tainted).missing_probe_temp);
    }

    #[test]
    fn test_total_minutes_uses_min_and_max_not_ends() {
        let records = vec![
            record(Some(120.0)),
            record(Some(5.0)),
            record(None),
            record(Some(305.0)),
            record(Some(50.0)),
        ];
        // (305 - 5) / 60 = 5
        assert_eq!(analyze(&records).total_minutes, 5.0);
    }

    #[test]
    fn test_total_minutes_rounded_to_two_decimals() {
        let records = vec![record(Some(0.0)), record(Some(100.0))];
        // 100 / 60 = 1.6666...
        assert_eq!(analyze(&records).total_minutes, 1.67);
    }

    #[test]
    fn test_no_elapsed_seconds_yields_zero_minutes() {
        let records = vec![record(None), record(None)];
        let report = analyze(&records);
        assert_eq!(report.total_minutes, 0.0);
        assert!(report.total_minutes.is_finite());

        assert_eq!(analyze(&[]).total_minutes, 0.0);
    }

    #[test]
    fn test_single_timestamp_is_zero_span() {
        assert_eq!(analyze(&[record(Some(42.0))]).total_minutes, 0.0);
    }

    #[test]
    fn test_empty_input_report() {
        let report = analyze(&[]);
        assert_eq!(report.num_records, 0);
        assert!(!report.missing_lat_lng);
        assert_eq!(issues_for(&report), vec![ValidationIssue::NoDataRows]);
    }

    #[test]
    fn test_summary_lists_issues_and_preview() {
        let mut records: Vec<CsvRecord> = (0..8).map(|i| record(Some(i as f64 * 30.0))).collect();
        records[3].probe_temperature = None;
        records[7].latitude = None;

        let summary = ValidationSummary::build(&records, 5);
        assert_eq!(
            summary.issues,
            vec![
                ValidationIssue::MissingLatLng,
                ValidationIssue::MissingProbeTemp
            ]
        );
        assert!(summary.has_issues());
        assert!(!summary.is_blocked());
        assert_eq!(summary.preview.len(), 5);
        assert_eq!(summary.start_time.as_deref(), Some("1/1/24 10:00:00"));
        assert!(summary.issue_list().contains("latitude/longitude"));
    }

    #[test]
    fn test_time_bounds_skip_untimed_rows() {
        let mut records = vec![record(None), record(None), record(None)];
        records[0].date.clear();
        records[0].time.clear();
        records[1].time = "10:05:00".to_string();
        records[2].date.clear();
        records[2].time.clear();

        let (start, stop) = time_bounds(&records);
        assert_eq!(start.as_deref(), Some("1/1/24 10:05:00"));
        assert_eq!(stop.as_deref(), Some("1/1/24 10:05:00"));
    }

    #[test]
    fn test_report_row_encoding() {
        let records = vec![record(Some(0.0)), record(Some(90.0))];
        let row = CsvReportRow::from_summary(&ValidationSummary::build(&records, 5));

        assert_eq!(row.num_records, 2);
        assert_eq!(row.has_lat_lng, "TRUE");
        assert_eq!(row.has_internal_temp, "TRUE");
        assert_eq!(row.has_probe_temp, "TRUE");
        assert_eq!(row.time_taken, 1.5);
        assert_eq!(row.complete, "TRUE");

        let mut partial = records.clone();
        partial[0].internal_temperature = None;
        let row = CsvReportRow::from_summary(&ValidationSummary::build(&partial, 5));
        assert_eq!(row.has_internal_temp, "FALSE");
        assert_eq!(row.complete, "FALSE");
    }
}
