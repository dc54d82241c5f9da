//! Tests for header-matched decoding

use super::*;
use crate::app::services::sensor_csv_parser::parse_header_matched;

#[test]
fn test_vendor_export_decoding() {
    let result = parse_header_matched(&create_vendor_csv());

    assert_eq!(result.records.len(), 4);

    let first = &result.records[0];
    assert_eq!(first.date, "11/08/2021");
    assert_eq!(first.time, "19:32:51");
    assert_eq!(first.latitude, Some(33.7701));
    assert_eq!(first.longitude, Some(-84.3901));
    assert_eq!(first.internal_temperature, Some(80.1));
    // 25 °C -> 77 °F
    assert_eq!(first.probe_temperature, Some(77.0));
    // no seconds-like header
    assert_eq!(first.elapsed_seconds, None);
}

#[test]
fn test_absent_column_is_absent_for_every_row() {
    let raw = "date,time,probe temp
1/1/24,10:00:00,74
1/1/24,10:00:30,75";
    let result = parse_header_matched(raw);

    assert_eq!(result.records.len(), 2);
    assert!(result.records.iter().all(|r| r.latitude.is_none()));
    assert!(result.records.iter().all(|r| r.longitude.is_none()));
    assert!(result.records.iter().all(|r| r.probe_temperature.is_some()));
}

#[test]
fn test_rows_without_usable_fields_are_dropped() {
    let raw = "date,lat,lng,probe temp
,,,
1/1/24,33.7,-84.3,80
,abc,def,ghi";
    let result = parse_header_matched(raw);

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.stats.total_records, 3);
    assert_eq!(result.stats.records_skipped, 2);
    assert!(result.stats.errors[0].starts_with("Row 2:"));
    assert!(result.stats.errors[1].starts_with("Row 4:"));
}

#[test]
fn test_blank_lines_are_ignored() {
    let raw = "\n\ndate,lat,lng,probe temp\n\n1/1/24,33.7,-84.3,80\n   \n1/1/24,33.8,-84.4,81\n";
    let result = parse_header_matched(raw);

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.stats.total_records, 2);
}

#[test]
fn test_combined_date_time_cell_is_split() {
    let result = parse_header_matched(&create_combined_datetime_csv());

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].date, "11/08/2021");
    assert_eq!(result.records[0].time, "19:32:51");
    assert_eq!(result.records[1].time, "19:32:52");
    assert_eq!(result.records[0].probe_temperature, Some(88.5));
}

#[test]
fn test_seconds_column_detected() {
    let raw = "Date,Time,Elapsed Seconds,Lat,Lng,Probe Temp
1/1/24,10:00:00,12.5,33.7,-84.3,80";
    let result = parse_header_matched(raw);
    assert_eq!(result.records[0].elapsed_seconds, Some(12.5));
}

#[test]
fn test_too_short_input() {
    assert!(parse_header_matched("").records.is_empty());
    assert!(parse_header_matched("date,lat,lng").records.is_empty());
}

#[test]
fn test_internal_celsius_header_converts() {
    let raw = "lat,lng,Internal Temperature celsius
33.7,-84.3,10";
    let result = parse_header_matched(raw);
    assert_eq!(result.records[0].internal_temperature, Some(50.0));
}
