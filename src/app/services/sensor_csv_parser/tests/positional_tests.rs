//! Tests for fixed-layout decoding used on the validation path

use super::*;
use crate::app::services::sensor_csv_parser::{SensorCsvParser, parse_positional};

#[test]
fn test_every_data_line_becomes_a_record() {
    let result = parse_positional(&create_positional_csv());

    assert_eq!(result.records.len(), 3);
    assert_eq!(result.stats.total_records, 3);
    assert_eq!(result.stats.records_parsed, 3);
    assert_eq!(result.stats.records_skipped, 0);

    let first = &result.records[0];
    assert_eq!(first.date, "1/1/24");
    assert_eq!(first.time, "10:00:00");
    assert_eq!(first.elapsed_seconds, Some(0.0));
    assert_eq!(first.latitude, Some(33.77));
    assert_eq!(first.longitude, Some(-84.39));
    assert_eq!(first.internal_temperature, Some(75.0));
    assert_eq!(first.probe_temperature, Some(74.0));
}

#[test]
fn test_gaps_are_flagged_not_dropped() {
    let result = parse_positional(&create_positional_csv());

    let second = &result.records[1];
    assert_eq!(second.latitude, None);
    assert_eq!(second.longitude, None);
    assert_eq!(second.internal_temperature, Some(76.0));

    assert_eq!(result.stats.records_flagged, 1);
    assert!(result.stats.errors[0].starts_with("Row 3:"));
    assert!(result.stats.errors[0].contains("latitude"));
}

#[test]
fn test_malformed_rows_are_kept() {
    let raw = "date,time,seconds,lat,lng,internal,probe
1/1/24,10:00:00,abc,north,west,hot,cold
garbage
1/1/24,10:00:30,30,95.0,-200,75,74";
    let result = parse_positional(raw);

    assert_eq!(result.records.len(), 3);

    let words = &result.records[0];
    assert_eq!(words.elapsed_seconds, None);
    assert_eq!(words.latitude, None);
    assert_eq!(words.probe_temperature, None);

    let short = &result.records[1];
    assert_eq!(short.date, "garbage");
    assert_eq!(short.time, "");
    assert_eq!(short.probe_temperature, None);

    let out_of_range = &result.records[2];
    assert_eq!(out_of_range.latitude, None);
    assert_eq!(out_of_range.longitude, None);
    assert_eq!(out_of_range.probe_temperature, Some(74.0));

    assert_eq!(result.stats.records_flagged, 3);
}

#[test]
fn test_interior_blank_line_is_counted() {
    let raw = "date,time,seconds,lat,lng,internal,probe
1/1/24,10:00:00,0,33.77,-84.39,75,74

1/1/24,10:01:00,60,33.78,-84.40,77,76
";
    let result = parse_positional(raw);
    assert_eq!(result.records.len(), 3);
    assert!(!result.records[1].has_any_field());
}

#[test]
fn test_header_only_or_empty_yields_no_records() {
    assert!(parse_positional("").records.is_empty());
    assert!(parse_positional("   \n  ").records.is_empty());
    assert!(
        parse_positional("date,time,seconds,lat,lng,internal,probe\n")
            .records
            .is_empty()
    );
}

#[test]
fn test_celsius_probe_header_converts_below_guard() {
    let raw = "date,time,seconds,lat,lng,internal,Probe (°C)
1/1/24,10:00:00,0,33.77,-84.39,75,20
1/1/24,10:00:30,30,33.77,-84.39,75,90";
    let result = parse_positional(raw);

    assert_eq!(result.records[0].probe_temperature, Some(68.0));
    assert_eq!(result.records[1].probe_temperature, Some(90.0));
    // internal header carries no unit marker
    assert_eq!(result.records[0].internal_temperature, Some(75.0));
}

#[test]
fn test_custom_celsius_guard() {
    let raw = "date,time,seconds,lat,lng,internal,probe celsius
1/1/24,10:00:00,0,33.77,-84.39,75,40";
    let result = SensorCsvParser::new()
        .with_celsius_guard(30.0)
        .parse_positional(raw);
    assert_eq!(result.records[0].probe_temperature, Some(40.0));
}

#[test]
fn test_quotes_subseconds_and_crlf() {
    let raw = "date,time,seconds,lat,lng,internal,probe\r\n\"1/1/24\",\"10:00:00.250\",\"0\",\"33.77\",\"-84.39\",\"75\",\"74\"\r\n";
    let result = parse_positional(raw);

    assert_eq!(result.records.len(), 1);
    let record = &result.records[0];
    assert_eq!(record.date, "1/1/24");
    assert_eq!(record.time, "10:00:00");
    assert_eq!(record.probe_temperature, Some(74.0));
}
