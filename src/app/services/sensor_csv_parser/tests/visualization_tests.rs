//! Tests for the strict, drawable-points decoding

use super::*;
use crate::app::services::sensor_csv_parser::parse_for_visualization;

#[test]
fn test_only_drawable_points_survive() {
    let result = parse_for_visualization(&create_vendor_csv());

    // row 3 lacks coordinates, row 4 lacks both temperatures
    assert_eq!(result.points.len(), 2);
    assert_eq!(result.stats.total_records, 4);
    assert_eq!(result.stats.records_skipped, 2);

    let point = &result.points[0];
    assert_eq!(point.lat, 33.7701);
    assert_eq!(point.lng, -84.3901);
    assert_eq!(point.probe_temp, 77.0);
    assert_eq!(point.internal_temp, 80.1);
    assert_eq!(point.time, "19:32:51");
}

#[test]
fn test_missing_temperature_borrows_the_other() {
    let raw = "lat,lng,probe temp,internal temp
33.7,-84.3,,70
33.8,-84.4,81,";
    let result = parse_for_visualization(raw);

    assert_eq!(result.points.len(), 2);
    assert_eq!(result.points[0].probe_temp, 70.0);
    assert_eq!(result.points[0].internal_temp, 70.0);
    assert_eq!(result.points[1].probe_temp, 81.0);
    assert_eq!(result.points[1].internal_temp, 81.0);
}

#[test]
fn test_out_of_range_coordinates_dropped() {
    let raw = "lat,lng,probe temp
91,-84.3,80
33.7,-181,80
33.7,-84.3,80";
    let result = parse_for_visualization(raw);

    assert_eq!(result.points.len(), 1);
    assert!(
        result.stats.errors[0].contains("coordinates"),
        "unexpected diagnostic: {:?}",
        result.stats.errors
    );
}

#[test]
fn test_missing_lat_column_yields_no_points() {
    let raw = "time,probe temp
10:00:00,80";
    let result = parse_for_visualization(raw);
    assert!(result.points.is_empty());
    assert_eq!(result.stats.records_skipped, 1);
}

#[test]
fn test_positional_file_without_descriptive_headers() {
    // "internal"/"probe" alone are not temperature candidates
    let result = parse_for_visualization(&create_positional_csv());
    assert!(result.points.is_empty());
}
