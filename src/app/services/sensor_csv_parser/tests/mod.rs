//! Test utilities for sensor CSV parser testing
//!
//! Sample files shaped like the exports of the loggers we receive.

mod header_matched_tests;
mod positional_tests;
mod visualization_tests;

/// Fixed-layout walking trace with one row missing coordinates
pub fn create_positional_csv() -> String {
    "date,time,seconds,lat,lng,internal,probe
1/1/24,10:00:00,0,33.77,-84.39,75,74
1/1/24,10:00:30,30,,,76,75
1/1/24,10:01:00,60,33.78,-84.40,77,76"
        .to_string()
}

/// Vendor export with descriptive headers, quoted cells and Celsius probe
pub fn create_vendor_csv() -> String {
    r#""Date","Time","Latitude","Longitude","Internal Temperature (°F)","Thermistor Temperature (°C)"
"11/08/2021","19:32:51.484","33.7701","-84.3901","80.1","25.0"
"11/08/2021","19:32:52.484","33.7702","-84.3902","80.2","26.0"
"11/08/2021","19:32:53.484","","","80.3","27.0"
"11/08/2021","19:32:54.484","33.7704","-84.3904","",""
"#
    .to_string()
}

/// Export where the clock lives inside the date cell
pub fn create_combined_datetime_csv() -> String {
    "Date Time,GPS Lat,GPS Lon,Probe Temp
11/08/2021 19:32:51.484,33.77,-84.39,88.5
11/08/2021 19:32:52.101,33.78,-84.40,89.0"
        .to_string()
}
