//! Application constants for the heat ingestion core
//!
//! This module contains the column-name candidates, unit thresholds,
//! color palettes and persistence names used throughout the crate.

// =============================================================================
// Column Detection
// =============================================================================

/// Header candidates for each semantic field, in priority order.
///
/// Matching is a case-insensitive substring test: for each candidate in
/// turn, the first header containing it wins.
pub mod column_candidates {
    pub const DATE: &[&str] = &["date"];
    pub const TIME: &[&str] = &["time"];
    pub const SECONDS: &[&str] = &["seconds", "elapsed"];
    pub const LATITUDE: &[&str] = &["lat", "latitude"];
    pub const LONGITUDE: &[&str] = &["lng", "longitude", "lon"];
    pub const INTERNAL_TEMPERATURE: &[&str] = &["internal temperature", "internal temp"];
    pub const PROBE_TEMPERATURE: &[&str] = &[
        "thermistor temperature",
        "probe temperature",
        "temperature probe",
        "probe temp",
    ];
}

/// Fixed column order assumed by the positional parser
pub mod positional_layout {
    pub const DATE: usize = 0;
    pub const TIME: usize = 1;
    pub const SECONDS: usize = 2;
    pub const LATITUDE: usize = 3;
    pub const LONGITUDE: usize = 4;
    pub const INTERNAL_TEMPERATURE: usize = 5;
    pub const PROBE_TEMPERATURE: usize = 6;
}

// =============================================================================
// Value Ranges and Units
// =============================================================================

/// Valid latitude range in degrees
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range in degrees
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Raw readings at or above this value are assumed to already be Fahrenheit
/// even when the header says Celsius
pub const DEFAULT_CELSIUS_GUARD: f64 = 50.0;

// =============================================================================
// Color Scales
// =============================================================================

/// Coarse 4-bucket scale breakpoints (low-resolution legacy mode)
pub const COARSE_BREAKPOINTS: &[f64] = &[28.0, 30.0, 32.0];

/// Coarse scale colors, one more than breakpoints
pub const COARSE_COLORS: &[&str] = &["blue", "lime", "orange", "red"];

/// Fine 12-bucket scale breakpoints in Fahrenheit
pub const FINE_BREAKPOINTS: &[f64] = &[
    40.0, 50.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 100.0,
];

/// Fine scale colors from deep blue (very cold) to red (extreme heat)
pub const FINE_COLORS: &[&str] = &[
    "#0066cc", // deep blue
    "#0099ff", // blue
    "#00ccff", // light blue
    "#33ffcc", // cyan
    "#66ff99", // light green
    "#99ff66", // green
    "#ccff33", // yellow-green
    "#ffff00", // yellow
    "#ffcc00", // orange-yellow
    "#ff9900", // orange
    "#ff6600", // red-orange
    "#ff0000", // red
];

// =============================================================================
// Map Defaults
// =============================================================================

/// Default map center (Atlanta)
pub const DEFAULT_MAP_CENTER: (f64, f64) = (33.7490, -84.3880);
pub const DEFAULT_MAP_ZOOM: u8 = 11;
pub const DEFAULT_MAP_MIN_ZOOM: u8 = 3;
pub const DEFAULT_MAP_MAX_ZOOM: u8 = 18;

/// Marker icon pixel size on narrow (mobile) and wide viewports
pub const MARKER_SIZE_MOBILE: u32 = 24;
pub const MARKER_SIZE_DESKTOP: u32 = 20;

// =============================================================================
// Persistence
// =============================================================================

/// Storage bucket receiving raw CSV uploads
pub const DEFAULT_CSV_BUCKET: &str = "submitted-csvs";

/// Row-store table for CSV submissions
pub const DEFAULT_CSV_TABLE: &str = "csv_submissions";

/// Row-store table for photo submissions
pub const IMAGE_TABLE: &str = "image_submissions";

/// Storage bucket receiving photo uploads
pub const IMAGE_BUCKET: &str = "submitted-images";

/// Lifetime of signed photo URLs
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Photos shown for a single tag
pub const MAX_TAG_STORIES: usize = 6;

/// Default number of parsed rows shown in a validation preview
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Boolean encoding used by the row store
pub const TRUE_FLAG: &str = "TRUE";
pub const FALSE_FLAG: &str = "FALSE";
