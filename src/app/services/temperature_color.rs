//! Temperature to color mapping for route rendering
//!
//! Two step-function scales exist: a coarse 4-bucket legacy scale and a
//! fine 12-bucket Fahrenheit scale. Which one applies is a caller choice,
//! never inferred from the data.

use crate::app::models::{MapPosition, TemperatureStats, VisualizationPoint};
use crate::app::services::csv_analyzer::round_to;
use crate::config::ScalePreset;
use crate::constants::{COARSE_BREAKPOINTS, COARSE_COLORS, FINE_BREAKPOINTS, FINE_COLORS};
use crate::{Error, Result};
use serde::Serialize;

/// Piecewise-constant mapping from temperature to a color token
///
/// A value below `breakpoints[i]` (and not below any earlier breakpoint)
/// gets `colors[i]`; anything at or above the last breakpoint gets the last
/// color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    breakpoints: Vec<f64>,
    colors: Vec<String>,
}

impl ColorScale {
    /// Build a custom scale
    ///
    /// Requires strictly ascending finite breakpoints and exactly one more
    /// color than breakpoints.
    pub fn new(breakpoints: Vec<f64>, colors: Vec<String>) -> Result<Self> {
        if colors.len() != breakpoints.len() + 1 {
            return Err(Error::color_scale(format!(
                "expected {} colors for {} breakpoints, got {}",
                breakpoints.len() + 1,
                breakpoints.len(),
                colors.len()
            )));
        }
        if breakpoints.iter().any(|b| !b.is_finite()) {
            return Err(Error::color_scale("breakpoints must be finite"));
        }
        if breakpoints.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::color_scale("breakpoints must be strictly ascending"));
        }
        Ok(Self {
            breakpoints,
            colors,
        })
    }

    /// Coarse 4-bucket named-color scale (breakpoints 28, 30, 32)
    pub fn coarse() -> Self {
        Self::from_constants(COARSE_BREAKPOINTS, COARSE_COLORS)
    }

    /// Fine 12-bucket hex scale (breakpoints 40 through 100 °F)
    pub fn fine() -> Self {
        Self::from_constants(FINE_BREAKPOINTS, FINE_COLORS)
    }

    /// Scale for a named preset
    pub fn preset(preset: ScalePreset) -> Self {
        match preset {
            ScalePreset::Coarse => Self::coarse(),
            ScalePreset::Fine => Self::fine(),
        }
    }

    fn from_constants(breakpoints: &[f64], colors: &[&str]) -> Self {
        Self {
            breakpoints: breakpoints.to_vec(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Color token for a temperature; values past either end are clamped
    pub fn color_for(&self, temperature: f64) -> &str {
        let bucket = self
            .breakpoints
            .iter()
            .position(|breakpoint| temperature < *breakpoint)
            .unwrap_or(self.breakpoints.len());
        &self.colors[bucket]
    }

    /// RGB components of the color for a temperature, when it is a hex token
    pub fn rgb_for(&self, temperature: f64) -> Option<Rgb> {
        Rgb::from_hex(self.color_for(temperature))
    }

    pub fn bucket_count(&self) -> usize {
        self.colors.len()
    }

    /// Legend entries as (lower bound, upper bound, color)
    pub fn legend(&self) -> Vec<(Option<f64>, Option<f64>, &str)> {
        self.colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let lower = i.checked_sub(1).map(|j| self.breakpoints[j]);
                let upper = self.breakpoints.get(i).copied();
                (lower, upper, color.as_str())
            })
            .collect()
    }
}

/// An 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Decode "#rrggbb"; named colors yield None
    pub fn from_hex(token: &str) -> Option<Self> {
        let hex = token.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

/// Probe temperature statistics over a point series
///
/// Non-positive readings are treated as placeholders and excluded. All
/// values are rounded to one decimal; no qualifying points gives all zeros.
pub fn stats_for(points: &[VisualizationPoint]) -> TemperatureStats {
    let temps: Vec<f64> = points
        .iter()
        .map(|point| point.probe_temp)
        .filter(|temp| *temp > 0.0)
        .collect();

    if temps.is_empty() {
        return TemperatureStats::default();
    }

    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = temps.iter().sum::<f64>() / temps.len() as f64;

    TemperatureStats {
        min: round_to(min, 1),
        max: round_to(max, 1),
        avg: round_to(avg, 1),
        count: temps.len(),
    }
}

/// Display form of a Fahrenheit reading, e.g. "72.5°F"
pub fn format_temperature(temperature: f64) -> String {
    format!("{}°F", round_to(temperature, 1))
}

/// A straight route piece between consecutive points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub from: MapPosition,
    pub to: MapPosition,
    pub color: String,
}

/// Route pieces colored by the probe temperature at their start point
pub fn route_segments(points: &[VisualizationPoint], scale: &ColorScale) -> Vec<RouteSegment> {
    points
        .windows(2)
        .map(|pair| RouteSegment {
            from: pair[0].position(),
            to: pair[1].position(),
            color: scale.color_for(pair[0].probe_temp).to_string(),
        })
        .collect()
}

/// Bounding box of a point series as (south-west, north-east)
pub fn bounds(points: &[VisualizationPoint]) -> Option<(MapPosition, MapPosition)> {
    let first = points.first()?;
    let mut south_west = first.position();
    let mut north_east = first.position();
    for point in &points[1..] {
        south_west.lat = south_west.lat.min(point.lat);
        south_west.lng = south_west.lng.min(point.lng);
        north_east.lat = north_east.lat.max(point.lat);
        north_east.lng = north_east.lng.max(point.lng);
    }
    Some((south_west, north_east))
}
