//! Visualize command implementation
//!
//! Decodes a trace with header matching, keeps drawable points only, and
//! reports temperature statistics plus route segments colored on the
//! selected scale.

use super::shared::{CommandStats, load_configuration};
use crate::app::models::{MapConfig, MapPosition, TemperatureStats, VisualizationPoint};
use crate::app::services::sensor_csv_parser::{ParseStats, SensorCsvParser};
use crate::app::services::temperature_color::{
    ColorScale, RouteSegment, bounds, format_temperature, route_segments, stats_for,
};
use crate::cli::args::{OutputFormat, VisualizeArgs};
use crate::config::ScalePreset;
use crate::Result;
use colored::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Everything needed to draw one trace
#[derive(Debug, Clone, Serialize)]
pub struct TraceRendering {
    pub scale: ScalePreset,
    pub points: Vec<VisualizationPoint>,
    pub stats: TemperatureStats,
    pub segments: Vec<RouteSegment>,
    /// (south-west, north-east); None for an empty trace
    pub bounds: Option<(MapPosition, MapPosition)>,
    /// Initial viewport when there is nothing to fit
    pub map: MapConfig,
    pub parse_stats: ParseStats,
}

impl TraceRendering {
    /// Decode and color a trace
    pub fn build(parser: &SensorCsvParser, raw: &str, scale: ScalePreset) -> Self {
        let result = parser.parse_for_visualization(raw);
        let color_scale = ColorScale::preset(scale);

        Self {
            scale,
            stats: stats_for(&result.points),
            segments: route_segments(&result.points, &color_scale),
            bounds: bounds(&result.points),
            map: MapConfig::default(),
            points: result.points,
            parse_stats: result.stats,
        }
    }
}

/// Visualize command runner
pub async fn run_visualize(args: VisualizeArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    args.common.validate()?;

    let mut config = load_configuration(&args.common)?;
    if let Some(scale) = args.scale {
        config = config.with_color_scale(scale);
    }

    let raw = SensorCsvParser::read_trace(&args.input).await?;
    let parser = SensorCsvParser::from_config(&config);
    let rendering = TraceRendering::build(&parser, &raw, config.color_scale);

    if rendering.points.is_empty() {
        warn!("{} has no drawable points", args.input.display());
    }

    match args.output_format {
        OutputFormat::Human => print_human(&args, &rendering),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendering)?),
    }

    let stats = CommandStats {
        files_processed: 1,
        records_processed: rendering.points.len(),
        processing_time: start_time.elapsed(),
        ..Default::default()
    };
    info!(
        "Rendered {} points from {} in {:.2}s",
        stats.records_processed,
        args.input.display(),
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}

fn print_human(args: &VisualizeArgs, rendering: &TraceRendering) {
    let color_scale = ColorScale::preset(rendering.scale);

    println!();
    println!("{}", args.input.display().to_string().bold());
    println!(
        "   Points:   {} drawable ({} rows dropped, {:.0}% kept)",
        rendering.points.len(),
        rendering.parse_stats.records_skipped,
        rendering.parse_stats.success_rate()
    );

    if rendering.stats.count > 0 {
        println!(
            "   Probe:    min {}  max {}  avg {}",
            format_temperature(rendering.stats.min).blue(),
            format_temperature(rendering.stats.max).red(),
            format_temperature(rendering.stats.avg)
        );
    }

    match rendering.bounds {
        Some((south_west, north_east)) => println!(
            "   Bounds:   ({:.5}, {:.5}) to ({:.5}, {:.5})",
            south_west.lat, south_west.lng, north_east.lat, north_east.lng
        ),
        None => println!(
            "   Center:   ({}, {}) zoom {}",
            rendering.map.center.lat, rendering.map.center.lng, rendering.map.zoom
        ),
    }

    println!("   Segments: {}", rendering.segments.len());
    for (lower, upper, color) in color_scale.legend() {
        let count = rendering
            .segments
            .iter()
            .filter(|segment| segment.color == color)
            .count();
        if count == 0 {
            continue;
        }
        let range = match (lower, upper) {
            (None, Some(upper)) => format!("below {}", upper),
            (Some(lower), Some(upper)) => format!("{} to {}", lower, upper),
            (Some(lower), None) => format!("{} and above", lower),
            (None, None) => "all".to_string(),
        };
        println!("     {:>8} {:<14} {}", color, range, count);
    }
}
