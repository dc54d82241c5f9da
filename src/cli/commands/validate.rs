//! Validate command implementation
//!
//! Decodes each input file positionally, builds its completeness report and
//! prints the issue list with a short preview of parsed rows.

use super::shared::{CommandStats, create_progress_bar, load_configuration};
use crate::app::models::CsvRecord;
use crate::app::services::csv_analyzer::ValidationSummary;
use crate::app::services::sensor_csv_parser::{ParseStats, SensorCsvParser};
use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::input::expand_inputs;
use crate::{Error, Result};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Validation outcome for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    pub file: PathBuf,
    pub summary: ValidationSummary,
    pub parse_stats: ParseStats,
}

/// Validate command runner
pub async fn run_validate(args: ValidateArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    args.common.validate()?;

    let mut config = load_configuration(&args.common)?;
    if let Some(rows) = args.preview_rows {
        config = config.with_preview_rows(rows);
        config.validate()?;
    }

    let files =
        expand_inputs(&args.inputs).map_err(|e| Error::configuration(format!("{:#}", e)))?;
    info!("Validating {} files", files.len());

    let parser = SensorCsvParser::from_config(&config);
    let progress = (args.common.show_progress() && files.len() > 1)
        .then(|| create_progress_bar(files.len() as u64, "Validating"));

    let mut stats = CommandStats::default();
    let mut results = Vec::with_capacity(files.len());

    for path in &files {
        match validate_file(&parser, path, config.preview_rows).await {
            Ok(result) => {
                stats.files_processed += 1;
                stats.records_processed += result.summary.report.num_records;
                if result.summary.has_issues() {
                    stats.files_with_issues += 1;
                }
                results.push(result);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.errors_encountered += 1;
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    match args.output_format {
        OutputFormat::Human => {
            for result in &results {
                print_human(result);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    stats.processing_time = start_time.elapsed();
    info!(
        "Validated {} files ({} with issues, {} unreadable) in {:.2}s",
        stats.files_processed,
        stats.files_with_issues,
        stats.errors_encountered,
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}

/// Read, decode and analyze one file
pub async fn validate_file(
    parser: &SensorCsvParser,
    path: &Path,
    preview_rows: usize,
) -> Result<FileValidation> {
    let raw = SensorCsvParser::read_trace(path).await?;
    let parsed = parser.parse_positional(&raw);
    Ok(FileValidation {
        file: path.to_path_buf(),
        summary: ValidationSummary::build(&parsed.records, preview_rows),
        parse_stats: parsed.stats,
    })
}

fn print_human(result: &FileValidation) {
    let summary = &result.summary;
    let report = &summary.report;

    println!();
    println!("{}", result.file.display().to_string().bold());
    println!("   Records:  {}", report.num_records);
    println!("   Rows:     {}", rows_line(&result.parse_stats));
    println!("   Duration: {} minutes", report.total_minutes);
    if let (Some(start), Some(stop)) = (&summary.start_time, &summary.stop_time) {
        println!("   Span:     {} to {}", start, stop);
    }

    if summary.has_issues() {
        for issue in &summary.issues {
            let line = format!("   ✗ {}", issue);
            if issue.is_blocking() {
                println!("{}", line.red());
            } else {
                println!("{}", line.yellow());
            }
        }
    } else {
        println!("{}", "   ✓ Complete".green());
    }

    if !summary.preview.is_empty() {
        println!("   Preview:");
        for record in &summary.preview {
            println!("     {}", preview_line(record));
        }
    }
}

fn rows_line(stats: &ParseStats) -> String {
    format!(
        "{} of {} decoded ({:.0}%), {:.0}% without gaps",
        stats.records_parsed,
        stats.total_records,
        stats.success_rate(),
        stats.clean_rate()
    )
}

fn preview_line(record: &CsvRecord) -> String {
    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{} {} | {}s | {}, {} | internal {} | probe {}",
        record.date,
        record.time,
        cell(record.elapsed_seconds),
        cell(record.latitude),
        cell(record.longitude),
        cell(record.internal_temperature),
        cell(record.probe_temperature)
    )
}
