//! Submit command implementation
//!
//! Runs the full ingest pipeline against the local store: validate the
//! trace, refuse or require acknowledgement on issues, then store the CSV
//! and its report row.

use super::shared::{CommandStats, load_configuration, open_store};
use crate::app::services::submission::{CsvSubmissionForm, SubmissionPipeline};
use crate::cli::args::SubmitArgs;
use crate::{Error, Result};
use colored::*;
use std::time::Instant;
use tracing::info;

/// Submit command runner
pub async fn run_submit(args: SubmitArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    args.validate()?;

    let config = load_configuration(&args.common)?;
    let store = open_store(&config, args.store_dir.clone()).await?;
    let pipeline = SubmissionPipeline::new(store, config);

    let mut session = pipeline.validate_file(&args.input).await?;
    let summary = session.summary().clone();

    for issue in &summary.issues {
        eprintln!("{}", format!("✗ {}", issue).yellow());
    }

    let form = CsvSubmissionForm {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        area_of_interest: args.area_of_interest.trim().to_string(),
        mode_of_transport: args.mode_of_transport.trim().to_string(),
    };

    let id = match pipeline.submit(&mut session, form, args.submit_anyway).await {
        Ok(id) => id,
        Err(Error::ValidationNotAcknowledged { issues }) => {
            eprintln!(
                "{}",
                "Fix the file or re-run with --submit-anyway to store it as is.".yellow()
            );
            return Err(Error::validation_not_acknowledged(issues));
        }
        Err(e) => return Err(e),
    };

    println!(
        "{} {} stored as submission {}",
        "✓".green(),
        session.file_name().bold(),
        id
    );
    println!(
        "   {} records, {} minutes",
        summary.report.num_records, summary.report.total_minutes
    );
    println!(
        "   Annotate with: heat-ingest annotate --submission-id {} --hot LAT,LNG,NOTE --cool LAT,LNG,NOTE",
        id
    );

    let stats = CommandStats {
        files_processed: 1,
        records_processed: summary.report.num_records,
        files_with_issues: usize::from(summary.has_issues()),
        submission_id: Some(id),
        processing_time: start_time.elapsed(),
        ..Default::default()
    };
    info!(
        "Submission {} completed in {:.2}s",
        id,
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}
