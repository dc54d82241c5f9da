//! Annotate command implementation
//!
//! Drives the annotation flow non-interactively: each marker argument is a
//! map click followed by a confirmed note.

use super::shared::{CommandStats, load_configuration, open_store};
use crate::app::adapters::store::SubmissionStore;
use crate::app::services::annotation_wizard::{AnnotationWizard, Marker};
use crate::cli::args::{AnnotateArgs, MarkerArg};
use crate::{Error, Result};
use colored::*;
use std::time::Instant;
use tracing::{debug, info};

/// Annotate command runner
pub async fn run_annotate(args: AnnotateArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    args.common.validate()?;

    let config = load_configuration(&args.common)?;
    let store = open_store(&config, args.store_dir.clone()).await?;

    let wizard = annotate(&args, store.as_ref(), &config.csv_table).await?;

    println!(
        "{} Annotated submission {} with {} notes",
        "✓".green(),
        args.submission_id,
        2 + wizard.extras().len()
    );
    let markers = wizard
        .hot_marker()
        .into_iter()
        .chain(wizard.cool_marker())
        .chain(wizard.extras());
    for marker in markers {
        println!("   {}", marker_line(marker));
    }

    let stats = CommandStats {
        records_processed: 2 + wizard.extras().len(),
        submission_id: Some(args.submission_id),
        processing_time: start_time.elapsed(),
        ..Default::default()
    };
    info!(
        "Annotation completed in {:.2}s",
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}

/// Place every marker from the arguments and submit
pub async fn annotate(
    args: &AnnotateArgs,
    store: &dyn SubmissionStore,
    table: &str,
) -> Result<AnnotationWizard> {
    let mut wizard = AnnotationWizard::new(Some(args.submission_id));

    place(&mut wizard, &args.hot)?;
    place(&mut wizard, &args.cool)?;
    for extra in &args.extras {
        wizard.begin_extra()?;
        place(&mut wizard, extra)?;
    }
    if let Some(narrative) = &args.narrative {
        wizard.set_narrative(narrative.trim());
    }

    wizard.submit(store, table).await?;
    debug!("Wizard finished in step {}", wizard.step());
    Ok(wizard)
}

fn marker_line(marker: &Marker) -> String {
    format!(
        "{:<5} ({}) {:.5}, {:.5}: {}",
        marker.kind.name(),
        marker.kind.color(),
        marker.lat,
        marker.lng,
        marker.note
    )
}

fn place(wizard: &mut AnnotationWizard, marker: &MarkerArg) -> Result<()> {
    debug!("{}", wizard.step().prompt());
    if wizard.click(marker.position)?.is_none() {
        return Err(Error::wizard_rejected(format!(
            "Map click ignored while {}",
            wizard.step()
        )));
    }
    if let Err(e) = wizard.submit_note(&marker.note) {
        wizard.cancel_note();
        return Err(e);
    }
    Ok(())
}
