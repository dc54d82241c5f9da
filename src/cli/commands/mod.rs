//! Command implementations for the heat-ingest CLI
//!
//! Each subcommand lives in its own module; this module sets up logging and
//! dispatches.

pub mod annotate;
pub mod shared;
pub mod submit;
pub mod validate;
pub mod visualize;

pub use shared::CommandStats;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};

/// Main command runner
///
/// - `validate`: completeness reports for one or more files
/// - `visualize`: drawable points, statistics and colored segments
/// - `submit`: validated storage with contributor details
/// - `annotate`: hot/cool spot notes for a stored submission
pub async fn run(args: Args) -> Result<CommandStats> {
    let command = args
        .command
        .ok_or_else(|| Error::configuration("No command given"))?;
    shared::setup_logging(command.common())?;

    match command {
        Commands::Validate(validate_args) => validate::run_validate(validate_args).await,
        Commands::Visualize(visualize_args) => visualize::run_visualize(visualize_args).await,
        Commands::Submit(submit_args) => submit::run_submit(submit_args).await,
        Commands::Annotate(annotate_args) => annotate::run_annotate(annotate_args).await,
    }
}
