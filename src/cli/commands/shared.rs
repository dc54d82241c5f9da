//! Shared components for CLI commands
//!
//! Common statistics, logging setup, configuration loading and store
//! construction used across the command implementations.

use crate::app::adapters::store::LocalStore;
use crate::cli::args::CommonArgs;
use crate::config::IngestConfig;
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Command statistics for reporting
#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    /// Number of files read
    pub files_processed: usize,
    /// Number of decoded data rows across all files
    pub records_processed: usize,
    /// Number of files with at least one validation issue
    pub files_with_issues: usize,
    /// Number of files that could not be read
    pub errors_encountered: usize,
    /// Row id written by `submit`
    pub submission_id: Option<i64>,
    /// Total command time
    pub processing_time: std::time::Duration,
}

impl CommandStats {
    /// Whether every file was read and none had issues
    pub fn is_clean(&self) -> bool {
        self.errors_encountered == 0 && self.files_with_issues == 0
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(common: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = common.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("heat_ingest={}", log_level)));

    if common.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load the configuration file if one was given
pub fn load_configuration(common: &CommonArgs) -> Result<IngestConfig> {
    match &common.config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => debug!("No config file given, using defaults"),
    }
    let config = IngestConfig::load(common.config_file.as_deref())?;
    config.validate()?;
    Ok(config)
}

/// Open the local store, preferring an explicit directory over configuration
pub async fn open_store(
    config: &IngestConfig,
    store_dir: Option<PathBuf>,
) -> Result<Arc<LocalStore>> {
    let dir = match store_dir {
        Some(dir) => dir,
        None => config.resolve_store_dir()?,
    };
    Ok(Arc::new(LocalStore::open(dir).await?))
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
