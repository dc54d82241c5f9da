//! Command-line argument definitions for heat-ingest
//!
//! This module defines the CLI interface using the clap derive API. Each
//! subcommand maps onto one stage of the ingestion flow.

use crate::app::models::MapPosition;
use crate::config::ScalePreset;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the heat trace ingestion tool
///
/// Validates, visualizes and submits CSV exports from handheld temperature
/// loggers, and records hot/cool spot annotations for submitted routes.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "heat-ingest",
    version,
    about = "Validate, visualize and submit urban-heat sensor traces",
    long_about = "Processes CSV exports from handheld temperature loggers carried on walks, \
                  bike rides and commutes. Reports missing coordinates and temperatures, \
                  produces map-ready point series colored by temperature, and stores \
                  validated submissions with their hot/cool spot annotations."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Check sensor CSV files for missing fields and report their duration
    Validate(ValidateArgs),
    /// Produce drawable points, temperature statistics and colored route segments
    Visualize(VisualizeArgs),
    /// Validate a trace and store it with contributor details
    Submit(SubmitArgs),
    /// Attach hot, cool and extra notes to a stored submission
    Annotate(AnnotateArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct CommonArgs {
    /// Path to configuration file (TOML format)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }
}

/// Arguments for the validate command
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// CSV files or glob patterns
    #[arg(value_name = "FILES", required = true)]
    pub inputs: Vec<String>,

    /// Number of parsed rows to preview (overrides configuration)
    #[arg(long = "preview", value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// Output format for results
    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the visualize command
#[derive(Debug, Clone, Parser)]
pub struct VisualizeArgs {
    /// CSV file to render
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Color scale (overrides configuration)
    #[arg(long = "scale", value_enum)]
    pub scale: Option<ScalePreset>,

    /// Output format for results
    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the submit command
#[derive(Debug, Clone, Parser)]
pub struct SubmitArgs {
    /// CSV file to submit
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Contributor name
    #[arg(long = "name")]
    pub name: String,

    /// Contributor email
    #[arg(long = "email")]
    pub email: String,

    /// Neighborhood or area the route covers
    #[arg(long = "area")]
    pub area_of_interest: String,

    /// How the route was traveled (walking, cycling, ...)
    #[arg(long = "transport")]
    pub mode_of_transport: String,

    /// Local store directory (overrides configuration)
    #[arg(long = "store", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Submit even when validation reports missing fields
    #[arg(long = "submit-anyway")]
    pub submit_anyway: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl SubmitArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if !self.input.is_file() {
            return Err(Error::configuration(format!(
                "Input file does not exist: {}",
                self.input.display()
            )));
        }
        for (flag, value) in [
            ("--name", &self.name),
            ("--email", &self.email),
            ("--area", &self.area_of_interest),
            ("--transport", &self.mode_of_transport),
        ] {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!("{} must not be empty", flag)));
            }
        }
        Ok(())
    }
}

/// Arguments for the annotate command
#[derive(Debug, Clone, Parser)]
pub struct AnnotateArgs {
    /// Row id returned by `submit`
    #[arg(long = "submission-id", value_name = "ID")]
    pub submission_id: i64,

    /// Where it felt hottest
    #[arg(long = "hot", value_name = "LAT,LNG,NOTE")]
    pub hot: MarkerArg,

    /// Where it felt coolest
    #[arg(long = "cool", value_name = "LAT,LNG,NOTE")]
    pub cool: MarkerArg,

    /// Additional notes (repeatable)
    #[arg(long = "extra", value_name = "LAT,LNG,NOTE")]
    pub extras: Vec<MarkerArg>,

    /// Free-text description of the route
    #[arg(long = "narrative", value_name = "TEXT")]
    pub narrative: Option<String>,

    /// Local store directory (overrides configuration)
    #[arg(long = "store", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Output format options for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// A marker given as `LAT,LNG,NOTE`; the note may itself contain commas
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerArg {
    pub position: MapPosition,
    pub note: String,
}

impl FromStr for MarkerArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ',');
        let (Some(lat), Some(lng), Some(note)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::configuration(format!(
                "Marker '{}' must be in format: lat,lng,note",
                s
            )));
        };

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| Error::configuration(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| Error::configuration(format!("Invalid longitude: {}", lng)))?;

        Ok(Self {
            position: MapPosition::new(lat, lng)?,
            note: note.trim().to_string(),
        })
    }
}

impl Commands {
    /// Options shared by every subcommand
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Validate(args) => &args.common,
            Commands::Visualize(args) => &args.common,
            Commands::Submit(args) => &args.common,
            Commands::Annotate(args) => &args.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_arg_parsing() {
        let marker = MarkerArg::from_str("33.77, -84.39, sunny, no shade").unwrap();
        assert_eq!(marker.position, MapPosition { lat: 33.77, lng: -84.39 });
        assert_eq!(marker.note, "sunny, no shade");

        assert!(MarkerArg::from_str("33.77,-84.39").is_err());
        assert!(MarkerArg::from_str("north,-84.39,x").is_err());
        assert!(MarkerArg::from_str("95,-84.39,x").is_err());
    }

    #[test]
    fn test_log_level() {
        let mut common = CommonArgs::default();
        assert_eq!(common.get_log_level(), "warn");

        common.verbose = 1;
        assert_eq!(common.get_log_level(), "info");

        common.verbose = 2;
        assert_eq!(common.get_log_level(), "debug");

        common.verbose = 3;
        assert_eq!(common.get_log_level(), "trace");

        common.quiet = true;
        assert_eq!(common.get_log_level(), "error");
        assert!(!common.show_progress());
    }

    #[test]
    fn test_parse_annotate_command() {
        let args = Args::try_parse_from([
            "heat-ingest",
            "annotate",
            "--submission-id",
            "7",
            "--hot",
            "33.77,-84.39,sunny",
            "--cool",
            "33.78,-84.40,shady",
            "--extra",
            "33.79,-84.41,fountain",
            "--extra",
            "33.80,-84.42,bus stop",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Annotate(annotate)) => {
                assert_eq!(annotate.submission_id, 7);
                assert_eq!(annotate.hot.note, "sunny");
                assert_eq!(annotate.extras.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_visualize_scale() {
        let args = Args::try_parse_from([
            "heat-ingest",
            "visualize",
            "walk.csv",
            "--scale",
            "coarse",
            "-vv",
        ])
        .unwrap();
        let command = args.command.unwrap();
        assert_eq!(command.common().verbose, 2);
        match command {
            Commands::Visualize(visualize) => {
                assert_eq!(visualize.scale, Some(ScalePreset::Coarse));
                assert_eq!(visualize.output_format, OutputFormat::Human);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_submit_args_validation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("walk.csv");
        std::fs::write(&file, "date,time\n").unwrap();

        let args = SubmitArgs {
            input: file,
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            area_of_interest: "Midtown".to_string(),
            mode_of_transport: "Walking".to_string(),
            store_dir: None,
            submit_anyway: false,
            common: CommonArgs::default(),
        };
        assert!(args.validate().is_ok());

        let mut blank = args.clone();
        blank.email = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut missing = args;
        missing.input = dir.path().join("nope.csv");
        assert!(missing.validate().is_err());
    }
}
