//! Heat Ingest Library
//!
//! A Rust library for ingesting crowdsourced urban-heat sensor traces
//! (CSV exports from handheld temperature loggers) and turning them into
//! validation reports and map-ready point series.
//!
//! This library provides tools for:
//! - Decoding sensor CSV files by fixed position or by fuzzy header matching
//! - Normalizing Celsius-labelled temperature columns to Fahrenheit
//! - Building completeness reports (row count, missing fields, elapsed time)
//! - Mapping temperatures onto configurable color scales
//! - Driving the hot/cool spot annotation flow over a submitted route
//! - Persisting reports through a pluggable storage collaborator

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod annotation_wizard;
        pub mod comfort;
        pub mod csv_analyzer;
        pub mod sensor_csv_parser;
        pub mod submission;
        pub mod temperature_color;
    }
    pub mod adapters {
        pub mod store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod input;
}

// Re-export commonly used types
pub use app::models::{CsvAnalysisReport, CsvRecord, VisualizationPoint};
pub use config::IngestConfig;

/// Result type alias for the ingestion core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ingestion, analysis and submission operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// User-supplied data is out of range or malformed
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A custom color scale is malformed
    #[error("Invalid color scale: {message}")]
    ColorScale { message: String },

    /// Comfort level label outside the fixed set
    #[error("Unknown comfort level: '{label}'")]
    UnknownComfortLevel { label: String },

    /// The uploaded file has no data rows after the header
    #[error("No valid data rows found in '{file}'")]
    NoDataRows { file: String },

    /// Validation issues were found and the caller did not choose to submit anyway
    #[error("Validation issues must be acknowledged before submitting: {issues}")]
    ValidationNotAcknowledged { issues: String },

    /// The annotation flow rejected an action locally
    #[error("{message}")]
    WizardRejected { message: String },

    /// The external storage collaborator failed
    #[error("Storage error during {operation}: {message}")]
    Store { operation: String, message: String },

    /// JSON/TOML (de)serialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a color scale error
    pub fn color_scale(message: impl Into<String>) -> Self {
        Self::ColorScale {
            message: message.into(),
        }
    }

    /// Create an unknown comfort level error
    pub fn unknown_comfort_level(label: impl Into<String>) -> Self {
        Self::UnknownComfortLevel {
            label: label.into(),
        }
    }

    /// Create a no-data-rows error
    pub fn no_data_rows(file: impl Into<String>) -> Self {
        Self::NoDataRows { file: file.into() }
    }

    /// Create a validation-not-acknowledged error
    pub fn validation_not_acknowledged(issues: impl Into<String>) -> Self {
        Self::ValidationNotAcknowledged {
            issues: issues.into(),
        }
    }

    /// Create a wizard rejection carrying a user-facing message
    pub fn wizard_rejected(message: impl Into<String>) -> Self {
        Self::WizardRejected {
            message: message.into(),
        }
    }

    /// Create a storage collaborator error
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Failed to parse TOML configuration: {}", error),
        }
    }
}
