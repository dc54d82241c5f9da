//! Input discovery for CLI commands
//!
//! Expands the file arguments given on the command line (plain paths or
//! glob patterns) into a sorted, de-duplicated list of CSV files.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Expand paths and glob patterns into existing files
///
/// A plain path must exist. A pattern must match at least one file.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if is_pattern(input) {
            let mut matched = 0;
            for entry in glob::glob(input).with_context(|| format!("Invalid pattern '{}'", input))?
            {
                let path = entry.with_context(|| format!("Failed to read match for '{}'", input))?;
                if path.is_file() {
                    files.insert(path);
                    matched += 1;
                }
            }
            if matched == 0 {
                anyhow::bail!("No files match '{}'", input);
            }
            debug!("Pattern '{}' matched {} files", input, matched);
        } else {
            let path = PathBuf::from(input);
            if !path.is_file() {
                anyhow::bail!("Input file does not exist: {}", path.display());
            }
            files.insert(path);
        }
    }

    Ok(files.into_iter().collect())
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
