//! Convert command implementation.

use crate::export::ExportDocument;
use btrv_core::{BtrieveFile, LoadOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Converts each file, returning how many succeeded.
///
/// A file that fails is logged and skipped.
pub fn run(files: &[PathBuf], options: &LoadOptions) -> usize {
    let mut converted = 0;
    for path in files {
        match convert_file(path, options) {
            Ok(output) => {
                info!(path = %path.display(), output = %output.display(), "converted");
                converted += 1;
            }
            Err(e) => error!(path = %path.display(), error = %e, "conversion failed"),
        }
    }
    converted
}

/// Writes the export document for `path` next to it, replacing any
/// existing output.
pub fn convert_file(path: &Path, options: &LoadOptions) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file = BtrieveFile::open(path, options)?;
    for warning in file.warnings() {
        tracing::warn!(path = %path.display(), %warning, "load warning");
    }

    let doc = ExportDocument::build(&file, None);
    let output = path.with_extension("json");
    fs::write(&output, serde_json::to_vec_pretty(&doc)?)?;
    Ok(output)
}
