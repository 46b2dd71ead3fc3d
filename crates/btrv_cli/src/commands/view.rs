//! View command implementation.

use crate::export::{ExportDocument, RecordExport};
use crate::OutputFormat;
use btrv_core::{BtrieveFile, LoadOptions};
use std::path::PathBuf;
use tracing::error;

/// Runs the view command.
pub fn run(
    files: &[PathBuf],
    options: &LoadOptions,
    format: OutputFormat,
    records: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    for path in files {
        let file = match BtrieveFile::open(path, options) {
            Ok(file) => file,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load file");
                continue;
            }
        };

        let doc = ExportDocument::build(&file, Some(records));
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
            OutputFormat::Text => print!("{}", render_text(&doc)),
        }
    }
    Ok(())
}

fn render_text(doc: &ExportDocument) -> String {
    let file = &doc.file;
    let mut out = String::new();
    let title = format!("Btrieve File {}", file.path.as_deref().unwrap_or("<memory>"));
    out.push_str(&title);
    out.push('\n');
    out.push_str(&"=".repeat(title.len()));
    out.push_str("\n\n");

    out.push_str(&format!("Version:          {}\n", file.version));
    out.push_str(&format!(
        "Pages:            {} x {} bytes\n",
        file.page_count, file.page_length
    ));
    out.push_str(&format!(
        "Record length:    {} (physical {})\n",
        file.record_length, file.physical_record_length
    ));
    out.push_str(&format!("Records:          {}\n", file.record_count));
    out.push_str(&format!(
        "Variable length:  {}{}\n",
        yes_no(file.variable_length),
        if file.variable_truncation { " (truncated)" } else { "" }
    ));
    out.push_str(&format!("Log key:          {}\n", yes_no(file.log_key_present)));
    if let Some(acs) = &file.acs {
        out.push_str(&format!("ACS:              {acs}\n"));
    }

    out.push_str("\nKeys:\n");
    for key in &doc.keys {
        out.push_str(&format!("  [{}] {} bytes\n", key.number, key.length));
        for segment in &key.segments {
            out.push_str(&format!(
                "      {} @{} len {} flags {:#06x}",
                segment.data_type, segment.offset, segment.length, segment.attributes
            ));
            if let Some(null) = segment.null_value {
                out.push_str(&format!(" null {null:#04x}"));
            }
            out.push('\n');
        }
    }

    if !doc.records.is_empty() {
        out.push_str("\nRecords:\n");
        for record in &doc.records {
            out.push_str(&render_record(record));
        }
    }

    if !file.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &file.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }
    out.push('\n');
    out
}

fn render_record(record: &RecordExport) -> String {
    let keys: Vec<String> = record
        .keys
        .iter()
        .map(|(number, value)| format!("{number}={value}"))
        .collect();
    format!(
        "  {:#010x} {} bytes  {}\n",
        record.offset,
        record.data.len() / 2,
        keys.join(" ")
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
