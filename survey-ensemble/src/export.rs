//! Tabular Exporter
//!
//! Flattens ensemble results into rows:
//!
//! ```text
//! ts_name,true_class,<class_1>,<class_2>,...
//! ```
//!
//! - `true_class` appears only when at least one series carries a label;
//!   unlabelled series leave it empty.
//! - Class columns are the sorted union of every class in every series'
//!   `combined` map, fixed before the header is emitted. A series lacking a
//!   class gets 0.0 in that column, so every row lines up with the header.
//! - Rows follow the iteration order of the results map.
//! - `ts_name` and `true_class` are reserved; a class with either name is
//!   rejected rather than written as a duplicate column.

use crate::error::{EnsembleError, Result};
use crate::types::{ClassLabel, EnsembleResults, Probability};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use survey_common::config::temp_path_for;
use tracing::{debug, info, warn};

/// Series name column
pub const SERIES_COLUMN: &str = "ts_name";

/// Ground-truth label column
pub const TRUE_CLASS_COLUMN: &str = "true_class";

/// Export outcome: rows in memory, or the path they were written to
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutput {
    Rows(Vec<Vec<String>>),
    Written(PathBuf),
}

/// Sorted union of class labels across all series
pub fn class_labels(results: &EnsembleResults) -> Vec<ClassLabel> {
    results
        .values()
        .flat_map(|result| result.combined.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Format a probability for export
///
/// Uses the shortest representation that parses back to the same value,
/// always with a decimal point (`0.0`, `0.6`, `0.6666666666666666`).
pub fn format_probability(prob: Probability) -> String {
    format!("{:?}", prob)
}

/// Build the table, header row first
///
/// # Errors
/// `ReservedColumnLabel` if a class label would duplicate the series or
/// true-class column name.
pub fn to_table(results: &EnsembleResults) -> Result<Vec<Vec<String>>> {
    let labels = class_labels(results);
    let has_true_class = results.values().any(|result| result.label.is_some());

    if let Some(label) = labels
        .iter()
        .find(|label| label.as_str() == SERIES_COLUMN || label.as_str() == TRUE_CLASS_COLUMN)
    {
        return Err(EnsembleError::ReservedColumnLabel {
            label: label.clone(),
        });
    }

    let mut header = Vec::with_capacity(labels.len() + 2);
    header.push(SERIES_COLUMN.to_string());
    if has_true_class {
        header.push(TRUE_CLASS_COLUMN.to_string());
    }
    header.extend(labels.iter().cloned());

    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(header);

    for (series, result) in results {
        let mut row = Vec::with_capacity(rows[0].len());
        row.push(series.clone());
        if has_true_class {
            row.push(result.label.clone().unwrap_or_default());
        }
        for label in &labels {
            let prob = result.combined.get(label).copied().unwrap_or(0.0);
            row.push(format_probability(prob));
        }
        rows.push(row);
    }

    debug!(
        rows = results.len(),
        class_columns = labels.len(),
        true_class = has_true_class,
        "Built export table"
    );

    Ok(rows)
}

/// Write the table as CSV to any writer
pub fn write_table<W: Write>(results: &EnsembleResults, writer: W) -> Result<()> {
    let mut csv_writer = write_rows(&to_table(results)?, writer)?;
    csv_writer.flush()?;
    Ok(())
}

fn write_rows<W: Write>(rows: &[Vec<String>], writer: W) -> Result<csv::Writer<W>> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    for row in rows {
        csv_writer.write_record(row)?;
    }
    Ok(csv_writer)
}

/// Write the table as CSV to `path`
///
/// Rows go to a sibling `.tmp` file which is renamed over `path` once fully
/// written and synced. On failure the temp file is removed and `path` is left
/// untouched. Returns `path` on success.
pub fn write_csv(results: &EnsembleResults, path: impl AsRef<Path>) -> Result<PathBuf> {
    let target = path.as_ref();
    let rows = to_table(results)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(target);

    if let Err(e) = write_file(&rows, &temp_path).and_then(|()| {
        std::fs::rename(&temp_path, target)?;
        Ok(())
    }) {
        warn!(
            path = %target.display(),
            error = %e,
            "CSV export failed, removing partial output"
        );
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    info!(
        path = %target.display(),
        rows = rows.len() - 1,
        "Exported ensemble results"
    );

    Ok(target.to_path_buf())
}

fn write_file(rows: &[Vec<String>], path: &Path) -> Result<()> {
    let csv_writer = write_rows(rows, File::create(path)?)?;
    let file = csv_writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Return rows in memory, or write them to `outpath` and return the path
pub fn export(results: &EnsembleResults, outpath: Option<&Path>) -> Result<ExportOutput> {
    match outpath {
        Some(path) => write_csv(results, path).map(ExportOutput::Written),
        None => to_table(results).map(ExportOutput::Rows),
    }
}
