//! Checkpoint Store: durable snapshots of per-task results and the
//! reconciliation that lets a restarted run resume them.
//!
//! The checkpoint is a CSV next to the input file (`<stem>_fulltext.csv`)
//! holding every original input column plus `Full_Text`. Rows are written in
//! canonical dataset order, so a snapshot is only meaningful positionally:
//! row identity is the row's position, not its URL (URLs are not guaranteed
//! unique in the inputs).
//!
//! # Resumption Rules
//!
//! - Snapshot and dataset the same length: overlay every `Full_Text` value,
//!   trusting the checkpoint over the input for that field only.
//! - Lengths differ: overlay the first `min(len)` positions, warn, continue.
//!   This assumes the shared prefix kept its order; the intent behind any
//!   deeper merge is unspecified, so the prefix heuristic is kept as is.
//! - Snapshot unreadable: warn and treat the run as a cold start.

use crate::classify::{TaskStatus, classify};
use crate::dataset::{Dataset, FULLTEXT_COLUMN};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Suffix appended to the input file stem to derive the checkpoint path.
const OUTPUT_SUFFIX: &str = "_fulltext";

/// Derive the checkpoint/output path for an input file.
///
/// `news_links.csv` becomes `news_links_fulltext.csv` in the same directory.
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = format!("{stem}{OUTPUT_SUFFIX}.csv");
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Load a prior snapshot if one exists at `path`.
///
/// Returns the per-row `Full_Text` values (empty cells as `None`). A missing
/// file is a normal cold start; an unreadable or malformed file is degraded
/// to a cold start with a warning rather than failing the run.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_if_present(path: &Path) -> Option<Vec<Option<String>>> {
    if !path.exists() {
        info!("no prior checkpoint; starting fresh");
        return None;
    }
    match read_snapshot(path) {
        Ok(snapshot) => {
            info!(rows = snapshot.len(), "found prior checkpoint");
            Some(snapshot)
        }
        Err(e) => {
            warn!(error = %e, "could not read prior checkpoint; starting fresh");
            None
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Vec<Option<String>>, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let fulltext_col = reader
        .headers()?
        .iter()
        .position(|h| h == FULLTEXT_COLUMN)
        .ok_or_else(|| format!("checkpoint has no `{FULLTEXT_COLUMN}` column"))?;

    let mut snapshot = Vec::new();
    for row in reader.records() {
        let record = row?;
        let value = record
            .get(fulltext_col)
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty());
        snapshot.push(value);
    }
    Ok(snapshot)
}

/// Overlay a prior snapshot onto a freshly loaded dataset, positionally.
///
/// Only the `text` field is touched; URL, title, and every other input
/// column keep the freshly loaded values. When the lengths differ only the
/// shared prefix is overlaid and a warning is logged — the run continues.
#[instrument(level = "info", skip_all)]
pub fn reconcile(dataset: &mut Dataset, snapshot: Vec<Option<String>>) {
    if snapshot.len() != dataset.tasks.len() {
        warn!(
            checkpoint_rows = snapshot.len(),
            input_rows = dataset.tasks.len(),
            "checkpoint and input row counts differ; overlaying the matching prefix only"
        );
    }
    let overlap = snapshot.len().min(dataset.tasks.len());
    for (task, value) in dataset.tasks[..overlap].iter_mut().zip(snapshot) {
        task.text = value;
    }

    let restored = dataset
        .tasks
        .iter()
        .filter(|t| classify(t.text.as_deref()) == TaskStatus::Done)
        .count();
    info!(restored, overlaid = overlap, "restored progress from checkpoint");
}

/// Write the full current snapshot to `path`.
///
/// A complete rewrite every time: repeating the call after a failure is safe
/// and a fresh run against the resulting file reproduces the same state. The
/// internal sort key is not a column and is therefore never written. Rows go
/// out in canonical order, which is what makes positional reconciliation
/// valid on the next run.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn persist(dataset: &Dataset, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers = dataset.headers.clone();
    if dataset.fulltext_col.is_none() {
        headers.push(FULLTEXT_COLUMN.to_string());
    }
    writer.write_record(&headers)?;

    for task in &dataset.tasks {
        let mut cells = task.record.clone();
        let text = task.text.clone().unwrap_or_default();
        match dataset.fulltext_col {
            Some(col) => cells[col] = text,
            None => cells.push(text),
        }
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    info!(rows = dataset.tasks.len(), "checkpoint written");
    Ok(())
}
