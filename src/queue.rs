//! Task Queue Builder: derives the pending work list from a dataset.

use crate::classify::{TaskStatus, classify};
use crate::dataset::Dataset;

/// Collect the indices of every task still classified pending, in dataset
/// order. Deterministic: two calls against the same dataset produce the same
/// queue. An empty queue means the run has nothing to do and no browser
/// session should be opened.
pub fn build_queue(dataset: &Dataset) -> Vec<usize> {
    dataset
        .tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| classify(task.text.as_deref()) == TaskStatus::Pending)
        .map(|(i, _)| i)
        .collect()
}
