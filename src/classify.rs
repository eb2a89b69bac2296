//! Task status classification.
//!
//! A task's status is never stored — it is always derived from the current
//! `Full_Text` value by [`classify`]. The same function decides which rows a
//! restored checkpoint already covers and which rows go back into the work
//! queue, so resumption and queue building can never disagree.
//!
//! # Status Rules
//!
//! | text value | status |
//! |---|---|
//! | absent / empty / whitespace | `Pending` |
//! | contains the anti-automation marker | `Pending` (must retry) |
//! | contains the fetch-failure marker | `Pending` (must retry) |
//! | anything else | `Done` |

/// Substring served by the target site when it suspects automation.
///
/// A page containing this string carries no article content and the task
/// must be retried, both within a run (cooldown + retry) and across runs
/// (a checkpointed value containing it classifies as [`TaskStatus::Pending`]).
pub const ROBOT_MARKER: &str = "Our internal systems think you might be a Robot";

/// Value written into `Full_Text` when every attempt for a task was exhausted
/// without obtaining content.
pub const FAILURE_SENTINEL: &str = "FETCH FAILED: no article content after retries";

/// Marker substring that identifies a failure sentinel (or any value derived
/// from one) as retry-worthy.
pub const FAILURE_MARKER: &str = "FETCH FAILED";

/// Derived status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// No usable content yet; the task belongs in the work queue.
    Pending,
    /// Content was extracted; the task is never fetched again.
    Done,
}

/// Classify a task's current text value.
///
/// Pure and total: every possible input maps to exactly one status. This is
/// the sole authority on retry-worthiness — checkpoint reconciliation and
/// queue building both go through it.
pub fn classify(text: Option<&str>) -> TaskStatus {
    match text {
        None => TaskStatus::Pending,
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty()
                || trimmed.contains(ROBOT_MARKER)
                || trimmed.contains(FAILURE_MARKER)
            {
                TaskStatus::Pending
            } else {
                TaskStatus::Done
            }
        }
    }
}
