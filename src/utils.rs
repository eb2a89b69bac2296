//! Small helpers shared across the pipeline: log-safe truncation and the
//! jittered delays used for request pacing.

use rand::{Rng, rng};
use std::time::Duration;

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` characters with an ellipsis appended.
/// Truncation is character-based so multi-byte titles never split a
/// codepoint.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(30), 10), "aaaaaaaaaa…");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}

/// A uniformly random delay in `[min_secs, max_secs)`.
///
/// Used between tasks and after navigation so request timing never falls
/// into a detectable fixed cadence.
pub fn jitter(min_secs: f64, max_secs: f64) -> Duration {
    Duration::from_secs_f64(rng().random_range(min_secs..max_secs))
}

/// A uniformly random delay in `[min_ms, max_ms)` milliseconds.
pub fn jitter_ms(min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(rng().random_range(min_ms..max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn truncate_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with('…'));
    }

    #[test]
    fn truncate_is_char_safe() {
        let s = "新闻标题新闻标题新闻标题";
        let result = truncate_for_log(s, 4);
        assert_eq!(result, "新闻标题…");
    }

    #[test]
    fn jitter_stays_in_range() {
        for _ in 0..50 {
            let d = jitter(3.0, 6.0);
            assert!(d >= Duration::from_secs(3));
            assert!(d < Duration::from_secs(6));
        }
    }
}
