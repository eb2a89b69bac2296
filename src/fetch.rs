//! Fetch Attempt: one task's navigate → detect → humanize → extract cycle
//! with bounded retry and anti-automation backoff.
//!
//! # Attempt Budget
//!
//! Each task gets at most [`MAX_ATTEMPTS`] attempts. An attempt ends one of
//! three ways:
//!
//! - **Content**: extraction succeeded — terminal, the text is the result.
//! - **Blocked**: the page carried the anti-automation marker. Retryable but
//!   attempt-consuming; a 30 second cooldown runs before the next attempt.
//! - **Error / no content**: unexpected driver failures are caught here,
//!   logged, and consume an attempt after a short pause. They never abort
//!   the run.
//!
//! Exhausting the budget yields [`FAILURE_SENTINEL`], which classifies as
//! pending so a future run retries the task automatically.

use crate::browser::{BrowserSession, PageElement};
use crate::classify::{FAILURE_SENTINEL, ROBOT_MARKER};
use crate::extract::extract_article;
use crate::utils::{jitter, jitter_ms};
use rand::{Rng, rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Attempts per task, including ones consumed by blocks and errors.
pub const MAX_ATTEMPTS: usize = 2;
/// Cooldown after the site serves an anti-automation challenge.
const BLOCKED_COOLDOWN: Duration = Duration::from_secs(30);
/// Pause after an unexpected attempt-level error.
const ERROR_PAUSE: Duration = Duration::from_secs(2);

/// Popup and consent elements dismissed best-effort before extraction.
const POPUP_SELECTORS: [&str; 3] = [
    r#"button[aria-label="Close"]"#,
    ".modal-header .close",
    "#onetrust-accept-btn-handler",
];

enum Attempt {
    Content(String),
    Blocked,
    NoContent,
}

/// Fetch one task's article text, retrying within the attempt budget.
///
/// Never fails and never hangs: the worst outcome is the failure sentinel
/// after the budget is spent. In-memory task state is untouched by this
/// function — the orchestrator commits the returned value once it is final.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn fetch_article_text<S: BrowserSession>(session: &mut S, url: &str) -> String {
    for attempt in 1..=MAX_ATTEMPTS {
        match run_attempt(session, url).await {
            Ok(Attempt::Content(text)) => return text,
            Ok(Attempt::Blocked) => {
                warn!(attempt, "anti-automation challenge served; cooling down");
                sleep(BLOCKED_COOLDOWN).await;
            }
            Ok(Attempt::NoContent) => {
                debug!(attempt, "no content found on page");
            }
            Err(e) => {
                warn!(attempt, error = %e, "attempt failed; pausing before retry");
                sleep(ERROR_PAUSE).await;
            }
        }
    }
    warn!(attempts = MAX_ATTEMPTS, "attempt budget exhausted; recording failure");
    FAILURE_SENTINEL.to_string()
}

async fn run_attempt<S: BrowserSession>(
    session: &mut S,
    url: &str,
) -> Result<Attempt, crate::browser::SessionError> {
    session.navigate(url).await?;
    sleep(jitter(2.0, 4.0)).await;

    if session.page_source().await?.contains(ROBOT_MARKER) {
        return Ok(Attempt::Blocked);
    }

    humanize(session).await;

    match extract_article(session).await {
        Some(text) => Ok(Attempt::Content(text)),
        None => Ok(Attempt::NoContent),
    }
}

/// Best-effort human-behavior simulation: a partial smooth scroll followed by
/// popup dismissal. Nothing here can fail the attempt.
async fn humanize<S: BrowserSession>(session: &mut S) {
    random_smooth_scroll(session).await;
    dismiss_popups(session).await;
}

async fn random_smooth_scroll<S: BrowserSession>(session: &mut S) {
    let total_height = match session.run_script("return document.body.scrollHeight").await {
        Ok(value) => value.as_f64().unwrap_or(0.0) as i64,
        Err(e) => {
            debug!(error = %e, "scroll height query failed; skipping scroll");
            return;
        }
    };
    if total_height < 1000 {
        return;
    }

    let target = (total_height as f64 * rng().random_range(0.3..0.6)) as i64;
    let step: i64 = rng().random_range(200..=400);
    let mut current = 0i64;
    while current < target {
        current += step;
        if session
            .run_script(&format!("window.scrollTo(0, {current});"))
            .await
            .is_err()
        {
            return;
        }
        sleep(jitter_ms(100, 300)).await;
    }
}

async fn dismiss_popups<S: BrowserSession>(session: &mut S) {
    for selector in POPUP_SELECTORS {
        if let Ok(Some(mut element)) = session.find(selector).await {
            let _ = element.click().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::stub::{StubElement, StubPage, StubSession};
    use crate::classify::{TaskStatus, classify};

    const URL: &str = "https://ex.com/story";

    fn article_page(body: &str) -> StubPage {
        let mut page = StubPage::default();
        page.source = format!("<html>{body}</html>");
        page.elements
            .insert("#documentBody".into(), StubElement::visible(body));
        page
    }

    fn blocked_page() -> StubPage {
        StubPage {
            source: format!("<html>{ROBOT_MARKER}</html>"),
            ..StubPage::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn successful_extraction_is_terminal() {
        let body = "An article body long enough to clear the primary threshold easily.";
        let mut session = StubSession::new().with_page(URL, article_page(body));
        let text = fetch_article_text(&mut session, URL).await;
        assert_eq!(text, body);
        assert_eq!(session.visits.len(), 1, "no retry after success");
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_pages_exhaust_budget_to_sentinel() {
        let mut session = StubSession::new().with_page(URL, blocked_page());
        let text = fetch_article_text(&mut session, URL).await;
        assert_eq!(text, FAILURE_SENTINEL);
        assert_eq!(session.visits.len(), MAX_ATTEMPTS, "block consumes attempts");
        assert_eq!(classify(Some(text.as_str())), TaskStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_errors_consume_attempts_without_aborting() {
        let mut session = StubSession::new();
        session.fail_navigation = true;
        let text = fetch_article_text(&mut session, URL).await;
        assert_eq!(text, FAILURE_SENTINEL);
        assert_eq!(session.visits.len(), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_page_retries_then_fails() {
        let mut session = StubSession::new().with_page(URL, StubPage::default());
        let text = fetch_article_text(&mut session, URL).await;
        assert_eq!(text, FAILURE_SENTINEL);
        assert_eq!(session.visits.len(), MAX_ATTEMPTS);
    }
}
