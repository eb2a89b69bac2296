//! Content Extractor: pulls article text out of an already-navigated page.
//!
//! Strategy chain, first match wins:
//!
//! 1. Probe a fixed priority list of container selectors; take the first one
//!    that is displayed and carries more than 50 characters of text. The
//!    ordering is deliberate — the most specific, most reliable containers
//!    come first.
//! 2. Fall back to concatenating every paragraph longer than 40 characters;
//!    accept the result only past 100 characters total.
//!
//! Every probe is independently fault tolerant: a failed or missing lookup
//! moves the chain along instead of aborting it.

use crate::browser::{BrowserSession, PageElement};
use tracing::debug;

/// Article container selectors in priority order.
pub const CONTENT_SELECTORS: [&str; 4] =
    ["#documentBody", ".text-container", ".article-body", ".fullText"];

/// Minimum text length (chars) for a primary container hit.
const PRIMARY_MIN_CHARS: usize = 50;
/// Minimum length for an individual paragraph in the fallback pass.
const PARAGRAPH_MIN_CHARS: usize = 40;
/// Minimum length for the concatenated fallback result.
const FALLBACK_MIN_CHARS: usize = 100;

/// Extract article text from the current page, or `None` when no strategy
/// produced enough content.
pub async fn extract_article<S: BrowserSession>(session: &mut S) -> Option<String> {
    for selector in CONTENT_SELECTORS {
        match session.find(selector).await {
            Ok(Some(element)) => {
                if !element.is_displayed().await.unwrap_or(false) {
                    continue;
                }
                match element.text().await {
                    Ok(text) => {
                        let text = text.trim();
                        if text.chars().count() > PRIMARY_MIN_CHARS {
                            debug!(selector, chars = text.chars().count(), "primary selector hit");
                            return Some(text.to_string());
                        }
                    }
                    Err(e) => debug!(selector, error = %e, "text read failed; trying next selector"),
                }
            }
            Ok(None) => {}
            Err(e) => debug!(selector, error = %e, "selector probe failed; trying next selector"),
        }
    }

    let paragraphs = match session.find_all("p").await {
        Ok(elements) => elements,
        Err(e) => {
            debug!(error = %e, "paragraph fallback lookup failed");
            return None;
        }
    };

    let mut kept = Vec::new();
    for paragraph in &paragraphs {
        if let Ok(text) = paragraph.text().await {
            if text.chars().count() > PARAGRAPH_MIN_CHARS {
                kept.push(text);
            }
        }
    }
    let joined = kept.join("\n");
    if joined.chars().count() > FALLBACK_MIN_CHARS {
        debug!(paragraphs = kept.len(), chars = joined.chars().count(), "paragraph fallback hit");
        Some(joined)
    } else {
        None
    }
}
