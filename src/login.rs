//! Session Bootstrap: the one-shot login sequence run before the queue.
//!
//! Uses the first pending task's URL as the landing page, fills whatever
//! login form it finds, and submits. Runs exactly once with no retry; any
//! failure is logged and the run continues, since a prior session's cookies
//! may already authenticate the browser. A fixed settle delay afterwards
//! gives redirects time to finish.

use crate::browser::{BrowserSession, ENTER_KEY, PageElement, SessionError};
use crate::prompts::Credentials;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Wait after submitting the form, covering login redirects.
const LOGIN_SETTLE: Duration = Duration::from_secs(10);
/// Wait after landing, before touching the form.
const PRE_LOGIN_SETTLE: Duration = Duration::from_secs(3);

/// Username field candidates, most specific first.
const USERNAME_SELECTORS: [&str; 3] = [r#"input[type="text"]"#, r#"input[name*="user"]"#, "#username"];
const PASSWORD_SELECTOR: &str = r#"input[type="password"]"#;
const CHECKBOX_SELECTOR: &str = r#"input[type="checkbox"]"#;
const SUBMIT_SELECTOR: &str = r#"button[type="submit"], input[type="submit"]"#;

/// Run the login sequence once. Never fails the run.
#[instrument(level = "info", skip_all, fields(landing_url = %landing_url))]
pub async fn bootstrap_session<S: BrowserSession>(
    session: &mut S,
    landing_url: &str,
    credentials: &Credentials,
) {
    info!("attempting login on first pending task's page");
    if let Err(e) = try_login(session, landing_url, credentials).await {
        warn!(error = %e, "login sequence failed; continuing (session may already be authenticated)");
    } else {
        info!("login submitted; waiting for redirects");
    }
    sleep(LOGIN_SETTLE).await;
}

async fn try_login<S: BrowserSession>(
    session: &mut S,
    landing_url: &str,
    credentials: &Credentials,
) -> Result<(), SessionError> {
    session.navigate(landing_url).await?;
    sleep(PRE_LOGIN_SETTLE).await;

    // consent / remember-me boxes, best effort
    if let Ok(boxes) = session.find_all(CHECKBOX_SELECTOR).await {
        for mut checkbox in boxes {
            let _ = checkbox.click().await;
        }
    }

    let mut username_field = None;
    for selector in USERNAME_SELECTORS {
        if let Ok(Some(element)) = session.find(selector).await {
            username_field = Some(element);
            break;
        }
    }
    let mut username_field = username_field
        .ok_or_else(|| SessionError::Other("no username field on landing page".to_string()))?;
    username_field.clear().await?;
    username_field.type_text(&credentials.username).await?;

    let mut password_field = session
        .find(PASSWORD_SELECTOR)
        .await?
        .ok_or_else(|| SessionError::Other("no password field on landing page".to_string()))?;
    password_field.clear().await?;
    password_field.type_text(&credentials.password).await?;

    match session.find(SUBMIT_SELECTOR).await {
        Ok(Some(mut button)) => button.click().await?,
        // no clickable submit: fall back to submitting via the password field
        _ => password_field.type_text(ENTER_KEY).await?,
    }
    Ok(())
}
