//! # Text Harvest
//!
//! A checkpointed full-text fetcher for news article URL lists. Given a CSV
//! with a `DocumentUrl` column it drives a real browser session through every
//! row, extracts the article body, and writes progress to a sibling
//! `_fulltext.csv` file. Interrupted runs resume from that file, re-fetching
//! only rows without usable content.
//!
//! ## Usage
//!
//! ```sh
//! text_harvest -i ./news_links.csv
//! ```
//!
//! A WebDriver (chromedriver) must be listening on `--webdriver-url`.
//!
//! ## Architecture
//!
//! 1. **Load & reconcile**: read the input CSV, sort by `PubDate`, overlay
//!    any prior checkpoint positionally
//! 2. **Queue**: collect the indices still classified pending
//! 3. **Bootstrap**: one best-effort login on the first pending URL
//! 4. **Fetch loop**: sequential navigate/extract per task with bounded
//!    retry, anti-automation cooldowns, and jittered pacing
//! 5. **Finalize**: persist and release the session on every exit path,
//!    including Ctrl-C and run-level errors

use clap::Parser;
use std::error::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod checkpoint;
mod classify;
mod cli;
mod dataset;
mod extract;
mod fetch;
mod login;
mod orchestrator;
mod prompts;
mod queue;
mod utils;

use browser::{BrowserSession, WebDriverSession};
use cli::Cli;
use dataset::Dataset;
use prompts::{CredentialSource, InputLocator, PromptCredentials, PromptInputFile};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("text_harvest starting up");
    let args = Cli::parse();

    // --- Acquire credentials and input file; cancellation exits cleanly ---
    let credential_source = PromptCredentials {
        username_override: args.username.clone(),
        password_override: args.password.clone(),
    };
    let Some(credentials) = credential_source.acquire() else {
        info!("no credentials supplied; exiting");
        return Ok(());
    };

    let input_locator = PromptInputFile {
        path_override: args.input.clone(),
    };
    let Some(input_path) = input_locator.acquire() else {
        info!("no input file chosen; exiting");
        return Ok(());
    };
    if !input_path.is_file() {
        error!(path = %input_path.display(), "input file does not exist");
        return Err(format!("input file not found: {}", input_path.display()).into());
    }

    let output_path = checkpoint::output_path_for(&input_path);
    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "run configured"
    );

    // --- Load, reconcile, build the queue ---
    let mut dataset = Dataset::load(&input_path)?;
    if let Some(snapshot) = checkpoint::load_if_present(&output_path) {
        checkpoint::reconcile(&mut dataset, snapshot);
    }

    let pending = queue::build_queue(&dataset);
    info!(pending = pending.len(), total = dataset.tasks.len(), "queue built");
    if pending.is_empty() {
        info!(path = %output_path.display(), "all rows already have content; nothing to do");
        return Ok(());
    }

    // --- Browser session; failure here is fatal, nothing fetched yet ---
    let mut session = match WebDriverSession::connect(&args.webdriver_url, args.headless).await {
        Ok(session) => session,
        Err(e) => {
            error!(
                webdriver_url = %args.webdriver_url,
                error = %e,
                "could not create a browser session; is chromedriver running?"
            );
            return Err(e);
        }
    };

    // --- Run, racing an interrupt signal ---
    let run_result = tokio::select! {
        result = orchestrator::run(&mut session, &mut dataset, &output_path, &credentials) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received; stopping and saving progress");
            Ok(())
        }
    };

    // --- Finalizer: always persist, always release the session ---
    if let Err(e) = checkpoint::persist(&dataset, &output_path) {
        error!(error = %e, path = %output_path.display(), "final checkpoint write failed");
    }
    if let Err(e) = session.close().await {
        warn!(error = %e, "browser session did not close cleanly");
    }
    info!(path = %output_path.display(), "run finished; results saved");

    if let Err(e) = run_result {
        error!(error = %e, "run ended with an error");
        return Err(e);
    }
    Ok(())
}
