//! Command-line interface definitions.
//!
//! Every option may also come from the environment; whatever the command
//! line does not supply is acquired interactively at startup (see
//! [`crate::prompts`]).

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for `text_harvest`.
///
/// # Examples
///
/// ```sh
/// # fully non-interactive
/// text_harvest -i ./news_links.csv --username me@example.com --password secret
///
/// # prompt for everything, talk to a chromedriver elsewhere
/// text_harvest --webdriver-url http://127.0.0.1:4444
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV file with the article links (prompted for when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Login account for the target site (prompted for when omitted)
    #[arg(long, env = "TEXT_HARVEST_USER")]
    pub username: Option<String>,

    /// Login password for the target site (prompted for when omitted)
    #[arg(long, env = "TEXT_HARVEST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// WebDriver endpoint to attach the browser session to
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,
}
