//! Interactive acquisition of credentials and the input file path.
//!
//! The core never depends on a particular UI: it consumes the
//! [`CredentialSource`] and [`InputLocator`] capabilities, each a single
//! blocking `acquire`. The default implementations prefer values already
//! supplied on the command line and fall back to `dialoguer` prompts.
//! Credentials live only in memory for the duration of the run — they are
//! never persisted and never logged.

use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::path::PathBuf;

/// Account identifier and passphrase for the target site.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Capability: obtain credentials, or `None` when the operator cancels.
pub trait CredentialSource {
    fn acquire(&self) -> Option<Credentials>;
}

/// Capability: obtain the input file path, or `None` when the operator
/// cancels.
pub trait InputLocator {
    fn acquire(&self) -> Option<PathBuf>;
}

/// Prompt-backed [`CredentialSource`] with CLI overrides.
pub struct PromptCredentials {
    pub username_override: Option<String>,
    pub password_override: Option<String>,
}

impl CredentialSource for PromptCredentials {
    fn acquire(&self) -> Option<Credentials> {
        let username = match &self.username_override {
            Some(u) => u.clone(),
            None => Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Login account")
                .allow_empty(true)
                .interact_text()
                .ok()?,
        };
        if username.trim().is_empty() {
            return None;
        }

        let password = match &self.password_override {
            Some(p) => p.clone(),
            None => Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Login password")
                .allow_empty_password(true)
                .interact()
                .ok()?,
        };
        if password.is_empty() {
            return None;
        }

        Some(Credentials { username, password })
    }
}

/// Prompt-backed [`InputLocator`] with a CLI override.
pub struct PromptInputFile {
    pub path_override: Option<PathBuf>,
}

impl InputLocator for PromptInputFile {
    fn acquire(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path_override {
            return Some(path.clone());
        }
        let raw = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Path to the CSV file with article links")
            .allow_empty(true)
            .interact_text()
            .ok()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(PathBuf::from(raw))
    }
}
