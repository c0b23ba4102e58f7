//! This module handles the initial setup of the application.
use super::args::AppArgs;
use crate::config::Settings;
use crate::logging::LogCapture;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, error};

/// Contains all the necessary components for a command to run.
pub struct PreparedApp {
    /// The command-line arguments.
    pub args: AppArgs,
    /// Where the settings were loaded from.
    pub settings_path: PathBuf,
    pub settings: Settings,
    /// The subscription feeding this process's warnings and errors into the
    /// report log.
    pub capture: LogCapture,
}

/// Prepares the application for running.
///
/// This function performs the following steps:
/// 1. Resolves the settings path.
/// 2. Loads the settings, falling back to the defaults without writing them.
/// 3. Configures logging with the configured log capacity.
///
/// # Errors
///
/// This function will return an error if the settings cannot be loaded or
/// logging cannot be installed.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    let settings_path = match &args.config {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };

    // Logging is not installed yet, so settings problems surface through the
    // returned error only.
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    let capture = LogCapture::install(settings.report.log_capacity)
        .context("Failed to install logging")?;

    Ok(PreparedApp {
        args,
        settings_path,
        settings,
        capture,
    })
}

/// Opens a URL in the system's default browser.
pub fn open_url(url: &str) -> bool {
    open_with(url, |url| open::that_detached(url))
}

fn open_with(url: &str, opener: impl FnOnce(&str) -> std::io::Result<()>) -> bool {
    match opener(url) {
        Ok(()) => {
            debug!("Opened {} in browser", url);
            true
        }
        Err(e) => {
            error!("Failed to open URL in browser: {}", e);
            false
        }
    }
}
