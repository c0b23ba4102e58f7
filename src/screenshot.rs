//! Takes screenshots through an external capture command.
//!
//! Capture programs usually return before the image is flushed to disk, so
//! the file is polled for until it appears or the timeout expires.
use crate::config::ScreenshotSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("No screenshot command configured (set screenshot.command)")]
    NotConfigured,

    #[error("Failed to run screenshot command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Screenshot {0} was not written within the time limit")]
    Timeout(PathBuf),

    #[error("Failed to check for screenshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the configured command and waits for `file_name` to be written.
///
/// If the wait fails the command is killed and any partial file removed.
///
/// # Errors
///
/// Returns an error if no command is configured, the command cannot be
/// started, or the file does not appear before the timeout.
pub async fn capture(
    settings: &ScreenshotSettings,
    file_name: &str,
) -> Result<PathBuf, ScreenshotError> {
    let Some((program, args)) = settings.command.split_first() else {
        return Err(ScreenshotError::NotConfigured);
    };

    let directory = settings
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let path = directory.join(file_name);
    let path_arg = path.to_string_lossy();

    let args: Vec<String> = args
        .iter()
        .map(|arg| arg.replace("{path}", &path_arg))
        .collect();
    debug!("Running screenshot command {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(&args)
        .spawn()
        .map_err(|source| ScreenshotError::Spawn {
            command: program.clone(),
            source,
        })?;

    let waited = wait_for_file(
        &path,
        Duration::from_millis(settings.poll_interval_ms),
        Duration::from_secs(settings.timeout_secs),
    )
    .await;

    if let Err(e) = waited {
        if let Err(kill_error) = child.kill().await {
            warn!("Failed to stop screenshot command: {}", kill_error);
        }
        if tokio::fs::try_exists(&path).await.unwrap_or(true) {
            discard(&path).await;
        }
        return Err(e);
    }

    // Reap the capture process if it already exited.
    match child.try_wait() {
        Ok(Some(status)) if !status.success() => {
            warn!("Screenshot command exited with {}", status);
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to check screenshot command: {}", e),
    }

    Ok(path)
}

/// Polls every `interval` until `path` exists, giving up after `timeout`.
pub async fn wait_for_file(
    path: &Path,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ScreenshotError> {
    let start = Instant::now();
    loop {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ScreenshotError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if exists {
            return Ok(());
        }
        if start.elapsed() > timeout {
            return Err(ScreenshotError::Timeout(path.to_path_buf()));
        }
        sleep(interval).await;
    }
}

/// Removes a screenshot once it has been uploaded, or failed to upload.
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to delete screenshot {}: {}", path.display(), e);
    }
}
