//! The main entry point for the bug-reporter application.
use anyhow::Result;

/// The main function of the application.
///
/// This function is the entry point for the bug-reporter application. It
/// parses the command line and runs the selected command.
///
/// # Errors
///
/// Returns an error if the command fails.
#[tokio::main]
async fn main() -> Result<()> {
    bug_reporter::app::launch().await
}
