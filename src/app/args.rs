use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "bug-reporter")]
#[command(about = "File bug tickets with recent logs and a screenshot into Backlog")]
pub struct AppArgs {
    #[arg(long, global = true, help = "Settings file path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: AppCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AppCommand {
    /// File a bug ticket
    Report(ReportArgs),
    /// Print the URL of a keyword search over open bug tickets
    Search {
        #[arg(help = "Keyword to search for")]
        keyword: String,

        #[arg(long, help = "Open the search in the browser")]
        open: bool,
    },
    /// Print the effective settings
    Settings {
        #[arg(long, help = "Write the default settings file if it is missing")]
        init: bool,
    },
    /// Print the log section a report would contain
    Logs {
        #[arg(long = "log-file", help = "Log file to read warnings and errors from")]
        log_files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long, help = "Ticket title (required)")]
    pub title: String,

    #[arg(long, default_value = "", help = "What went wrong")]
    pub content: String,

    #[arg(long = "how-to", default_value = "", help = "Steps to reproduce")]
    pub how_to: String,

    #[arg(long, help = "Priority name (defaults to settings)")]
    pub priority: Option<String>,

    #[arg(long, help = "Version the bug occurs in (defaults to settings)")]
    pub version: Option<String>,

    #[arg(long, help = "Category name (defaults to settings)")]
    pub category: Option<String>,

    #[arg(long, help = "Assignee name (defaults to settings)")]
    pub assignee: Option<String>,

    #[arg(long = "no-screenshot", help = "Do not attach a screenshot")]
    pub no_screenshot: bool,

    #[arg(long = "no-log", help = "Do not include recent logs")]
    pub no_log: bool,

    #[arg(long = "log-file", help = "Log file to read warnings and errors from")]
    pub log_files: Vec<PathBuf>,

    #[arg(long, help = "Open the new ticket in the browser")]
    pub open: bool,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
