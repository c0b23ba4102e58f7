pub mod args;
mod setup;
mod submit;

pub use args::AppArgs;

use crate::backlog::{BacklogClient, ItemKind, TicketTracker};
use crate::config::Settings;
use crate::logging::{ingest, lock, SharedRecorder};
use crate::report::{self, BugReport};
use anyhow::{Context, Result};
use args::{AppCommand, ReportArgs};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp {
        args,
        settings_path,
        settings,
        capture,
    } = setup::prepare(args)?;
    let recorder = capture.recorder();

    match args.command {
        AppCommand::Report(report_args) => run_report(&settings, &recorder, report_args).await,
        AppCommand::Search { keyword, open } => run_search(&settings, &keyword, open).await,
        AppCommand::Settings { init } => run_settings(settings, &settings_path, init),
        AppCommand::Logs { log_files } => {
            ingest_log_files(&recorder, &log_files)?;
            print!("{}", lock(&recorder).export_formatted());
            Ok(())
        }
    }
}

async fn run_report(
    settings: &Settings,
    recorder: &SharedRecorder,
    args: ReportArgs,
) -> Result<()> {
    ingest_log_files(recorder, &args.log_files)?;

    let report = build_report(settings, &args);
    let client = BacklogClient::new(&settings.backlog)?;
    let submitted = submit::submit(&client, settings, &report, recorder).await?;

    println!(
        "{} {} {}",
        "✓ Bug report filed:".green().bold(),
        submitted.issue_key.bold(),
        submitted.url
    );

    if args.open {
        setup::open_url(&submitted.url);
    }
    Ok(())
}

/// Applies the command-line fields over the configured defaults.
fn build_report(settings: &Settings, args: &ReportArgs) -> BugReport {
    let mut report = BugReport::new(args.title.clone(), &settings.report);
    report.content = args.content.clone();
    report.how_to_reproduce = args.how_to.clone();
    if let Some(priority) = &args.priority {
        report.priority = priority.clone();
    }
    if let Some(version) = &args.version {
        report.version = version.clone();
    }
    if let Some(category) = &args.category {
        report.category = category.clone();
    }
    if let Some(assignee) = &args.assignee {
        report.assignee = assignee.clone();
    }
    report.capture_screenshot = !args.no_screenshot;
    report.send_log = !args.no_log;
    report
}

async fn run_search(settings: &Settings, keyword: &str, open: bool) -> Result<()> {
    let client = BacklogClient::new(&settings.backlog)?;
    let project = client
        .load_project()
        .await
        .context("Failed to load project information")?;
    let issue_type_id = report::resolve(&project, ItemKind::IssueType, &settings.report.ticket_type)?;

    let url = report::search_url(&settings.backlog.base_url()?, &project, issue_type_id, keyword)?;
    println!("{}", url);

    if open {
        setup::open_url(url.as_str());
    }
    Ok(())
}

fn run_settings(settings: Settings, path: &Path, init: bool) -> Result<()> {
    let (settings, created) = if init {
        Settings::load_or_create(path)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?
    } else {
        (settings, false)
    };

    if created {
        println!("{} {}", "Created settings file:".green(), path.display());
    } else if path.exists() {
        println!("{} {}", "Settings file:".bold(), path.display());
    } else {
        println!(
            "{} {} {}",
            "Settings file:".bold(),
            path.display(),
            "(missing, run `settings --init` to create it)".yellow()
        );
    }
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    let mut shown = settings.clone();
    if !shown.backlog.api_key.is_empty() {
        shown.backlog.api_key = "********".to_string();
    }
    match toml::to_string_pretty(&shown) {
        Ok(text) => println!("{}", text),
        Err(e) => warn!("Failed to render settings: {}", e),
    }
}

/// Records the events of each log file.
///
/// The recorder is locked only around `feed`; anything logged while it is
/// held would deadlock in the recorder layer.
fn ingest_log_files(recorder: &SharedRecorder, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let events = ingest::read_file(path)?;
        let tracked = ingest::feed(&mut lock(recorder), &events);
        debug!("Recorded {} tracked events from {}", tracked, path.display());
    }
    Ok(())
}
