//! This module turns what the reporter typed into the ticket that is sent to
//! Backlog.
use crate::backlog::{ItemKind, NewTicket, ProjectData};
use crate::config::ReportSettings;
use chrono::{DateTime, Local};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("A title is required")]
    MissingTitle,

    #[error("Unknown {kind} `{name}` (available: {available})")]
    UnknownItem {
        kind: ItemKind,
        name: String,
        available: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A bug report as entered by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReport {
    pub title: String,
    pub content: String,
    pub how_to_reproduce: String,
    pub priority: String,
    pub version: String,
    pub category: String,
    pub assignee: String,
    pub capture_screenshot: bool,
    pub send_log: bool,
}

impl BugReport {
    /// Creates a report with the configured defaults.
    pub fn new(title: impl Into<String>, defaults: &ReportSettings) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            how_to_reproduce: String::new(),
            priority: defaults.priority.clone(),
            version: defaults.current_version.clone(),
            category: defaults.category.clone(),
            assignee: defaults.assignee.clone(),
            capture_screenshot: true,
            send_log: true,
        }
    }

    /// Checks that the report can be submitted.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.title.trim().is_empty() {
            return Err(ReportError::MissingTitle);
        }
        Ok(())
    }

    /// Resolves every named field against the project and builds the ticket.
    ///
    /// Empty version, category and assignee names leave the field unset.
    pub fn to_ticket(
        &self,
        project: &ProjectData,
        ticket_type: &str,
        description: String,
        attachment_ids: Vec<u64>,
    ) -> Result<NewTicket, ReportError> {
        self.validate()?;

        let optional = |kind, name: &str| -> Result<Option<u64>, ReportError> {
            if name.trim().is_empty() {
                Ok(None)
            } else {
                resolve(project, kind, name).map(Some)
            }
        };

        Ok(NewTicket {
            project_id: project.project.id,
            summary: self.title.trim().to_string(),
            issue_type_id: resolve(project, ItemKind::IssueType, ticket_type)?,
            priority_id: resolve(project, ItemKind::Priority, &self.priority)?,
            description,
            version_ids: optional(ItemKind::Version, &self.version)?.into_iter().collect(),
            category_ids: optional(ItemKind::Category, &self.category)?.into_iter().collect(),
            assignee_id: optional(ItemKind::User, &self.assignee)?,
            attachment_ids,
        })
    }
}

/// Looks up the id of the item of `kind` named `name`.
pub fn resolve(project: &ProjectData, kind: ItemKind, name: &str) -> Result<u64, ReportError> {
    project
        .find(kind, name)
        .map(|item| item.id)
        .ok_or_else(|| ReportError::UnknownItem {
            kind,
            name: name.to_string(),
            available: project.names(kind).join(", "),
        })
}

/// A human-readable name of the operating system the report is filed from.
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "Mac",
        "windows" => "Windows",
        "linux" => "Linux",
        other => other,
    }
}

/// Builds the ticket description.
///
/// Empty text sections are left out; the log section is only added when the
/// report asks for it.
pub fn render_description(report: &BugReport, log_text: &str, os: &str) -> String {
    let mut description = String::new();

    if !report.content.is_empty() {
        description.push_str(&format!("[Bug details]\n{}\n\n", report.content));
    }
    if !report.how_to_reproduce.is_empty() {
        description.push_str(&format!(
            "[Steps to reproduce]\n{}\n\n",
            report.how_to_reproduce
        ));
    }

    description.push_str(&format!("[Environment]\nOS: {}\n", os));

    if report.send_log {
        description.push_str("\n[Log]\n");
        description.push_str(log_text);
    }

    description
}

/// Prefixes a description with the inline thumbnail of an attachment.
pub fn with_thumbnail(description: &str, attachment_id: u64) -> String {
    format!("#thumbnail({})\n\n{}", attachment_id, description)
}

/// The file name used for a screenshot taken at `now`.
pub fn screenshot_file_name(now: DateTime<Local>) -> String {
    format!("capture_{}.jpg", now.format("%Y_%m_%d_%H-%M-%S"))
}

/// The Backlog search page listing open tickets of `issue_type_id` that
/// match `keyword`.
pub fn search_url(
    base_url: &str,
    project: &ProjectData,
    issue_type_id: u64,
    keyword: &str,
) -> Result<Url, ReportError> {
    let mut url = Url::parse(&format!(
        "{}/find/{}",
        base_url, project.project.project_key
    ))?;

    url.query_pairs_mut()
        .append_pair("condition.projectId", &project.project.id.to_string())
        .append_pair("condition.issueTypeId", &issue_type_id.to_string())
        .append_pair("condition.statusId", "1")
        .append_pair("condition.statusId", "2")
        .append_pair("condition.statusId", "3")
        .append_pair("condition.limit", "20")
        .append_pair("condition.offset", "0")
        .append_pair("condition.query", keyword)
        .append_pair("condition.sort", "UPDATED")
        .append_pair("condition.order", "false")
        .append_pair("condition.simpleSearch", "false")
        .append_pair("condition.allOver", "false");

    Ok(url)
}
