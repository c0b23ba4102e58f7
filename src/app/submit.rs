//! The sequence that turns a bug report into a Backlog ticket.
use crate::backlog::TicketTracker;
use crate::config::Settings;
use crate::logging::{lock, SharedRecorder};
use crate::report::{self, BugReport};
use crate::screenshot;
use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

/// A ticket that was filed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTicket {
    pub issue_key: String,
    pub url: String,
}

/// Files `report` into the tracker.
///
/// The project is loaded and every named field resolved before the
/// screenshot is taken, so a typo fails fast. A screenshot that cannot be
/// taken or uploaded aborts the submission.
///
/// # Errors
///
/// Returns an error if the report is invalid or any step against the
/// tracker or the screenshot command fails.
pub async fn submit(
    tracker: &dyn TicketTracker,
    settings: &Settings,
    report: &BugReport,
    recorder: &SharedRecorder,
) -> Result<SubmittedTicket> {
    report.validate()?;

    info!("Loading project information...");
    let project = tracker
        .load_project()
        .await
        .context("Failed to load project information")?;

    let log_text = if report.send_log {
        lock(recorder).export_formatted()
    } else {
        String::new()
    };
    let description = report::render_description(report, &log_text, report::os_name());

    let mut ticket = report.to_ticket(
        &project,
        &settings.report.ticket_type,
        description.clone(),
        Vec::new(),
    )?;

    let mut screenshot_name = None;
    if report.capture_screenshot {
        info!("Attaching screenshot...");
        let file_name = report::screenshot_file_name(Local::now());
        let path = screenshot::capture(&settings.screenshot, &file_name)
            .await
            .context("Failed to take a screenshot")?;

        let uploaded = tracker.add_attachment(&path).await;
        screenshot::discard(&path).await;
        let attachment = uploaded.context("Failed to attach the screenshot")?;

        ticket.attachment_ids.push(attachment.id);
        screenshot_name = Some(file_name);
    }

    info!("Adding bug ticket...");
    let mut created = tracker
        .add_ticket(&ticket)
        .await
        .context("Failed to create the ticket")?;

    // Uploaded files get a new id once they are attached to a ticket, so the
    // thumbnail can only be linked after creation.
    if let Some(file_name) = screenshot_name {
        match created.attachments.iter().find(|a| a.name == file_name) {
            Some(attachment) => {
                info!("Adding screenshot thumbnail to {}...", created.issue_key);
                let with_thumbnail = report::with_thumbnail(&description, attachment.id);
                created = tracker
                    .update_description(&created, &with_thumbnail)
                    .await
                    .context("Failed to add the screenshot thumbnail")?;
            }
            None => warn!(
                "Screenshot {} not found on {}, skipping thumbnail",
                file_name, created.issue_key
            ),
        }
    }

    info!("Bug report {} filed", created.issue_key);
    Ok(SubmittedTicket {
        url: tracker.ticket_url(&created),
        issue_key: created.issue_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::{Attachment, BacklogError, NewTicket, ProjectData, Ticket};
    use crate::config::ScreenshotSettings;
    use crate::logging::{shared, Severity};
    use crate::report::tests::project;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTracker {
        uploads: Mutex<Vec<String>>,
        created: Mutex<Vec<NewTicket>>,
        updates: Mutex<Vec<String>>,
        fail_upload: bool,
    }

    #[async_trait]
    impl TicketTracker for FakeTracker {
        async fn load_project(&self) -> Result<ProjectData, BacklogError> {
            Ok(project())
        }

        async fn add_attachment(&self, path: &Path) -> Result<Attachment, BacklogError> {
            assert!(path.exists(), "screenshot must exist while uploading");
            if self.fail_upload {
                return Err(BacklogError::Api {
                    status: 413,
                    body: "too large".to_string(),
                });
            }
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.uploads.lock().unwrap().push(name.clone());
            Ok(Attachment { id: 500, name })
        }

        async fn add_ticket(&self, ticket: &NewTicket) -> Result<Ticket, BacklogError> {
            self.created.lock().unwrap().push(ticket.clone());
            let attachments = self
                .uploads
                .lock()
                .unwrap()
                .iter()
                .map(|name| Attachment {
                    id: 900,
                    name: name.clone(),
                })
                .collect();
            Ok(Ticket {
                id: 1,
                issue_key: "GAME-1".to_string(),
                description: Some(ticket.description.clone()),
                attachments,
            })
        }

        async fn update_description(
            &self,
            ticket: &Ticket,
            description: &str,
        ) -> Result<Ticket, BacklogError> {
            self.updates.lock().unwrap().push(description.to_string());
            Ok(Ticket {
                description: Some(description.to_string()),
                ..ticket.clone()
            })
        }

        fn ticket_url(&self, ticket: &Ticket) -> String {
            format!("https://studio.backlog.com/view/{}", ticket.issue_key)
        }
    }

    fn report() -> BugReport {
        let mut report = BugReport::new("Crash on load", &Settings::default().report);
        report.content = "Freezes".to_string();
        report
    }

    #[tokio::test]
    async fn files_ticket_with_logs_and_no_screenshot() {
        let tracker = FakeTracker::default();
        let recorder = shared(4);
        lock(&recorder).record(Severity::Error, "save failed", "at save()");

        let mut report = report();
        report.capture_screenshot = false;

        let submitted = submit(&tracker, &Settings::default(), &report, &recorder)
            .await
            .unwrap();

        assert_eq!(submitted.issue_key, "GAME-1");
        assert_eq!(submitted.url, "https://studio.backlog.com/view/GAME-1");

        let created = tracker.created.lock().unwrap();
        assert_eq!(created[0].issue_type_id, 2);
        assert!(created[0].description.starts_with("[Bug details]\nFreezes"));
        assert!(created[0].description.contains("''Message'' save failed"));
        assert!(created[0].attachment_ids.is_empty());
        assert!(tracker.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_section_is_omitted_when_disabled() {
        let tracker = FakeTracker::default();
        let recorder = shared(4);
        lock(&recorder).record(Severity::Error, "secret", "");

        let mut report = report();
        report.capture_screenshot = false;
        report.send_log = false;

        submit(&tracker, &Settings::default(), &report, &recorder)
            .await
            .unwrap();
        let created = tracker.created.lock().unwrap();
        assert!(!created[0].description.contains("[Log]"));
        assert!(!created[0].description.contains("secret"));
    }

    #[tokio::test]
    async fn unknown_field_fails_before_anything_is_created() {
        let tracker = FakeTracker::default();
        let mut report = report();
        report.category = "Audio".to_string();

        let err = submit(&tracker, &Settings::default(), &report, &shared(4))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown category `Audio`"));
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_screenshot_command_aborts() {
        let tracker = FakeTracker::default();

        let err = submit(&tracker, &Settings::default(), &report(), &shared(4))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to take a screenshot"));
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    fn touch_settings(dir: &Path) -> Settings {
        Settings {
            screenshot: ScreenshotSettings {
                command: vec!["touch".to_string(), "{path}".to_string()],
                directory: Some(dir.to_path_buf()),
                timeout_secs: 5,
                poll_interval_ms: 10,
            },
            ..Settings::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn screenshot_is_attached_and_thumbnailed() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = FakeTracker::default();

        submit(&tracker, &touch_settings(dir.path()), &report(), &shared(4))
            .await
            .unwrap();

        assert_eq!(tracker.created.lock().unwrap()[0].attachment_ids, vec![500]);
        let updates = tracker.updates.lock().unwrap();
        assert!(updates[0].starts_with("#thumbnail(900)\n\n[Bug details]"));
        // The screenshot is removed after upload.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_upload_aborts_and_removes_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = FakeTracker {
            fail_upload: true,
            ..FakeTracker::default()
        };

        let err = submit(&tracker, &touch_settings(dir.path()), &report(), &shared(4))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to attach the screenshot"));
        assert!(tracker.created.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
