//! This module defines the ticket-tracker interface and its Backlog
//! implementation over the REST API v2.
use super::types::{Attachment, NamedItem, NewTicket, Project, ProjectData, Space, Ticket};
use crate::config::{BacklogSettings, ConfigError};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backlog returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A trait for the issue tracker that bug tickets are filed into.
#[async_trait]
pub trait TicketTracker: Send + Sync {
    /// Loads the project the tracker is configured for, with every list a
    /// ticket field is chosen from.
    ///
    /// # Errors
    ///
    /// This function will return an error if any part of the project cannot
    /// be fetched.
    async fn load_project(&self) -> Result<ProjectData, BacklogError>;

    /// Uploads a file so it can be attached to a new ticket.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be read or the
    /// upload is rejected.
    async fn add_attachment(&self, path: &Path) -> Result<Attachment, BacklogError>;

    /// Creates a ticket.
    async fn add_ticket(&self, ticket: &NewTicket) -> Result<Ticket, BacklogError>;

    /// Replaces the description of an existing ticket.
    async fn update_description(
        &self,
        ticket: &Ticket,
        description: &str,
    ) -> Result<Ticket, BacklogError>;

    /// The browser URL of a ticket.
    fn ticket_url(&self, ticket: &Ticket) -> String;
}

/// A `TicketTracker` backed by the Backlog REST API.
pub struct BacklogClient {
    http: Client,
    base_url: String,
    api_key: String,
    project_key: String,
}

impl BacklogClient {
    /// Creates a new `BacklogClient`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the space, project or API key
    /// is not configured.
    pub fn new(settings: &BacklogSettings) -> Result<Self, BacklogError> {
        Ok(Self {
            http: Client::new(),
            base_url: settings.base_url()?,
            api_key: settings.resolved_api_key()?,
            project_key: settings.require_project_key()?.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BacklogError> {
        debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .query(&[("apiKey", &self.api_key)])
            .send()
            .await?;
        parse(response).await
    }

    fn project_path(&self, list: &str) -> String {
        format!("projects/{}/{}", self.project_key, list)
    }
}

/// Turns a response into `T`, or into `BacklogError::Api` on a non-success
/// status.
async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, BacklogError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BacklogError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl TicketTracker for BacklogClient {
    async fn load_project(&self) -> Result<ProjectData, BacklogError> {
        let project_path = format!("projects/{}", self.project_key);
        let issue_types_path = self.project_path("issueTypes");
        let versions_path = self.project_path("versions");
        let categories_path = self.project_path("categories");
        let users_path = self.project_path("users");

        let (space, project, issue_types, priorities, versions, categories, users) = tokio::try_join!(
            self.get::<Space>("space"),
            self.get::<Project>(&project_path),
            self.get::<Vec<NamedItem>>(&issue_types_path),
            self.get::<Vec<NamedItem>>("priorities"),
            self.get::<Vec<NamedItem>>(&versions_path),
            self.get::<Vec<NamedItem>>(&categories_path),
            self.get::<Vec<NamedItem>>(&users_path),
        )?;

        Ok(ProjectData {
            space_name: space.name,
            project,
            issue_types,
            priorities,
            versions,
            categories,
            users,
        })
    }

    async fn add_attachment(&self, path: &Path) -> Result<Attachment, BacklogError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| BacklogError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        let form = multipart::Form::new().part("file", part);

        debug!("POST space/attachment {}", path.display());
        let response = self
            .http
            .post(self.url("space/attachment"))
            .query(&[("apiKey", &self.api_key)])
            .multipart(form)
            .send()
            .await?;
        parse(response).await
    }

    async fn add_ticket(&self, ticket: &NewTicket) -> Result<Ticket, BacklogError> {
        debug!("POST issues {}", ticket.summary);
        let response = self
            .http
            .post(self.url("issues"))
            .query(&[("apiKey", &self.api_key)])
            .form(&ticket.form())
            .send()
            .await?;
        parse(response).await
    }

    async fn update_description(
        &self,
        ticket: &Ticket,
        description: &str,
    ) -> Result<Ticket, BacklogError> {
        debug!("PATCH issues/{}", ticket.issue_key);
        let response = self
            .http
            .patch(self.url(&format!("issues/{}", ticket.issue_key)))
            .query(&[("apiKey", &self.api_key)])
            .form(&[("description", description)])
            .send()
            .await?;
        parse(response).await
    }

    fn ticket_url(&self, ticket: &Ticket) -> String {
        format!("{}/view/{}", self.base_url, ticket.issue_key)
    }
}
