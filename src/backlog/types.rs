//! The subset of Backlog's data the bug reporter reads and writes.
use serde::Deserialize;
use std::fmt;

/// Anything in a project that is picked by name: issue types, priorities,
/// versions, categories and users.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamedItem {
    pub id: u64,
    pub name: String,
}

/// Which list of a project a name is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    IssueType,
    Priority,
    Version,
    Category,
    User,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::IssueType => "issue type",
            ItemKind::Priority => "priority",
            ItemKind::Version => "version",
            ItemKind::Category => "category",
            ItemKind::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub project_key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub name: String,
}

/// Everything needed to fill in a bug ticket for one project.
#[derive(Debug, Clone)]
pub struct ProjectData {
    pub space_name: String,
    pub project: Project,
    pub issue_types: Vec<NamedItem>,
    pub priorities: Vec<NamedItem>,
    pub versions: Vec<NamedItem>,
    pub categories: Vec<NamedItem>,
    pub users: Vec<NamedItem>,
}

impl ProjectData {
    pub fn items(&self, kind: ItemKind) -> &[NamedItem] {
        match kind {
            ItemKind::IssueType => &self.issue_types,
            ItemKind::Priority => &self.priorities,
            ItemKind::Version => &self.versions,
            ItemKind::Category => &self.categories,
            ItemKind::User => &self.users,
        }
    }

    /// Finds the item of `kind` named exactly `name`.
    pub fn find(&self, kind: ItemKind, name: &str) -> Option<&NamedItem> {
        self.items(kind).iter().find(|item| item.name == name)
    }

    /// The names of every item of `kind`, in the server's order.
    pub fn names(&self, kind: ItemKind) -> Vec<&str> {
        self.items(kind).iter().map(|item| item.name.as_str()).collect()
    }
}

/// A file uploaded to the space or attached to a ticket.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: u64,
    pub name: String,
}

/// A created ticket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: u64,
    pub issue_key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// The fields sent when creating a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTicket {
    pub project_id: u64,
    pub summary: String,
    pub issue_type_id: u64,
    pub priority_id: u64,
    pub description: String,
    pub version_ids: Vec<u64>,
    pub category_ids: Vec<u64>,
    pub assignee_id: Option<u64>,
    pub attachment_ids: Vec<u64>,
}

impl NewTicket {
    /// Encodes the ticket as Backlog form parameters.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("projectId", self.project_id.to_string()),
            ("summary", self.summary.clone()),
            ("issueTypeId", self.issue_type_id.to_string()),
            ("priorityId", self.priority_id.to_string()),
            ("description", self.description.clone()),
        ];
        form.extend(self.version_ids.iter().map(|id| ("versionId[]", id.to_string())));
        form.extend(self.category_ids.iter().map(|id| ("categoryId[]", id.to_string())));
        if let Some(assignee) = self.assignee_id {
            form.push(("assigneeId", assignee.to_string()));
        }
        form.extend(
            self.attachment_ids
                .iter()
                .map(|id| ("attachmentId[]", id.to_string())),
        );
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_deserializes_from_api_response() {
        let json = r#"{
            "id": 42,
            "issueKey": "GAME-7",
            "summary": "Crash on load",
            "description": "text",
            "attachments": [{"id": 9, "name": "capture.jpg", "size": 120}]
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.issue_key, "GAME-7");
        assert_eq!(ticket.attachments[0], Attachment { id: 9, name: "capture.jpg".into() });
    }

    #[test]
    fn form_repeats_list_parameters() {
        let ticket = NewTicket {
            project_id: 1,
            summary: "s".into(),
            issue_type_id: 2,
            priority_id: 3,
            description: "d".into(),
            version_ids: vec![4],
            category_ids: vec![5, 6],
            assignee_id: None,
            attachment_ids: vec![7],
        };
        let form = ticket.form();
        assert!(form.contains(&("versionId[]", "4".to_string())));
        assert_eq!(form.iter().filter(|(k, _)| *k == "categoryId[]").count(), 2);
        assert!(!form.iter().any(|(k, _)| *k == "assigneeId"));
        assert!(form.contains(&("attachmentId[]", "7".to_string())));
    }
}
