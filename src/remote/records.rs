//! Typed remote records.
//!
//! Canvas payloads are validated here, once, when a raw JSON value becomes a record.
//! A missing required field fails with [`ApiError::MissingField`] naming the record kind,
//! instead of surfacing later in the middle of a traversal.

use crate::error::ApiError;
use crate::types::{CourseId, ProjectId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn required_str(value: &Value, record: &'static str, field: &'static str) -> Result<String, ApiError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ApiError::MissingField { record, field })
}

fn required_u64(value: &Value, record: &'static str, field: &'static str) -> Result<u64, ApiError> {
    value
        .get(field)
        .and_then(Value::as_u64)
        .ok_or(ApiError::MissingField { record, field })
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// A course folder. `full_name` embeds the hierarchy (`course files/Week 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub id: u64,
    pub full_name: String,
    pub files_url: String,
    pub files_count: u64,
    pub folders_count: u64,
}

impl TryFrom<&Value> for Folder {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_u64(value, "folder", "id")?,
            full_name: required_str(value, "folder", "full_name")?,
            files_url: required_str(value, "folder", "files_url")?,
            files_count: value.get("files_count").and_then(Value::as_u64).unwrap_or(0),
            folders_count: value.get("folders_count").and_then(Value::as_u64).unwrap_or(0),
        })
    }
}

/// A downloadable file. The raw payload is kept for lock sidecars and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub display_name: String,
    /// Empty when the file is locked for the current user.
    pub url: String,
    pub size: Option<u64>,
    pub lock_explanation: Option<String>,
    pub raw: Value,
}

impl FileDescriptor {
    /// Locked files come back with an empty URL and an explanation instead of content.
    pub fn is_locked(&self) -> bool {
        self.url.is_empty() && self.lock_explanation.is_some()
    }
}

impl TryFrom<&Value> for FileDescriptor {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            display_name: required_str(value, "file", "display_name")?,
            url: optional_str(value, "url").unwrap_or_default(),
            size: value.get("size").and_then(Value::as_u64),
            lock_explanation: optional_str(value, "lock_explanation"),
            raw: value.clone(),
        })
    }
}

/// A course module; its items are listed from `items_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: u64,
    pub name: String,
    pub items_url: String,
}

impl TryFrom<&Value> for Module {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_u64(value, "module", "id")?,
            name: required_str(value, "module", "name")?,
            items_url: required_str(value, "module", "items_url")?,
        })
    }
}

/// Declared type of a module item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Page,
    Assignment,
    Quiz,
    Discussion,
    SubHeader,
    ExternalUrl,
    ExternalTool,
}

impl ItemKind {
    pub fn parse(kind: &str) -> Result<Self, ApiError> {
        match kind.to_ascii_lowercase().as_str() {
            "file" => Ok(ItemKind::File),
            "page" => Ok(ItemKind::Page),
            "assignment" => Ok(ItemKind::Assignment),
            "quiz" => Ok(ItemKind::Quiz),
            "discussion" => Ok(ItemKind::Discussion),
            "subheader" => Ok(ItemKind::SubHeader),
            "externalurl" => Ok(ItemKind::ExternalUrl),
            "externaltool" => Ok(ItemKind::ExternalTool),
            _ => Err(ApiError::UnknownItemType(kind.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::File => "File",
            ItemKind::Page => "Page",
            ItemKind::Assignment => "Assignment",
            ItemKind::Quiz => "Quiz",
            ItemKind::Discussion => "Discussion",
            ItemKind::SubHeader => "SubHeader",
            ItemKind::ExternalUrl => "ExternalUrl",
            ItemKind::ExternalTool => "ExternalTool",
        }
    }
}

/// One entry of a module. `url` is the API detail URL; absent for headers and links.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleItem {
    pub title: String,
    /// Raw declared type, parsed lazily so an unknown type fails only its own item.
    pub kind: String,
    pub url: Option<String>,
    pub raw: Value,
}

impl TryFrom<&Value> for ModuleItem {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            title: optional_str(value, "title").unwrap_or_default(),
            kind: required_str(value, "module item", "type")?,
            url: optional_str(value, "url"),
            raw: value.clone(),
        })
    }
}

/// Title and HTML body of a page-like item.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDocument {
    pub title: String,
    pub body: String,
}

/// A remote node resolved from a module item's detail payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteNode {
    /// Completes the hierarchy; module item details never resolve to a folder, and the
    /// folder pass walks [`Folder`] listings directly.
    Folder(Folder),
    File(FileDescriptor),
    Page(HtmlDocument),
    Assignment(HtmlDocument),
    Quiz(HtmlDocument),
    Discussion(HtmlDocument),
}

impl RemoteNode {
    /// Build the node for a module item detail payload of the given kind.
    ///
    /// Each kind names its title and body fields differently. A null body is an empty page.
    pub fn from_detail(kind: ItemKind, value: &Value) -> Result<Self, ApiError> {
        let html = |record: &'static str, title: &'static str, body: &str| -> Result<HtmlDocument, ApiError> {
            Ok(HtmlDocument {
                title: required_str(value, record, title)?,
                body: optional_str(value, body).unwrap_or_default(),
            })
        };

        match kind {
            ItemKind::File => Ok(RemoteNode::File(FileDescriptor::try_from(value)?)),
            ItemKind::Page => Ok(RemoteNode::Page(html("page", "title", "body")?)),
            ItemKind::Assignment => Ok(RemoteNode::Assignment(html(
                "assignment",
                "name",
                "description",
            )?)),
            ItemKind::Quiz => Ok(RemoteNode::Quiz(html("quiz", "title", "description")?)),
            ItemKind::Discussion => Ok(RemoteNode::Discussion(html(
                "discussion",
                "title",
                "message",
            )?)),
            ItemKind::SubHeader | ItemKind::ExternalUrl | ItemKind::ExternalTool => {
                Err(ApiError::UnknownItemType(kind.as_str().to_string()))
            }
        }
    }

    pub fn html(&self) -> Option<&HtmlDocument> {
        match self {
            RemoteNode::Page(doc)
            | RemoteNode::Assignment(doc)
            | RemoteNode::Quiz(doc)
            | RemoteNode::Discussion(doc) => Some(doc),
            RemoteNode::Folder(_) | RemoteNode::File(_) => None,
        }
    }
}

/// A Canvas course, as listed for the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub course_code: Option<String>,
}

impl TryFrom<&Value> for Course {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_u64(value, "course", "id")?,
            name: required_str(value, "course", "name")?,
            course_code: optional_str(value, "course_code"),
        })
    }
}

/// A Canvas assignment with the current user's submission state.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    pub html_url: String,
    pub course_id: CourseId,
    /// ISO-8601 UTC, e.g. `2024-05-01T00:00:00Z`.
    pub due_at: Option<String>,
    pub workflow_state: Option<String>,
}

impl Assignment {
    pub fn is_unsubmitted(&self) -> bool {
        self.workflow_state.as_deref() == Some("unsubmitted")
    }
}

impl TryFrom<&Value> for Assignment {
    type Error = ApiError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(Self {
            id: required_u64(value, "assignment", "id")?,
            name: required_str(value, "assignment", "name")?,
            html_url: required_str(value, "assignment", "html_url")?,
            course_id: required_u64(value, "assignment", "course_id")?,
            due_at: optional_str(value, "due_at"),
            workflow_state: value
                .get("submission")
                .and_then(|s| s.get("workflow_state"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Due date of a Todoist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDue {
    pub date: String,
}

/// A Todoist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub content: String,
    pub project_id: ProjectId,
    pub priority: u8,
    #[serde(default)]
    pub due: Option<TaskDue>,
}

impl Task {
    pub fn due_date(&self) -> Option<&str> {
        self.due.as_ref().map(|d| d.date.as_str())
    }
}

/// A Todoist project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

/// Parse every element of a JSON array into records, failing on the first invalid one.
pub fn parse_list<T>(value: &Value, record: &'static str) -> Result<Vec<T>, ApiError>
where
    T: for<'a> TryFrom<&'a Value, Error = ApiError>,
{
    let items = value.as_array().ok_or_else(|| {
        ApiError::Serialization(format!("expected a JSON array of {} records", record))
    })?;
    items.iter().map(T::try_from).collect()
}
