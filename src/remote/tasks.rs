//! Todoist task store.
//!
//! Mutations are queued locally and sent as one command batch on [`TaskStore::commit`].
//! The Sync API applies a batch all-or-nothing from our point of view: any command that
//! does not report `ok` fails the whole commit.

use crate::error::ApiError;
use crate::remote::records::{Project, Task};
use crate::types::{ProjectId, TaskId};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// A queued change to the task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMutation {
    AddProject {
        name: String,
    },
    AddTask {
        content: String,
        project_id: ProjectId,
        due: Option<String>,
        priority: u8,
    },
    UpdateTask {
        id: TaskId,
        due: Option<String>,
        priority: u8,
    },
}

/// Task store capability used by the reconciler and project provisioning.
pub trait TaskStore {
    fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    fn list_projects(&self) -> Result<Vec<Project>, ApiError>;
    fn queue(&mut self, mutation: TaskMutation);
    fn pending(&self) -> usize;
    /// Send every queued mutation in one batch. Returns the number committed.
    fn commit(&mut self) -> Result<usize, ApiError>;
}

#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[serde(default)]
    items: Vec<Task>,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    sync_status: HashMap<String, Value>,
}

/// Todoist Sync API client.
pub struct TodoistClient {
    client: Client,
    endpoint: String,
    token: String,
    queued: Vec<TaskMutation>,
}

impl TodoistClient {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("canvas-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: api_key.trim().to_string(),
            queued: Vec::new(),
        })
    }

    fn sync(&self, form: &[(&str, String)]) -> Result<SyncResponse, ApiError> {
        let url = format!("{}/sync", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(form)
            .send()?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(
                "Todoist rejected the API key".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ApiError::RemoteStatus {
                status: status.as_u16(),
                context: url,
            });
        }
        Ok(response.json()?)
    }

    fn read_resources(&self, resource: &str) -> Result<SyncResponse, ApiError> {
        self.sync(&[
            ("sync_token", "*".to_string()),
            ("resource_types", json!([resource]).to_string()),
        ])
    }
}

/// Encode a mutation as a Sync API command with its own uuid.
fn to_command(mutation: &TaskMutation) -> (String, Value) {
    let uuid = uuid::Uuid::new_v4().to_string();
    let command = match mutation {
        TaskMutation::AddProject { name } => json!({
            "type": "project_add",
            "uuid": uuid,
            "temp_id": uuid::Uuid::new_v4().to_string(),
            "args": { "name": name },
        }),
        TaskMutation::AddTask {
            content,
            project_id,
            due,
            priority,
        } => json!({
            "type": "item_add",
            "uuid": uuid,
            "temp_id": uuid::Uuid::new_v4().to_string(),
            "args": {
                "content": content,
                "project_id": project_id,
                "due": due.as_ref().map(|date| json!({ "date": date })),
                "priority": priority,
            },
        }),
        TaskMutation::UpdateTask { id, due, priority } => json!({
            "type": "item_update",
            "uuid": uuid,
            "args": {
                "id": id,
                "due": due.as_ref().map(|date| json!({ "date": date })),
                "priority": priority,
            },
        }),
    };
    (uuid, command)
}

/// Collect every command whose status is not `ok`.
fn failed_commands(uuids: &[String], sync_status: &HashMap<String, Value>) -> Vec<String> {
    uuids
        .iter()
        .filter_map(|uuid| match sync_status.get(uuid) {
            Some(Value::String(s)) if s == "ok" => None,
            Some(other) => Some(format!("{}: {}", uuid, other)),
            None => Some(format!("{}: no status returned", uuid)),
        })
        .collect()
}

impl TaskStore for TodoistClient {
    fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.read_resources("items")?.items)
    }

    fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.read_resources("projects")?.projects)
    }

    fn queue(&mut self, mutation: TaskMutation) {
        debug!(?mutation, "queued task mutation");
        self.queued.push(mutation);
    }

    fn pending(&self) -> usize {
        self.queued.len()
    }

    fn commit(&mut self) -> Result<usize, ApiError> {
        if self.queued.is_empty() {
            return Ok(0);
        }

        let (uuids, commands): (Vec<String>, Vec<Value>) =
            self.queued.iter().map(to_command).unzip();
        let response = self
            .sync(&[("commands", Value::Array(commands).to_string())])
            .map_err(|e| ApiError::BatchCommit(e.to_string()))?;

        let failed = failed_commands(&uuids, &response.sync_status);
        if !failed.is_empty() {
            return Err(ApiError::BatchCommit(failed.join("; ")));
        }

        let committed = self.queued.len();
        self.queued.clear();
        info!(committed, "committed task batch");
        Ok(committed)
    }
}
