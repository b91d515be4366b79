//! Reconciliation results.

use crate::reconcile::priority::Priority;
use crate::remote::Assignment;
use crate::types::{ProjectId, TaskId};
use chrono::DateTime;

/// Task title for an assignment: a markdown link to the assignment page.
///
/// This string is the matching key against existing tasks, so a renamed assignment or a
/// changed URL no longer matches and a new task is created.
pub fn link_title(name: &str, html_url: &str) -> String {
    format!("[{}]({})", name, html_url)
}

/// An assignment resolved to its project, with its freshly derived priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub assignment: Assignment,
    pub project_name: String,
    pub project_id: ProjectId,
    pub priority: Priority,
}

impl Reconciled {
    pub fn title(&self) -> String {
        link_title(&self.assignment.name, &self.assignment.html_url)
    }
}

/// An existing task that has drifted from its assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub item: Reconciled,
    pub task_id: TaskId,
    pub due_changed: bool,
    pub priority_changed: bool,
}

impl PlannedUpdate {
    /// Human-readable list of the fields being changed.
    pub fn changes(&self) -> String {
        let mut changes = Vec::new();
        if self.due_changed {
            changes.push("due date");
        }
        if self.priority_changed {
            changes.push("priority");
        }
        changes.join(", ")
    }
}

/// Classification of every assignment in one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub to_create: Vec<Reconciled>,
    pub to_update: Vec<PlannedUpdate>,
    pub unchanged: Vec<Reconciled>,
    pub already_submitted: Vec<Reconciled>,
    /// Assignments whose course has no configured name or no task-store project.
    pub unmapped: Vec<Assignment>,
}

impl ReconcilePlan {
    pub fn total(&self) -> usize {
        self.to_create.len()
            + self.to_update.len()
            + self.unchanged.len()
            + self.already_submitted.len()
            + self.unmapped.len()
    }

    pub fn has_mutations(&self) -> bool {
        !self.to_create.is_empty() || !self.to_update.is_empty()
    }

    /// Notification for a pass that added or updated tasks; `None` otherwise.
    pub fn notification(&self) -> Option<(String, String)> {
        if !self.has_mutations() {
            return None;
        }
        let title = format!("Canvas to Todoist (Total: {})", self.total());
        let message = format!(
            "Added {} & Updated {}.\nCompleted: {} & Up-to-Date {}.",
            self.to_create.len(),
            self.to_update.len(),
            self.already_submitted.len(),
            self.unchanged.len()
        );
        Some((title, message))
    }
}

/// Due timestamp formatted for people, e.g. `May 22, 2022 at 12:00 PM`.
pub fn display_due(due_at: Option<&str>) -> String {
    due_at
        .and_then(|due| DateTime::parse_from_rfc3339(due).ok())
        .map(|due| due.format("%b %d, %Y at %I:%M %p").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
