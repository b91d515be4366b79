//! Assignment to task reconciliation.
//!
//! [`TaskReconciler::reconcile`] is pure: given assignments, existing tasks and the
//! course to project mapping, it classifies each assignment as create, update,
//! unchanged, already submitted or unmapped. [`TaskReconciler::apply`] queues the
//! creates and updates on a [`TaskStore`] and commits them as one batch.

pub mod plan;
pub mod priority;

pub use plan::{display_due, link_title, PlannedUpdate, ReconcilePlan, Reconciled};
pub use priority::{derive_priority, Priority};

use crate::error::ApiError;
use crate::remote::{Assignment, Project, Task, TaskMutation, TaskStore};
use crate::types::{CourseId, ProjectId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Maps a course to its configured name and to the task-store project of that name.
#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    course_names: BTreeMap<CourseId, String>,
    project_ids: HashMap<String, ProjectId>,
}

impl ProjectDirectory {
    pub fn new(course_names: BTreeMap<CourseId, String>, projects: &[Project]) -> Self {
        let project_ids = projects
            .iter()
            .map(|p| (p.name.clone(), p.id.clone()))
            .collect();
        Self {
            course_names,
            project_ids,
        }
    }

    /// Project name and id for a course, if both are known.
    pub fn resolve(&self, course_id: CourseId) -> Option<(&str, &ProjectId)> {
        let name = self.course_names.get(&course_id)?;
        let id = self.project_ids.get(name)?;
        Some((name.as_str(), id))
    }

    /// Configured course names that have no project yet, in course id order.
    pub fn missing_projects(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = Vec::new();
        for name in self.course_names.values() {
            if !self.project_ids.contains_key(name) && !missing.contains(&name.as_str()) {
                missing.push(name);
            }
        }
        missing
    }
}

/// Matches assignments against tasks and decides what to change.
pub struct TaskReconciler {
    now: DateTime<Utc>,
}

impl TaskReconciler {
    /// Reconciler evaluating due-date urgency relative to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn reconcile(
        &self,
        assignments: &[Assignment],
        existing: &[Task],
        directory: &ProjectDirectory,
    ) -> ReconcilePlan {
        let mut plan = ReconcilePlan::default();

        for assignment in assignments {
            let Some((project_name, project_id)) = directory.resolve(assignment.course_id) else {
                warn!(
                    assignment = %assignment.name,
                    course_id = assignment.course_id,
                    "no project for course; skipping"
                );
                plan.unmapped.push(assignment.clone());
                continue;
            };

            let item = Reconciled {
                assignment: assignment.clone(),
                project_name: project_name.to_string(),
                project_id: project_id.clone(),
                priority: derive_priority(
                    &assignment.name,
                    assignment.due_at.as_deref(),
                    self.now,
                ),
            };

            let title = item.title();
            let matched = existing
                .iter()
                .find(|task| task.content == title && task.project_id == item.project_id);

            match matched {
                Some(task) => {
                    let due_changed = task.due_date() != assignment.due_at.as_deref();
                    let priority_changed = task.priority != item.priority.value();
                    if due_changed || priority_changed {
                        plan.to_update.push(PlannedUpdate {
                            item,
                            task_id: task.id.clone(),
                            due_changed,
                            priority_changed,
                        });
                    } else {
                        plan.unchanged.push(item);
                    }
                }
                None if assignment.is_unsubmitted() => plan.to_create.push(item),
                None => plan.already_submitted.push(item),
            }
        }

        plan
    }

    /// Queue every create and update of `plan` and commit them as one batch.
    ///
    /// A rejected commit fails the whole pass; nothing is reported as applied.
    pub fn apply(plan: &ReconcilePlan, store: &mut dyn TaskStore) -> Result<usize, ApiError> {
        for item in &plan.to_create {
            info!(
                assignment = %item.assignment.name,
                project = %item.project_name,
                priority = %item.priority,
                "adding task"
            );
            store.queue(TaskMutation::AddTask {
                content: item.title(),
                project_id: item.project_id.clone(),
                due: item.assignment.due_at.clone(),
                priority: item.priority.value(),
            });
        }

        for update in &plan.to_update {
            info!(
                assignment = %update.item.assignment.name,
                project = %update.item.project_name,
                changes = %update.changes(),
                "updating task"
            );
            store.queue(TaskMutation::UpdateTask {
                id: update.task_id.clone(),
                due: update.item.assignment.due_at.clone(),
                priority: update.item.priority.value(),
            });
        }

        store.commit()
    }

    /// Create a project for every configured course name that lacks one.
    ///
    /// Returns the project list after provisioning.
    pub fn ensure_projects(
        course_names: &BTreeMap<CourseId, String>,
        store: &mut dyn TaskStore,
    ) -> Result<Vec<Project>, ApiError> {
        let projects = store.list_projects()?;
        let directory = ProjectDirectory::new(course_names.clone(), &projects);
        let missing = directory.missing_projects();
        if missing.is_empty() {
            return Ok(projects);
        }

        for name in &missing {
            info!(project = %name, "creating project");
            store.queue(TaskMutation::AddProject {
                name: name.to_string(),
            });
        }
        store.commit()?;
        store.list_projects()
    }
}
