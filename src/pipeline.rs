//! Sync pipeline
//!
//! Orchestrates a run over the configured courses: the folder pass for every course,
//! then the module pass for every course, then task reconciliation. A failing course
//! is logged and the run moves on to the next one.

use crate::error::ApiError;
use crate::mirror::{ContentMirror, MirrorSummary};
use crate::notify::Notifier;
use crate::reconcile::{ProjectDirectory, ReconcilePlan, TaskReconciler};
use crate::remote::{Assignment, LmsApi, TaskStore};
use crate::types::CourseId;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span, warn};

/// A configured course and where it is mirrored.
#[derive(Debug, Clone)]
pub struct CourseTarget {
    pub id: CourseId,
    pub name: String,
    pub root: PathBuf,
}

/// Which mirroring pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPass {
    Files,
    Modules,
}

impl MirrorPass {
    pub fn label(&self) -> &'static str {
        match self {
            MirrorPass::Files => "Files",
            MirrorPass::Modules => "Modules",
        }
    }
}

/// Outcome of one pass over one course.
#[derive(Debug, Clone)]
pub struct CoursePassResult {
    pub course_id: CourseId,
    pub course_name: String,
    pub pass: MirrorPass,
    /// `Err` holds the listing failure that ended the pass for this course
    pub summary: Result<MirrorSummary, String>,
}

/// Summary of a mirroring run
#[derive(Debug, Clone, Default)]
pub struct MirrorReport {
    pub passes: Vec<CoursePassResult>,
    pub duration_ms: u64,
}

impl MirrorReport {
    /// Totals across every successful pass.
    pub fn totals(&self) -> MirrorSummary {
        let mut totals = MirrorSummary::default();
        for result in &self.passes {
            if let Ok(summary) = &result.summary {
                totals.merge(summary);
            }
        }
        totals
    }

    pub fn failed_passes(&self) -> usize {
        self.passes.iter().filter(|p| p.summary.is_err()).count()
    }
}

/// Summary of a task reconciliation run
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    pub plan: ReconcilePlan,
    /// Mutations accepted by the task store
    pub committed: usize,
    /// Courses whose assignment listing failed, with the error text
    pub failed_courses: Vec<(CourseId, String)>,
}

/// Runs mirroring and reconciliation against injected remotes.
pub struct SyncPipeline<'a> {
    lms: &'a dyn LmsApi,
    notifier: &'a dyn Notifier,
    files_pass: bool,
    modules_pass: bool,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(lms: &'a dyn LmsApi, notifier: &'a dyn Notifier) -> Self {
        Self {
            lms,
            notifier,
            files_pass: true,
            modules_pass: true,
        }
    }

    /// Enable or disable the folder and module passes.
    pub fn with_passes(mut self, files: bool, modules: bool) -> Self {
        self.files_pass = files;
        self.modules_pass = modules;
        self
    }

    /// Mirror every course: all folder passes first, then all module passes.
    pub fn mirror_courses(&self, courses: &[CourseTarget]) -> MirrorReport {
        let start = Instant::now();
        let mirror = ContentMirror::new(self.lms);
        let mut report = MirrorReport::default();

        let passes = [
            (MirrorPass::Files, self.files_pass),
            (MirrorPass::Modules, self.modules_pass),
        ];
        for (pass, enabled) in passes {
            if !enabled {
                continue;
            }
            info!(pass = pass.label(), courses = courses.len(), "starting mirror pass");
            for course in courses {
                report.passes.push(self.mirror_course(&mirror, course, pass));
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        let totals = report.totals();
        info!(
            downloaded = totals.files_downloaded,
            updated = totals.files_updated,
            skipped = totals.files_skipped,
            locked = totals.files_locked,
            failed = totals.items_failed,
            failed_passes = report.failed_passes(),
            duration_ms = report.duration_ms,
            "mirror run completed"
        );
        report
    }

    fn mirror_course(
        &self,
        mirror: &ContentMirror<'_>,
        course: &CourseTarget,
        pass: MirrorPass,
    ) -> CoursePassResult {
        let span = info_span!("course", id = course.id, name = %course.name, pass = pass.label());
        let _guard = span.enter();

        let result = match pass {
            MirrorPass::Files => mirror.mirror_course_files(course.id, &course.root),
            MirrorPass::Modules => mirror.mirror_module_items(course.id, &course.root),
        };

        let summary = match result {
            Ok(summary) => {
                let count = summary.materialized();
                info!(
                    downloaded = count,
                    skipped = summary.files_skipped,
                    locked = summary.files_locked,
                    failed = summary.items_failed,
                    "Downloaded {} files",
                    count
                );
                if count > 0 {
                    self.notifier.notify(
                        &format!("{} - {}", course.name, pass.label()),
                        &format!("Downloaded {} files", count),
                    );
                }
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "course listing failed; moving on");
                Err(e.to_string())
            }
        };

        CoursePassResult {
            course_id: course.id,
            course_name: course.name.clone(),
            pass,
            summary,
        }
    }

    /// Reconcile assignments of the configured courses into the task store.
    ///
    /// Provisions missing projects, lists assignments course by course, then commits all
    /// creates and updates in one batch. A failed assignment listing, unauthorized included,
    /// skips only that course; a rejected commit ends the pass with an error.
    pub fn sync_tasks(
        &self,
        course_names: &BTreeMap<CourseId, String>,
        store: &mut dyn TaskStore,
        now: DateTime<Utc>,
    ) -> Result<TaskReport, ApiError> {
        let projects = TaskReconciler::ensure_projects(course_names, store)?;
        let directory = ProjectDirectory::new(course_names.clone(), &projects);

        let mut report = TaskReport::default();
        let mut assignments: Vec<Assignment> = Vec::new();
        for &course_id in course_names.keys() {
            match self.lms.list_assignments(course_id) {
                Ok(mut listed) => assignments.append(&mut listed),
                Err(e @ ApiError::Unauthorized(_)) => {
                    error!(course_id, error = %e, "unauthorized; check the Canvas API key");
                    report.failed_courses.push((course_id, e.to_string()));
                }
                Err(e) => {
                    error!(course_id, error = %e, "failed to list assignments");
                    report.failed_courses.push((course_id, e.to_string()));
                }
            }
        }
        info!(assignments = assignments.len(), "loaded assignments");

        let existing = store.list_tasks()?;
        let plan = TaskReconciler::new(now).reconcile(&assignments, &existing, &directory);
        log_plan(&plan);

        report.committed = if plan.has_mutations() {
            TaskReconciler::apply(&plan, store)?
        } else {
            0
        };

        info!(
            added = plan.to_create.len(),
            updated = plan.to_update.len(),
            already_submitted = plan.already_submitted.len(),
            up_to_date = plan.unchanged.len(),
            unmapped = plan.unmapped.len(),
            "short summary"
        );

        match plan.notification() {
            Some((title, message)) => {
                info!("new tasks added or updated; sending notification");
                self.notifier.notify(&title, &message);
            }
            None => info!("no tasks added or updated; skipping notification"),
        }

        report.plan = plan;
        Ok(report)
    }
}

fn log_plan(plan: &ReconcilePlan) {
    let buckets = [
        ("add", &plan.to_create),
        ("submitted", &plan.already_submitted),
        ("up-to-date", &plan.unchanged),
    ];
    for (status, items) in buckets {
        for item in items {
            info!(
                assignment = %item.assignment.name,
                course = %item.project_name,
                due = item.assignment.due_at.as_deref().unwrap_or("none"),
                priority = item.priority.name(),
                status,
                "assignment"
            );
        }
    }
    for update in &plan.to_update {
        info!(
            assignment = %update.item.assignment.name,
            course = %update.item.project_name,
            due = update.item.assignment.due_at.as_deref().unwrap_or("none"),
            priority = update.item.priority.name(),
            status = "update",
            changes = %update.changes(),
            "assignment"
        );
    }
    for assignment in &plan.unmapped {
        warn!(assignment = %assignment.name, course_id = assignment.course_id, "unmapped course");
    }
}
