use std::collections::BTreeMap;

use canvas_sync::error::ApiError;
use canvas_sync::notify::RecordingNotifier;
use canvas_sync::pipeline::SyncPipeline;
use canvas_sync::reconcile::link_title;
use canvas_sync::remote::{TaskMutation, TaskStore};
use chrono::{DateTime, TimeZone, Utc};

use crate::integration::support::{assignment_url, FakeLms, FakeTaskStore};

const FAR_DUE: &str = "2024-06-15T23:59:00Z";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn courses() -> BTreeMap<u64, String> {
    BTreeMap::from([(7, "Systems".to_string())])
}

fn title(course_id: u64, id: u64, name: &str) -> String {
    link_title(name, &assignment_url(course_id, id))
}

#[test]
fn missing_project_is_provisioned_before_tasks_are_added() {
    let lms = FakeLms::new().assignment(7, 1, "Final Paper", Some(FAR_DUE), "unsubmitted");
    let mut store = FakeTaskStore::new();
    let notifier = RecordingNotifier::new();

    let report = SyncPipeline::new(&lms, &notifier)
        .sync_tasks(&courses(), &mut store, now())
        .unwrap();

    assert_eq!(store.commits.len(), 2);
    assert_eq!(
        store.commits[0],
        vec![TaskMutation::AddProject {
            name: "Systems".to_string()
        }]
    );
    assert_eq!(report.plan.to_create.len(), 1);
    assert_eq!(report.committed, 1);

    let project_id = &store.projects[0].id;
    let task = &store.tasks[0];
    assert_eq!(&task.project_id, project_id);
    assert_eq!(task.content, title(7, 1, "Final Paper"));
    assert_eq!(task.priority, 4);
    assert_eq!(task.due_date(), Some(FAR_DUE));
}

#[test]
fn creates_and_updates_commit_in_one_batch() {
    let lms = FakeLms::new()
        .assignment(7, 1, "Reading Response", Some(FAR_DUE), "unsubmitted")
        .assignment(7, 2, "Homework 3", Some(FAR_DUE), "unsubmitted")
        .assignment(7, 3, "Lab Writeup", None, "submitted");
    let mut store = FakeTaskStore::new()
        .with_project("p-sys", "Systems")
        .with_task(
            &title(7, 2, "Homework 3"),
            "p-sys",
            Some("2024-06-01T23:59:00Z"),
            3,
        );
    let notifier = RecordingNotifier::new();

    let report = SyncPipeline::new(&lms, &notifier)
        .sync_tasks(&courses(), &mut store, now())
        .unwrap();

    assert_eq!(store.commits.len(), 1);
    assert_eq!(store.commits[0].len(), 2);
    assert_eq!(report.plan.to_create.len(), 1);
    assert_eq!(report.plan.to_update.len(), 1);
    assert_eq!(report.plan.already_submitted.len(), 1);
    assert!(report.plan.to_update[0].due_changed);
    assert!(!report.plan.to_update[0].priority_changed);

    let updated = store
        .tasks
        .iter()
        .find(|t| t.content == title(7, 2, "Homework 3"))
        .unwrap();
    assert_eq!(updated.due_date(), Some(FAR_DUE));

    assert_eq!(
        notifier.sent(),
        vec![(
            "Canvas to Todoist (Total: 3)".to_string(),
            "Added 1 & Updated 1.\nCompleted: 1 & Up-to-Date 0.".to_string()
        )]
    );
}

#[test]
fn second_run_is_up_to_date_and_silent() {
    let lms = FakeLms::new().assignment(7, 1, "Quiz 2", Some(FAR_DUE), "unsubmitted");
    let mut store = FakeTaskStore::new().with_project("p-sys", "Systems");

    let first = RecordingNotifier::new();
    SyncPipeline::new(&lms, &first)
        .sync_tasks(&courses(), &mut store, now())
        .unwrap();
    assert_eq!(first.sent().len(), 1);

    let second = RecordingNotifier::new();
    let report = SyncPipeline::new(&lms, &second)
        .sync_tasks(&courses(), &mut store, now())
        .unwrap();

    assert_eq!(report.plan.unchanged.len(), 1);
    assert_eq!(report.committed, 0);
    assert_eq!(store.commits.len(), 1);
    assert!(second.sent().is_empty());
}

#[test]
fn rejected_commit_fails_the_pass_without_notifying() {
    let lms = FakeLms::new().assignment(7, 1, "Midterm", Some(FAR_DUE), "unsubmitted");
    let mut store = FakeTaskStore::new().with_project("p-sys", "Systems");
    store.reject_commits = true;
    let notifier = RecordingNotifier::new();

    let result = SyncPipeline::new(&lms, &notifier).sync_tasks(&courses(), &mut store, now());

    assert!(matches!(result, Err(ApiError::BatchCommit(_))));
    assert!(store.tasks.is_empty());
    assert!(notifier.sent().is_empty());
    assert_eq!(store.pending(), 1);
}

#[test]
fn unauthorized_listing_skips_only_that_course() {
    let lms = FakeLms::new()
        .failing(7, 401)
        .assignment(8, 1, "Problem Set 1", Some(FAR_DUE), "unsubmitted");
    let names = BTreeMap::from([(7, "Systems".to_string()), (8, "Networks".to_string())]);
    let mut store = FakeTaskStore::new()
        .with_project("p-sys", "Systems")
        .with_project("p-net", "Networks");
    let notifier = RecordingNotifier::new();

    let report = SyncPipeline::new(&lms, &notifier)
        .sync_tasks(&names, &mut store, now())
        .unwrap();

    assert_eq!(report.failed_courses.len(), 1);
    assert_eq!(report.failed_courses[0].0, 7);
    assert!(report.failed_courses[0].1.starts_with("Unauthorized"));
    assert_eq!(report.committed, 1);
    assert_eq!(store.tasks.len(), 1);
    assert_eq!(store.tasks[0].project_id, "p-net");
    assert_eq!(store.tasks[0].content, title(8, 1, "Problem Set 1"));
}

#[test]
fn other_listing_failures_skip_only_that_course() {
    let lms = FakeLms::new()
        .failing(8, 500)
        .assignment(7, 1, "Essay", Some(FAR_DUE), "unsubmitted");
    let names = BTreeMap::from([(7, "Systems".to_string()), (8, "Networks".to_string())]);
    let mut store = FakeTaskStore::new()
        .with_project("p-sys", "Systems")
        .with_project("p-net", "Networks");
    let notifier = RecordingNotifier::new();

    let report = SyncPipeline::new(&lms, &notifier)
        .sync_tasks(&names, &mut store, now())
        .unwrap();

    assert_eq!(report.failed_courses.len(), 1);
    assert_eq!(report.failed_courses[0].0, 8);
    assert_eq!(report.plan.to_create.len(), 1);
    assert_eq!(store.tasks[0].priority, 1);
}
