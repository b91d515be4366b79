use std::fs;

use canvas_sync::mirror::{asset_hash, ContentMirror, COURSE_FILES_DIR};
use canvas_sync::notify::RecordingNotifier;
use canvas_sync::pipeline::{CourseTarget, MirrorPass, SyncPipeline};
use serde_json::json;
use tempfile::TempDir;

use crate::integration::support::{CapturedLogs, FakeLms};

fn target(id: u64, name: &str, temp: &TempDir) -> CourseTarget {
    CourseTarget {
        id,
        name: name.to_string(),
        root: temp.path().join(name),
    }
}

#[test]
fn folder_pass_mirrors_files_under_normalized_folder_paths() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(7, 1, "course files")
        .folder(7, 2, "course files/Week 1")
        .file(1, "Syllabus 2024.pdf", "https://canvas.test/f/1", b"syllabus")
        .file(2, "Lecture_Notes.txt", "https://canvas.test/f/2", b"notes");

    let summary = ContentMirror::new(&lms)
        .mirror_course_files(7, temp.path())
        .unwrap();

    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(
        fs::read(temp.path().join("course-files/Syllabus-2024.pdf")).unwrap(),
        b"syllabus"
    );
    assert_eq!(
        fs::read(temp.path().join("course-files/week-1/Lecture-Notes.txt")).unwrap(),
        b"notes"
    );
}

#[test]
fn second_run_skips_everything() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(7, 1, "course files")
        .file(1, "a.pdf", "https://canvas.test/f/a", b"aaaa")
        .module(7, 10, "Week 1")
        .module_file(10, "b.pdf", b"bbbb")
        .item(10, "Page", "Welcome", Some("https://canvas.test/api/v1/pages/welcome"))
        .detail(
            "https://canvas.test/api/v1/pages/welcome",
            json!({ "title": "Welcome", "body": "<p>hi</p><img src=\"https://canvas.test/i.png\">" }),
        )
        .blob("https://canvas.test/i.png", b"png");
    let mirror = ContentMirror::new(&lms);

    let first_files = mirror.mirror_course_files(7, temp.path()).unwrap();
    let first_modules = mirror.mirror_module_items(7, temp.path()).unwrap();
    assert_eq!(first_files.materialized() + first_modules.materialized(), 3);
    let downloads_after_first = lms.downloads().len();

    let second_files = mirror.mirror_course_files(7, temp.path()).unwrap();
    let second_modules = mirror.mirror_module_items(7, temp.path()).unwrap();
    assert_eq!(second_files.materialized(), 0);
    assert_eq!(second_modules.materialized(), 0);
    assert_eq!(second_files.files_skipped + second_modules.files_skipped, 3);
    assert_eq!(lms.downloads().len(), downloads_after_first);
}

#[test]
fn locked_file_gets_sidecar_and_no_download() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(7, 1, "course files")
        .locked_file(1, "exam.pdf", "Locked until May 1");

    let summary = ContentMirror::new(&lms)
        .mirror_course_files(7, temp.path())
        .unwrap();

    assert_eq!(summary.files_locked, 1);
    assert_eq!(summary.materialized(), 0);
    assert!(lms.downloads().is_empty());
    let sidecar = temp.path().join("course-files/exam.pdf-locked.json");
    let recorded: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(sidecar).unwrap()).unwrap();
    assert_eq!(recorded["lock_explanation"], "Locked until May 1");
    assert!(!temp.path().join("course-files/exam.pdf").exists());
}

#[test]
fn malformed_record_fails_only_itself() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(7, 1, "course files")
        .raw_file(1, json!({ "url": "https://canvas.test/f/x" }))
        .file(1, "ok.txt", "https://canvas.test/f/ok", b"ok");

    let summary = ContentMirror::new(&lms)
        .mirror_course_files(7, temp.path())
        .unwrap();

    assert_eq!(summary.items_failed, 1);
    assert_eq!(summary.files_downloaded, 1);
}

#[test]
fn failed_file_download_logs_its_payload() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new().folder(7, 1, "course files").raw_file(
        1,
        json!({ "display_name": "gone.pdf", "url": "https://canvas.test/f/gone", "size": 3 }),
    );
    let logs = CapturedLogs::default();

    let summary = logs
        .capture(|| ContentMirror::new(&lms).mirror_course_files(7, temp.path()))
        .unwrap();

    assert_eq!(summary.items_failed, 1);
    let output = logs.contents();
    assert!(output.contains("failed to mirror file"));
    assert!(output.contains("file=gone.pdf"));
    assert!(output.contains(r#""url":"https://canvas.test/f/gone""#));
}

#[test]
fn folder_listing_failure_yields_error_and_no_files() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .failing(7, 403)
        .folder(7, 1, "course files")
        .file(1, "a.pdf", "https://canvas.test/f/a", b"a");

    let result = ContentMirror::new(&lms).mirror_course_files(7, temp.path());

    assert!(result.is_err());
    assert!(lms.downloads().is_empty());
    assert!(!temp.path().join(COURSE_FILES_DIR).exists());
}

#[test]
fn module_file_falls_back_to_module_folder_once() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .module(7, 10, "Week 1: Intro")
        .module_file(10, "slides.pdf", b"slides");

    let summary = ContentMirror::new(&lms)
        .mirror_module_items(7, temp.path())
        .unwrap();

    assert_eq!(summary.files_downloaded, 1);
    let files_root = temp.path().join(COURSE_FILES_DIR);
    assert!(!files_root.join("slides.pdf").exists());
    assert_eq!(
        fs::read(files_root.join("week-1-intro/slides.pdf")).unwrap(),
        b"slides"
    );
}

#[test]
fn module_file_already_mirrored_by_folder_pass_is_not_downloaded_again() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(7, 1, "course files")
        .file(1, "slides.pdf", "https://canvas.test/f/slides", b"slides")
        .module(7, 10, "Week 1")
        .module_file(10, "slides.pdf", b"slides");
    let mirror = ContentMirror::new(&lms);

    mirror.mirror_course_files(7, temp.path()).unwrap();
    let modules = mirror.mirror_module_items(7, temp.path()).unwrap();

    assert_eq!(modules.materialized(), 0);
    assert_eq!(modules.files_skipped, 1);
    assert_eq!(lms.downloads(), vec!["https://canvas.test/f/slides".to_string()]);
    assert!(!temp
        .path()
        .join(COURSE_FILES_DIR)
        .join("week-1/slides.pdf")
        .exists());
}

#[test]
fn module_page_is_written_with_local_asset_references() {
    let temp = TempDir::new().unwrap();
    let image = "https://canvas.test/img/diagram.png";
    let lms = FakeLms::new()
        .module(7, 10, "Week 1")
        .item(10, "Page", "Reading Guide", Some("https://canvas.test/api/v1/pages/guide"))
        .detail(
            "https://canvas.test/api/v1/pages/guide",
            json!({ "title": "Reading Guide", "body": format!("<h1>Guide</h1><img alt=\"d\" src=\"{}\">", image) }),
        )
        .blob(image, b"png-bytes");

    let summary = ContentMirror::new(&lms)
        .mirror_module_items(7, temp.path())
        .unwrap();

    assert_eq!(summary.files_downloaded, 1);
    assert_eq!(summary.assets_fetched, 1);
    let module_dir = temp.path().join("course-files/week-1");
    let html = fs::read_to_string(module_dir.join("Reading-Guide.html")).unwrap();
    let hash = asset_hash(image);
    assert_eq!(
        html,
        format!("<h1>Guide</h1><img alt=\"d\" src=\"./img/{}\">", hash)
    );
    assert_eq!(fs::read(module_dir.join("img").join(&hash)).unwrap(), b"png-bytes");
}

#[test]
fn non_downloadable_and_unknown_items_do_not_stop_the_module() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .module(7, 10, "Week 1")
        .item(10, "SubHeader", "Readings", None)
        .item(10, "Wiki", "Mystery", Some("https://canvas.test/api/v1/wiki/1"))
        .item(10, "Page", "Missing", Some("https://canvas.test/api/v1/pages/gone"))
        .module_file(10, "kept.txt", b"kept");

    let summary = ContentMirror::new(&lms)
        .mirror_module_items(7, temp.path())
        .unwrap();

    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.items_failed, 2);
    assert_eq!(summary.files_downloaded, 1);
}

#[test]
fn pipeline_continues_past_failing_course_and_notifies_per_pass() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .failing(1, 404)
        .folder(2, 20, "course files")
        .file(20, "a.pdf", "https://canvas.test/f/a", b"a")
        .module(2, 30, "Week 1")
        .module_file(30, "b.pdf", b"b");
    let notifier = RecordingNotifier::new();
    let courses = vec![target(1, "Broken", &temp), target(2, "Systems", &temp)];

    let report = SyncPipeline::new(&lms, &notifier).mirror_courses(&courses);

    assert_eq!(report.passes.len(), 4);
    assert_eq!(report.failed_passes(), 2);
    assert_eq!(report.passes[0].pass, MirrorPass::Files);
    assert_eq!(report.passes[3].pass, MirrorPass::Modules);
    assert_eq!(report.totals().files_downloaded, 2);
    assert_eq!(
        notifier.sent(),
        vec![
            ("Systems - Files".to_string(), "Downloaded 1 files".to_string()),
            ("Systems - Modules".to_string(), "Downloaded 1 files".to_string()),
        ]
    );
}

#[test]
fn pipeline_stays_quiet_when_nothing_changed() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(2, 20, "course files")
        .file(20, "a.pdf", "https://canvas.test/f/a", b"a");
    let courses = vec![target(2, "Systems", &temp)];

    let first = RecordingNotifier::new();
    SyncPipeline::new(&lms, &first).mirror_courses(&courses);
    assert_eq!(first.sent().len(), 1);

    let second = RecordingNotifier::new();
    SyncPipeline::new(&lms, &second).mirror_courses(&courses);
    assert!(second.sent().is_empty());
}

#[test]
fn disabled_passes_are_not_run() {
    let temp = TempDir::new().unwrap();
    let lms = FakeLms::new()
        .folder(2, 20, "course files")
        .file(20, "a.pdf", "https://canvas.test/f/a", b"a");
    let notifier = RecordingNotifier::new();
    let courses = vec![target(2, "Systems", &temp)];

    let report = SyncPipeline::new(&lms, &notifier)
        .with_passes(false, true)
        .mirror_courses(&courses);

    assert!(report.passes.iter().all(|p| p.pass == MirrorPass::Modules));
    assert!(lms.downloads().is_empty());
}
