//! Format run reports and mirror status as text.

use crate::pipeline::{MirrorReport, TaskReport};
use crate::reconcile::{display_due, Reconciled};
use crate::remote::Course;
use crate::tooling::status::MirrorStatus;
use comfy_table::presets::{UTF8_BORDERS_ONLY, UTF8_FULL};
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Whether command output written to stdout should carry ANSI styling.
///
/// Requires `enabled` (the `logging.color` setting), an interactive stdout and no
/// `NO_COLOR` in the environment.
pub fn stdout_color(enabled: bool) -> bool {
    enabled && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Format a section heading, bold and underlined when `color` is set.
pub fn format_section_heading(title: &str, color: bool) -> String {
    if color {
        format!("{}", title.bold().underline())
    } else {
        title.to_string()
    }
}

pub fn format_mirror_report(report: &MirrorReport, color: bool) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Mirror", color));
    if report.passes.is_empty() {
        out.push_str("No courses configured.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Course", "Pass", "Downloaded", "Updated", "Skipped", "Locked", "Failed",
    ]);
    for result in &report.passes {
        match &result.summary {
            Ok(s) => table.add_row(vec![
                result.course_name.clone(),
                result.pass.label().to_string(),
                s.files_downloaded.to_string(),
                s.files_updated.to_string(),
                s.files_skipped.to_string(),
                s.files_locked.to_string(),
                s.items_failed.to_string(),
            ]),
            Err(e) => table.add_row(vec![
                result.course_name.clone(),
                result.pass.label().to_string(),
                format!("error: {}", e),
            ]),
        };
    }
    out.push_str(&format!("{}\n", table));

    let totals = report.totals();
    out.push_str(&format!(
        "Materialized {} files, fetched {} assets in {} ms",
        totals.materialized(),
        totals.assets_fetched,
        report.duration_ms
    ));
    if report.failed_passes() > 0 {
        out.push_str(&format!(
            "\n{}",
            format!("{} course passes failed", report.failed_passes()).red()
        ));
    }
    out
}

/// Short summary, and with `detailed` one row per assignment.
pub fn format_task_report(report: &TaskReport, detailed: bool, color: bool) -> String {
    let plan = &report.plan;
    let mut out = format!("{}\n\n", format_section_heading("Short Summary", color));
    out.push_str(&format!("  * Added: {}\n", plan.to_create.len()));
    out.push_str(&format!("  * Updated: {}\n", plan.to_update.len()));
    out.push_str(&format!(
        "  * Already Submitted: {}\n",
        plan.already_submitted.len()
    ));
    out.push_str(&format!("  * Up to Date: {}\n", plan.unchanged.len()));
    if !plan.unmapped.is_empty() {
        out.push_str(&format!("  * Unmapped: {}\n", plan.unmapped.len()));
    }
    for (course_id, error) in &report.failed_courses {
        let marker = if color {
            "!".red().to_string()
        } else {
            "!".to_string()
        };
        out.push_str(&format!("  {} course {}: {}\n", marker, course_id, error));
    }

    if detailed {
        out.push('\n');
        out.push_str(&format!("{}\n\n", format_section_heading("Detailed Summary", color)));
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Status", "Assignment", "Course", "Due Date", "Priority"]);
        let mut push = |status: &str, item: &Reconciled| {
            table.add_row(vec![
                status.to_string(),
                item.assignment.name.clone(),
                item.project_name.clone(),
                display_due(item.assignment.due_at.as_deref()),
                item.priority.name().to_string(),
            ]);
        };
        for item in &plan.unchanged {
            push("UP-TO-DATE", item);
        }
        for item in &plan.already_submitted {
            push("IS-SUBMITTED", item);
        }
        for update in &plan.to_update {
            push("UPDATED", &update.item);
        }
        for item in &plan.to_create {
            push("ADDED", item);
        }
        out.push_str(&table.to_string());
    }
    out
}

pub fn format_status_text(statuses: &[MirrorStatus], color: bool) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Local Mirrors", color));
    if statuses.is_empty() {
        out.push_str("No courses configured.");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Course", "Path", "Files", "Size", "Locked"]);
    for s in statuses {
        let files = if s.exists {
            s.files.to_string()
        } else {
            "not synced".to_string()
        };
        table.add_row(vec![
            s.name.clone(),
            s.path.display().to_string(),
            files,
            format_bytes(s.bytes),
            s.locked.to_string(),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_courses(courses: &[Course]) -> String {
    if courses.is_empty() {
        return "No courses visible to this token.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Code", "Name"]);
    for c in courses {
        table.add_row(vec![
            c.id.to_string(),
            c.course_code.clone().unwrap_or_default(),
            c.name.clone(),
        ]);
    }
    table.to_string()
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
