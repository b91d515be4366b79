//! Task priority derived from an assignment's name and due date.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::debug;

/// Todoist priority; higher is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Normal = 1,
    Medium = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Priority::Normal),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            4 => Some(Priority::Urgent),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Normal => "Normal",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyword tiers, most urgent first.
const KEYWORD_TIERS: &[(Priority, &[&str])] = &[
    (Priority::Urgent, &["exam", "test", "midterm", "final"]),
    (
        Priority::High,
        &["project", "paper", "quiz", "homework", "discussion"],
    ),
    (Priority::Medium, &["reading", "assignment"]),
];

/// Anything due sooner than this is urgent regardless of its name.
pub const URGENT_WINDOW_DAYS: i64 = 3;

/// Derive the priority of an assignment at time `now`.
///
/// Starts at Normal and is raised to the highest keyword tier whose keyword occurs
/// (case-insensitively) in `name`. A due date less than three days after `now`,
/// including one already past, forces Urgent. An unparseable due date is ignored.
pub fn derive_priority(name: &str, due_at: Option<&str>, now: DateTime<Utc>) -> Priority {
    let lower = name.to_lowercase();
    let mut priority = Priority::Normal;

    for (tier, keywords) in KEYWORD_TIERS {
        if *tier > priority && keywords.iter().any(|k| lower.contains(k)) {
            priority = *tier;
        }
    }

    if let Some(due_at) = due_at {
        match DateTime::parse_from_rfc3339(due_at) {
            Ok(due) => {
                if due.with_timezone(&Utc) - now < Duration::days(URGENT_WINDOW_DAYS) {
                    priority = Priority::Urgent;
                }
            }
            Err(e) => debug!(due_at, error = %e, "unparseable due date"),
        }
    }

    priority
}
