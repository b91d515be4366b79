//! Run notifications.

use std::cell::RefCell;
use tracing::info;

/// Receives a `(title, message)` pair when a pass changed something.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Emits notifications as structured log events on the `canvas_sync::notify` target.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(target: "canvas_sync::notify", title, message, "notification");
    }
}

/// Keeps notifications in memory; used for quiet runs and tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}
