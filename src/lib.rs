//! canvas-sync: Canvas course mirroring and assignment-to-task reconciliation
//!
//! Replicates course folders, files and module pages from Canvas onto the local
//! filesystem, and keeps one Todoist task per unsubmitted assignment.

pub mod config;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod naming;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod remote;
pub mod tooling;
pub mod types;
