//! Remote APIs
//!
//! Typed records for Canvas and Todoist payloads, and the capabilities the sync core
//! is handed explicitly: [`LmsApi`] for course content and [`TaskStore`] for tasks.

pub mod lms;
pub mod records;
pub mod tasks;

pub use lms::{HttpLmsClient, LmsApi};
pub use records::{
    Assignment, Course, FileDescriptor, Folder, HtmlDocument, ItemKind, Module, ModuleItem,
    Project, RemoteNode, Task, TaskDue,
};
pub use tasks::{TaskMutation, TaskStore, TodoistClient};
