//! In-memory remotes for driving the pipeline without a network.

use canvas_sync::error::ApiError;
use canvas_sync::remote::{
    Assignment, Course, FileDescriptor, Folder, LmsApi, Module, ModuleItem, Project, Task,
    TaskDue, TaskMutation, TaskStore,
};
use canvas_sync::types::CourseId;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

/// Canvas stand-in. Unknown listings are empty; unknown detail or blob URLs are 404s.
#[derive(Default)]
pub struct FakeLms {
    folders: HashMap<CourseId, Vec<Value>>,
    folder_files: HashMap<u64, Vec<Value>>,
    modules: HashMap<CourseId, Vec<Value>>,
    module_items: HashMap<u64, Vec<Value>>,
    details: HashMap<String, Value>,
    blobs: HashMap<String, Vec<u8>>,
    assignments: HashMap<CourseId, Vec<Value>>,
    failing: HashMap<CourseId, u16>,
    downloads: RefCell<Vec<String>>,
}

impl FakeLms {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, course_id: CourseId, context: &str) -> Result<(), ApiError> {
        match self.failing.get(&course_id) {
            Some(401) => Err(ApiError::Unauthorized(context.to_string())),
            Some(&status) => Err(ApiError::RemoteStatus {
                status,
                context: context.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Every listing of `course_id` answers with `status`.
    pub fn failing(mut self, course_id: CourseId, status: u16) -> Self {
        self.failing.insert(course_id, status);
        self
    }

    pub fn folder(mut self, course_id: CourseId, id: u64, full_name: &str) -> Self {
        self.folders.entry(course_id).or_default().push(json!({
            "id": id,
            "full_name": full_name,
            "files_url": format!("https://canvas.test/api/v1/folders/{}/files", id),
            "files_count": 0,
            "folders_count": 0,
        }));
        self
    }

    pub fn file(mut self, folder_id: u64, display_name: &str, url: &str, bytes: &[u8]) -> Self {
        self.folder_files
            .entry(folder_id)
            .or_default()
            .push(file_json(display_name, url, bytes));
        self.blobs.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn locked_file(mut self, folder_id: u64, display_name: &str, explanation: &str) -> Self {
        self.folder_files.entry(folder_id).or_default().push(json!({
            "display_name": display_name,
            "url": "",
            "size": 10,
            "lock_explanation": explanation,
        }));
        self
    }

    /// A raw file record, possibly malformed.
    pub fn raw_file(mut self, folder_id: u64, record: Value) -> Self {
        self.folder_files.entry(folder_id).or_default().push(record);
        self
    }

    pub fn module(mut self, course_id: CourseId, id: u64, name: &str) -> Self {
        self.modules.entry(course_id).or_default().push(json!({
            "id": id,
            "name": name,
            "items_url": format!("https://canvas.test/api/v1/modules/{}/items", id),
        }));
        self
    }

    pub fn item(mut self, module_id: u64, kind: &str, title: &str, url: Option<&str>) -> Self {
        let mut item = json!({ "type": kind, "title": title });
        if let Some(url) = url {
            item["url"] = json!(url);
        }
        self.module_items.entry(module_id).or_default().push(item);
        self
    }

    pub fn detail(mut self, url: &str, value: Value) -> Self {
        self.details.insert(url.to_string(), value);
        self
    }

    /// A module file item: detail record plus downloadable bytes.
    pub fn module_file(self, module_id: u64, display_name: &str, bytes: &[u8]) -> Self {
        let detail_url = format!("https://canvas.test/api/v1/files/{}", display_name);
        let download_url = format!("https://canvas.test/files/{}/download", display_name);
        let mut lms = self
            .item(module_id, "File", display_name, Some(&detail_url))
            .detail(&detail_url, file_json(display_name, &download_url, bytes));
        lms.blobs.insert(download_url, bytes.to_vec());
        lms
    }

    pub fn blob(mut self, url: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn assignment(
        mut self,
        course_id: CourseId,
        id: u64,
        name: &str,
        due_at: Option<&str>,
        workflow_state: &str,
    ) -> Self {
        self.assignments.entry(course_id).or_default().push(json!({
            "id": id,
            "name": name,
            "html_url": assignment_url(course_id, id),
            "course_id": course_id,
            "due_at": due_at,
            "submission": { "workflow_state": workflow_state },
        }));
        self
    }

    /// URLs downloaded so far, in order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

pub fn assignment_url(course_id: CourseId, id: u64) -> String {
    format!("https://canvas.test/courses/{}/assignments/{}", course_id, id)
}

fn file_json(display_name: &str, url: &str, bytes: &[u8]) -> Value {
    json!({
        "display_name": display_name,
        "url": url,
        "size": bytes.len(),
    })
}

fn parse_all<T>(values: Option<&Vec<Value>>) -> Result<Vec<T>, ApiError>
where
    T: for<'a> TryFrom<&'a Value, Error = ApiError>,
{
    values
        .map(|v| v.iter().map(T::try_from).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

impl LmsApi for FakeLms {
    fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        Ok(Vec::new())
    }

    fn list_folders(&self, course_id: CourseId) -> Result<Vec<Folder>, ApiError> {
        self.check(course_id, "folders")?;
        parse_all(self.folders.get(&course_id))
    }

    fn list_folder_files(
        &self,
        folder: &Folder,
    ) -> Result<Vec<Result<FileDescriptor, ApiError>>, ApiError> {
        Ok(self
            .folder_files
            .get(&folder.id)
            .map(|files| files.iter().map(FileDescriptor::try_from).collect())
            .unwrap_or_default())
    }

    fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, ApiError> {
        self.check(course_id, "modules")?;
        parse_all(self.modules.get(&course_id))
    }

    fn list_module_items(
        &self,
        module: &Module,
    ) -> Result<Vec<Result<ModuleItem, ApiError>>, ApiError> {
        Ok(self
            .module_items
            .get(&module.id)
            .map(|items| items.iter().map(ModuleItem::try_from).collect())
            .unwrap_or_default())
    }

    fn fetch_detail(&self, url: &str) -> Result<Value, ApiError> {
        self.details.get(url).cloned().ok_or(ApiError::RemoteStatus {
            status: 404,
            context: url.to_string(),
        })
    }

    fn list_assignments(&self, course_id: CourseId) -> Result<Vec<Assignment>, ApiError> {
        self.check(course_id, "assignments")?;
        parse_all(self.assignments.get(&course_id))
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ApiError> {
        let bytes = self.blobs.get(url).ok_or(ApiError::RemoteStatus {
            status: 404,
            context: url.to_string(),
        })?;
        self.downloads.borrow_mut().push(url.to_string());
        sink.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Todoist stand-in applying committed batches to in-memory state.
#[derive(Default)]
pub struct FakeTaskStore {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub queued: Vec<TaskMutation>,
    pub commits: Vec<Vec<TaskMutation>>,
    pub reject_commits: bool,
    next_id: u64,
}

impl FakeTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, id: &str, name: &str) -> Self {
        self.projects.push(Project {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_task(mut self, content: &str, project_id: &str, due: Option<&str>, priority: u8) -> Self {
        self.next_id += 1;
        self.tasks.push(Task {
            id: format!("t{}", self.next_id),
            content: content.to_string(),
            project_id: project_id.to_string(),
            priority,
            due: due.map(|d| TaskDue {
                date: d.to_string(),
            }),
        });
        self
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

impl TaskStore for FakeTaskStore {
    fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.tasks.clone())
    }

    fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.projects.clone())
    }

    fn queue(&mut self, mutation: TaskMutation) {
        self.queued.push(mutation);
    }

    fn pending(&self) -> usize {
        self.queued.len()
    }

    fn commit(&mut self) -> Result<usize, ApiError> {
        if self.queued.is_empty() {
            return Ok(0);
        }
        if self.reject_commits {
            return Err(ApiError::BatchCommit("rejected by fake".to_string()));
        }

        let batch = std::mem::take(&mut self.queued);
        for mutation in &batch {
            match mutation {
                TaskMutation::AddProject { name } => {
                    let id = self.fresh_id("p");
                    self.projects.push(Project {
                        id,
                        name: name.clone(),
                    });
                }
                TaskMutation::AddTask {
                    content,
                    project_id,
                    due,
                    priority,
                } => {
                    let id = self.fresh_id("t");
                    self.tasks.push(Task {
                        id,
                        content: content.clone(),
                        project_id: project_id.clone(),
                        priority: *priority,
                        due: due.clone().map(|date| TaskDue { date }),
                    });
                }
                TaskMutation::UpdateTask { id, due, priority } => {
                    if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) {
                        task.priority = *priority;
                        task.due = due.clone().map(|date| TaskDue { date });
                    }
                }
            }
        }
        let committed = batch.len();
        self.commits.push(batch);
        Ok(committed)
    }
}

/// Shared buffer collecting formatted tracing output.
#[derive(Clone, Default)]
pub struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Run `f` with a plain-text subscriber writing into this buffer.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let logs = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || logs.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
