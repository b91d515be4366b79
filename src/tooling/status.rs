//! Local mirror status: what is on disk for each configured course.

use crate::mirror::change::LOCK_SIDECAR_SUFFIX;
use crate::mirror::store::PARTIAL_SUFFIX;
use crate::types::CourseId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// On-disk statistics for one course mirror.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorStatus {
    pub course_id: CourseId,
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    /// Regular files, excluding lock sidecars and partial downloads
    pub files: usize,
    pub bytes: u64,
    /// Lock sidecars
    pub locked: usize,
    /// Leftover partial downloads from interrupted runs
    pub partial: usize,
}

/// Walk `root` and count what a mirror run has left there.
pub fn scan_mirror(course_id: CourseId, name: &str, root: &Path) -> MirrorStatus {
    let mut status = MirrorStatus {
        course_id,
        name: name.to_string(),
        path: root.to_path_buf(),
        exists: root.is_dir(),
        files: 0,
        bytes: 0,
        locked: 0,
        partial: 0,
    };
    if !status.exists {
        return status;
    }

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_name = entry.file_name().to_string_lossy();
        if file_name.ends_with(LOCK_SIDECAR_SUFFIX) {
            status.locked += 1;
        } else if file_name.ends_with(PARTIAL_SUFFIX) {
            status.partial += 1;
        } else {
            status.files += 1;
            status.bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    status
}
