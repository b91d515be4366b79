//! CourseConfig and save path resolution for mirrored courses.

use crate::config::xdg;
use crate::error::ApiError;
use crate::naming::normalize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One selected course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Display name; also the Todoist project name for the course
    pub name: String,

    /// Local mirror root; defaults to a normalized-name directory under the data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
}

impl CourseConfig {
    /// Resolve the local mirror root for this course.
    ///
    /// Relative `save_path` values are taken relative to `base`.
    pub fn resolve_save_path(&self, base: &Path) -> PathBuf {
        match &self.save_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(normalize(&self.name, false)),
        }
    }

    /// Resolve against the default data directory.
    pub fn default_save_path(&self) -> Result<PathBuf, ApiError> {
        Ok(self.resolve_save_path(&xdg::courses_dir()?))
    }
}
