//! Configuration
//!
//! Layered configuration built with the `config` crate: defaults, the global file,
//! an explicit `--config` file, then `CANVAS_SYNC__*` environment variables.

pub mod courses;
pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use courses::CourseConfig;
pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::types::CourseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CANVAS_API_HEADING: &str = "https://canvas.instructure.com";
pub const DEFAULT_TODOIST_ENDPOINT: &str = "https://api.todoist.com/sync/v9";
pub const DEFAULT_PER_PAGE: u32 = 100;

fn default_api_heading() -> String {
    DEFAULT_CANVAS_API_HEADING.to_string()
}

fn default_todoist_endpoint() -> String {
    DEFAULT_TODOIST_ENDPOINT.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_true() -> bool {
    true
}

/// Canvas connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Base URL of the Canvas instance
    #[serde(default = "default_api_heading")]
    pub api_heading: String,

    /// Canvas access token
    #[serde(default)]
    pub api_key: String,

    /// Page size for listing requests
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            api_heading: default_api_heading(),
            api_key: String::new(),
            per_page: default_per_page(),
        }
    }
}

/// Todoist connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    /// Todoist API token; only required for the task pass
    #[serde(default)]
    pub api_key: String,

    /// Sync API base URL
    #[serde(default = "default_todoist_endpoint")]
    pub endpoint: String,
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_todoist_endpoint(),
        }
    }
}

/// Which mirroring passes run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_true")]
    pub files: bool,

    #[serde(default = "default_true")]
    pub modules: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            files: true,
            modules: true,
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub todoist: TodoistConfig,

    /// Selected courses keyed by Canvas course id
    #[serde(default)]
    pub courses: BTreeMap<String, CourseConfig>,

    #[serde(default)]
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Validate settings needed by every pass.
    pub fn validate(&self) -> Result<(), ApiError> {
        let heading = self.canvas.api_heading.trim();
        if heading.is_empty() {
            return Err(ApiError::ConfigError(
                "canvas.api_heading cannot be empty".to_string(),
            ));
        }
        if !heading.starts_with("https") {
            return Err(ApiError::ConfigError(format!(
                "canvas.api_heading must start with 'https', got {}",
                heading
            )));
        }
        if self.canvas.api_key.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "canvas.api_key is not configured (set it in the config file or CANVAS_SYNC__CANVAS__API_KEY)"
                    .to_string(),
            ));
        }
        if self.canvas.per_page == 0 {
            return Err(ApiError::ConfigError(
                "canvas.per_page must be positive".to_string(),
            ));
        }
        self.course_ids()?;
        Ok(())
    }

    /// Validate settings needed by the task pass.
    pub fn validate_todoist(&self) -> Result<(), ApiError> {
        if self.todoist.api_key.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "todoist.api_key is not configured (set it in the config file or CANVAS_SYNC__TODOIST__API_KEY)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Configured courses with parsed ids, in id order.
    pub fn course_ids(&self) -> Result<Vec<(CourseId, &CourseConfig)>, ApiError> {
        self.courses
            .iter()
            .map(|(key, course)| {
                let id = key.trim().parse::<CourseId>().map_err(|_| {
                    ApiError::ConfigError(format!("Invalid course id in [courses]: {}", key))
                })?;
                if course.name.trim().is_empty() {
                    return Err(ApiError::ConfigError(format!(
                        "Course {} has an empty name",
                        id
                    )));
                }
                Ok((id, course))
            })
            .collect()
    }

    /// Course id to configured name.
    pub fn course_names(&self) -> Result<BTreeMap<CourseId, String>, ApiError> {
        Ok(self
            .course_ids()?
            .into_iter()
            .map(|(id, course)| (id, course.name.clone()))
            .collect())
    }

    /// Copy with secrets replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for key in [&mut config.canvas.api_key, &mut config.todoist.api_key] {
            if !key.is_empty() {
                *key = "<redacted>".to_string();
            }
        }
        config
    }
}
