//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SyncConfig;
use crate::error::ApiError;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, the global file, an optional explicit file,
    /// and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<SyncConfig, ApiError> {
        MergeService::load(explicit).map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// Create default configuration.
    pub fn default() -> SyncConfig {
        SyncConfig::default()
    }

    /// Path `config init` writes to when no `--config` is given.
    pub fn default_path() -> Result<PathBuf, ApiError> {
        super::xdg::config_file()
    }

    /// Write a starter config file.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_template(path: &Path, force: bool) -> Result<(), ApiError> {
        if path.exists() && !force {
            return Err(ApiError::ConfigError(format!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, TEMPLATE)?;
        Ok(())
    }
}

const TEMPLATE: &str = r#"[canvas]
api_heading = "https://canvas.instructure.com"
api_key = ""
per_page = 100

[todoist]
api_key = ""

[mirror]
files = true
modules = true

# One table per course, keyed by Canvas course id.
# [courses.12345]
# name = "Intro to Systems"
# save_path = "/home/me/school/systems"

[logging]
enabled = true
level = "info"
"#;
