//! CLI Tooling
//!
//! Command-line interface for mirroring Canvas courses and syncing assignments to
//! Todoist. Every command is safe to re-run.

use crate::config::{ConfigLoader, SyncConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::notify::LogNotifier;
use crate::pipeline::{CourseTarget, SyncPipeline};
use crate::remote::{HttpLmsClient, LmsApi, TodoistClient};
use crate::tooling::format::{
    format_courses, format_mirror_report, format_status_text, format_task_report, stdout_color,
};
use crate::tooling::status::{scan_mirror, MirrorStatus};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// canvas-sync - Mirror Canvas courses and sync assignments to Todoist
#[derive(Parser)]
#[command(name = "canvas-sync")]
#[command(about = "Mirror Canvas course content locally and sync assignments to Todoist")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold logging flags over the configured logging settings.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync unsubmitted assignments to Todoist tasks
    Tasks {
        /// Print one row per assignment after the short summary
        #[arg(long)]
        detailed: bool,
    },
    /// Mirror course folders and module items to disk
    Files,
    /// Mirror files, then sync tasks
    All {
        /// Print one row per assignment after the short summary
        #[arg(long)]
        detailed: bool,
    },
    /// Show what is mirrored locally
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List Canvas courses visible to the configured token
    Courses,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration with keys redacted
    Show,
}

/// CLI context: effective configuration and where it came from.
pub struct CliContext {
    config: SyncConfig,
    config_path: Option<PathBuf>,
}

impl CliContext {
    /// Create a new CLI context
    ///
    /// `config init` starts from defaults so that it works before any file exists.
    pub fn new(config_path: Option<PathBuf>, command: &Commands) -> Result<Self, ApiError> {
        let config = match command {
            Commands::Config {
                command: ConfigCommands::Init { .. },
            } => ConfigLoader::default(),
            _ => ConfigLoader::load(config_path.as_deref())?,
        };
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Context over an already built configuration.
    pub fn from_config(config: SyncConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn color(&self) -> bool {
        stdout_color(self.config.logging.color)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Tasks { detailed } => self.run_tasks(*detailed),
            Commands::Files => self.run_files(),
            Commands::All { detailed } => {
                let files = self.run_files()?;
                let tasks = self.run_tasks(*detailed)?;
                Ok(format!("{}\n\n{}", files, tasks))
            }
            Commands::Status { format } => self.run_status(format),
            Commands::Courses => {
                let lms = self.lms_client()?;
                let courses = lms.list_courses()?;
                Ok(format_courses(&courses))
            }
            Commands::Config { command } => self.run_config(command),
        }
    }

    fn lms_client(&self) -> Result<HttpLmsClient, ApiError> {
        self.config.validate()?;
        let canvas = &self.config.canvas;
        HttpLmsClient::new(&canvas.api_heading, &canvas.api_key, canvas.per_page)
    }

    fn course_targets(&self) -> Result<Vec<CourseTarget>, ApiError> {
        self.config
            .course_ids()?
            .into_iter()
            .map(|(id, course)| {
                Ok(CourseTarget {
                    id,
                    name: course.name.clone(),
                    root: course.default_save_path()?,
                })
            })
            .collect()
    }

    fn run_files(&self) -> Result<String, ApiError> {
        let lms = self.lms_client()?;
        let courses = self.course_targets()?;
        let notifier = LogNotifier;
        let pipeline = SyncPipeline::new(&lms, &notifier)
            .with_passes(self.config.mirror.files, self.config.mirror.modules);
        let report = pipeline.mirror_courses(&courses);
        Ok(format_mirror_report(&report, self.color()))
    }

    fn run_tasks(&self, detailed: bool) -> Result<String, ApiError> {
        let lms = self.lms_client()?;
        self.config.validate_todoist()?;
        let mut store = TodoistClient::new(&self.config.todoist.endpoint, &self.config.todoist.api_key)?;
        let notifier = LogNotifier;
        let pipeline = SyncPipeline::new(&lms, &notifier);
        let report = pipeline.sync_tasks(&self.config.course_names()?, &mut store, Utc::now())?;
        info!(committed = report.committed, "task sync completed");
        Ok(format_task_report(&report, detailed, self.color()))
    }

    fn run_status(&self, format: &str) -> Result<String, ApiError> {
        let statuses: Vec<MirrorStatus> = self
            .course_targets()?
            .iter()
            .map(|c| scan_mirror(c.id, &c.name, &c.root))
            .collect();
        match format {
            "json" => Ok(serde_json::to_string_pretty(&statuses)?),
            "text" => Ok(format_status_text(&statuses, self.color())),
            other => Err(ApiError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    fn run_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Init { force } => {
                let path = match &self.config_path {
                    Some(path) => path.clone(),
                    None => ConfigLoader::default_path()?,
                };
                ConfigLoader::write_template(&path, *force)?;
                Ok(format!("Wrote config template to {}", path.display()))
            }
            ConfigCommands::Show => toml::to_string_pretty(&self.config.redacted())
                .map_err(|e| ApiError::Serialization(e.to_string())),
        }
    }
}
