//! Defaults seeded into the builder before any source is layered on.

use crate::config::{DEFAULT_CANVAS_API_HEADING, DEFAULT_PER_PAGE, DEFAULT_TODOIST_ENDPOINT};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder with built-in defaults; later sources override keys set here.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("canvas.api_heading", DEFAULT_CANVAS_API_HEADING)?
        .set_default("canvas.per_page", DEFAULT_PER_PAGE as i64)?
        .set_default("todoist.endpoint", DEFAULT_TODOIST_ENDPOINT)?
        .set_default("mirror.files", true)?
        .set_default("mirror.modules", true)
}
