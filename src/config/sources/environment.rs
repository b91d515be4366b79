//! Environment variable source: CANVAS_SYNC_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
///
/// `CANVAS_SYNC__CANVAS__API_KEY` sets `canvas.api_key`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("CANVAS_SYNC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
