mod cli_commands;
mod mirror_pipeline;
mod support;
mod task_sync;
