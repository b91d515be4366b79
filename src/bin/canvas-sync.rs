//! canvas-sync CLI Binary
//!
//! Mirrors Canvas course content locally and syncs assignments to Todoist.

use anyhow::Context;
use canvas_sync::logging::init_logging;
use canvas_sync::tooling::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let context = CliContext::new(cli.config.clone(), &cli.command)
        .context("failed to load configuration")?;

    let logging = cli.logging_config(&context.config().logging);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
